//! Server configuration limits and timeouts
//!
//! # Memory Consumption
//!
//! Each live session holds:
//!
//! `Total` = [`Session buffer`](crate::limits::ServerLimits::session_buffer_size) +
//!           [`Header line`](crate::limits::ReqLimits::header_line_size) +
//!           `Parsed request` + `Runtime Overhead`
//!
//! A body kept in memory adds at most
//! [`body_size`](crate::limits::ReqLimits::body_size).
//!
//! Field values of multipart uploads are stored by the
//! [storage](crate::Storage) chosen for them and are not bounded here.
//!
//! # Examples
//!
//! ```no_run
//! use std::{sync::Arc, time::Duration};
//! use webapp_http::{
//!     limits::{ConnLimits, ReqLimits, ServerLimits},
//!     Address, HttpFactory, Router, Server,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut server = Server::builder()
//!         .protocol(HttpFactory::new(Arc::new(Router::new())))
//!         .server_limits(ServerLimits {
//!             session_buffer_size: 4096,
//!             ..ServerLimits::default()
//!         })
//!         .connection_limits(ConnLimits {
//!             socket_read_timeout: Some(Duration::from_secs(5)),
//!             ..ConnLimits::default()
//!         })
//!         .request_limits(ReqLimits {
//!             header_line_size: 1024,
//!             ..ReqLimits::default()
//!         })
//!         .build();
//!
//!     server.bind_to(Address::LOOPBACK, 8080).await.unwrap();
//!     server.launch().await;
//! }
//! ```

use std::time::Duration;

/// Server-level settings.
///
/// # Session loop
/// ```text
///                    [--------------]
///                    [ Tcp accept   ]
///                    [--------------]
///                           ||
///                           \/
///  [------------]    /--------------\    No    [---------------]
///  [ Read chunk ] => | More input?  | =======> [ Send response ]
///  [------------]    \--------------/          [---------------]
///        /\                 || Yes                    ||
///        \\=================//                        \/
///                                              [---------------]
///                                              [ Close session ]
///                                              [---------------]
/// ```
#[derive(Debug, Clone)]
pub struct ServerLimits {
    /// Size of the buffer each session reads into and writes from (default: `1514 B`)
    ///
    /// The default matches one Ethernet frame. The same buffer is used for both
    /// directions since a session never reads and writes at the same time.
    pub session_buffer_size: usize,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for ServerLimits {
    fn default() -> Self {
        Self {
            session_buffer_size: 1514,

            _priv: (),
        }
    }
}

/// Session-level timeouts
///
/// `None` disables the timeout, a session then waits on its socket for as
/// long as the peer keeps the connection open.
#[derive(Debug, Clone)]
pub struct ConnLimits {
    /// Maximum duration to wait for the next chunk of the request (default: `30 seconds`)
    ///
    /// If no data is received within this time, the session is closed.
    pub socket_read_timeout: Option<Duration>,

    /// Maximum duration to wait for a single write to the socket (default: `30 seconds`)
    pub socket_write_timeout: Option<Duration>,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for ConnLimits {
    #[inline(always)]
    fn default() -> Self {
        Self {
            socket_read_timeout: Some(Duration::from_secs(30)),
            socket_write_timeout: Some(Duration::from_secs(30)),

            _priv: (),
        }
    }
}

/// Request parsing limits
#[derive(Debug, Clone)]
pub struct ReqLimits {
    /// Maximum length of one header line without its `CRLF` (default: `512 B`)
    ///
    /// Applies to the start line, header fields and the headers of every
    /// multipart part. A longer line rejects the request with
    /// `400 Bad Request`.
    pub header_line_size: usize,

    /// Maximum `Content-Length` of a request (default: `8 MiB`)
    ///
    /// Checked before any body byte is stored, a larger body rejects the
    /// request with `400 Bad Request`. Multipart uploads count as a whole.
    pub body_size: usize,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for ReqLimits {
    fn default() -> Self {
        Self {
            header_line_size: 512,
            body_size: 8 * 1024 * 1024,

            _priv: (),
        }
    }
}
