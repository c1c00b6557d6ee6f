//! webapp_http - Single-threaded HTTP/1.1 server engine
//!
//! Requests are parsed incrementally as chunks arrive, so a session never
//! needs the whole request in memory: header lines are bounded by
//! [`ReqLimits`](limits::ReqLimits) and multipart uploads are streamed into
//! the [`Storage`] chosen for every field.
//!
//! # Architecture
//!
//! - [`Server`] accepts connections and runs one session task per connection
//! - Each session drives a [`Protocol`], [`ProtocolHttp`] for HTTP/1.1
//! - [`ProtocolHttp`] parses the [`Request`], asks the [`Router`] for a
//!   handler and streams the [`Response`] back
//! - Response bodies come from a [`ResponseSource`]: memory or a file
//!
//! One request is served per connection, the session is closed after the
//! response.
//!
//! # Examples
//!
//! Quick start:
//! ```no_run
//! use std::sync::Arc;
//! use webapp_http::{Address, HttpFactory, Router, Server};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut router = Router::new();
//!     router
//!         .add_handler_for("/hello", |rest, req, resp| {
//!             resp.set_body(format!("Hello, {}! ({})", req.get("name"), rest.join("/")));
//!             true
//!         })
//!         .unwrap();
//!     router.add_directory_for("/static", "./public").unwrap();
//!
//!     let mut server = Server::builder()
//!         .protocol(HttpFactory::new(Arc::new(router)))
//!         .build();
//!
//!     server.bind_to(Address::LOOPBACK, 8080).await.unwrap();
//!     server.launch().await;
//! }
//! ```
//! Reading an upload:
//! ```
//! use webapp_http::{Request, Response, StatusCode};
//!
//! fn upload(_: &[String], req: &Request, resp: &mut Response) -> bool {
//!     match req.post("file") {
//!         Some(file) => {
//!             resp.set_body(format!("{}: {} bytes", file.filename(), file.size()));
//!         }
//!         None => {
//!             resp.set_body("no file").set_status(StatusCode::BadRequest);
//!         }
//!     }
//!     true
//! }
//! ```

pub(crate) mod http {
    pub(crate) mod field;
    pub(crate) mod grammar;
    pub(crate) mod header;
    pub(crate) mod multipart;
    pub mod percent;
    pub(crate) mod protocol;
    pub mod query;
    pub(crate) mod request;
    pub(crate) mod response;
    pub(crate) mod router;
    pub(crate) mod source;
    pub(crate) mod types;
    pub(crate) mod uri;
}
pub(crate) mod server {
    pub(crate) mod inspector;
    pub(crate) mod server_impl;
    pub(crate) mod session;
}
pub(crate) mod errors;
pub mod limits;

pub use crate::{
    errors::{ErrorKind, IoError},
    http::{
        field::{Field, InMemoryStorage, Storage, StorageGenerator},
        header::{Accept, Content, Disposition, Header, StartLine},
        percent,
        protocol::{HttpFactory, Protocol, ProtocolFactory, ProtocolHttp},
        query,
        request::Request,
        response::{
            write::{BodyWriter, WriteBuffer},
            Response,
        },
        router::{Handler, Router},
        source::{ArraySource, BufferSource, FileSource, ResponseSource},
        types::{CacheControl, ContentType, ETag, Expires, Method, MimeType, StatusCode, Version},
        uri::{Authority, Uri},
    },
    server::{
        inspector::{Inspector, TracingInspector},
        server_impl::{Address, Port, Server, ServerBuilder, UNDEFINED_PORT},
    },
};
