use crate::{
    errors::ErrorKind,
    http::protocol::{Protocol, ProtocolFactory},
    limits::{ConnLimits, ReqLimits, ServerLimits},
    server::{
        inspector::{Inspector, TracingInspector},
        session::Session,
    },
};
use socket2::{Domain, Socket, Type};
use std::{
    io,
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
};
use tokio::{
    net::{TcpListener, TcpStream},
    task::{JoinError, JoinSet},
};
use tracing::debug;

/// IPv4 address in host byte order.
///
/// # Examples
/// ```
/// use std::net::Ipv4Addr;
/// use webapp_http::Address;
///
/// assert_eq!(Ipv4Addr::from(Address::LOOPBACK), Ipv4Addr::LOCALHOST);
/// assert_eq!(Address::from(Ipv4Addr::new(10, 0, 0, 1)), Address(0x0A00_0001));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub u32);

impl Address {
    /// Refused by [`Server::bind_to`].
    pub const UNDEFINED: Address = Address(u32::MAX);
    pub const LOOPBACK: Address = Address(0x7F00_0001);
    pub const ALL_IPV4: Address = Address(0);
}

impl From<Ipv4Addr> for Address {
    #[inline]
    fn from(addr: Ipv4Addr) -> Self {
        Address(u32::from(addr))
    }
}

impl From<Address> for Ipv4Addr {
    #[inline]
    fn from(addr: Address) -> Self {
        Ipv4Addr::from(addr.0)
    }
}

pub type Port = u16;

/// Refused by [`Server::bind_to`].
pub const UNDEFINED_PORT: Port = 0;

/// Accept loop multiplexing sessions on the current task.
///
/// Every accepted connection becomes a session task driving one
/// [`Protocol`] created by the factory. Sessions never run in parallel with
/// each other when the server lives on a `current_thread` runtime.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use webapp_http::{Address, HttpFactory, Router, Server};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let mut router = Router::new();
///     router
///         .add_handler_for("/", |_, _, resp| {
///             resp.set_body("Hello world!");
///             true
///         })
///         .unwrap();
///
///     let mut server = Server::builder()
///         .protocol(HttpFactory::new(Arc::new(router)))
///         .build();
///
///     server.bind_to(Address::LOOPBACK, 8080).await.unwrap();
///     server.launch().await;
/// }
/// ```
pub struct Server<F: ProtocolFactory> {
    listener: Option<TcpListener>,
    factory: F,
    inspector: Arc<dyn Inspector>,
    sessions: JoinSet<()>,

    server_limits: ServerLimits,
    conn_limits: ConnLimits,
    req_limits: ReqLimits,
}

enum Event {
    Accepted(io::Result<(TcpStream, SocketAddr)>),
    Finished(Result<(), JoinError>),
}

impl<F: ProtocolFactory> Server<F> {
    /// Creates a new builder for configuring the server instance.
    #[inline]
    pub fn builder() -> ServerBuilder<F> {
        ServerBuilder {
            listener: None,
            factory: None,
            inspector: None,

            server_limits: None,
            request_limits: None,
            connection_limits: None,
        }
    }

    /// Listens on `address:port`, replacing the current listener.
    ///
    /// Fails with [`ErrorKind::UndefinedAddress`] for
    /// [`Address::UNDEFINED`] or [`UNDEFINED_PORT`], leaving the server as
    /// it was.
    pub async fn bind_to(&mut self, address: Address, port: Port) -> Result<(), ErrorKind> {
        if address == Address::UNDEFINED || port == UNDEFINED_PORT {
            return Err(ErrorKind::UndefinedAddress);
        }

        let addr = SocketAddr::from((Ipv4Addr::from(address), port));
        let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(socket2::Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        socket.set_nonblocking(true)?;
        socket.bind(&addr.into())?;
        socket.listen(1024)?;

        self.listener = Some(TcpListener::from_std(socket.into())?);
        self.inspector.register_message(&format!("listening on {addr}"));
        Ok(())
    }

    /// Stops accepting connections. Running sessions are not affected.
    pub fn unbind(&mut self) {
        if self.listener.take().is_some() {
            self.inspector.register_message("listener closed");
        }
    }

    #[inline]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref()?.local_addr().ok()
    }

    /// Number of sessions not reaped yet.
    #[inline]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Waits for one event: a new connection or a finished session.
    ///
    /// Finished sessions are reaped before returning. Fails with
    /// [`ErrorKind::NotBound`] when there is no listener.
    pub async fn run_once(&mut self) -> Result<(), ErrorKind> {
        let Some(listener) = self.listener.as_ref() else {
            return Err(ErrorKind::NotBound);
        };

        let event = tokio::select! {
            accepted = listener.accept() => Event::Accepted(accepted),
            Some(joined) = self.sessions.join_next(), if !self.sessions.is_empty() => {
                Event::Finished(joined)
            }
        };

        match event {
            Event::Accepted(Ok((stream, addr))) => self.start_session(stream, addr),
            Event::Accepted(Err(err)) => self.inspector.register_error("accept failed", &err),
            Event::Finished(joined) => self.reap(joined),
        }

        while let Some(joined) = self.sessions.try_join_next() {
            self.reap(joined);
        }
        Ok(())
    }

    /// Runs the accept loop. Returns at once when there is no listener.
    pub async fn launch(mut self) {
        while self.run_once().await.is_ok() {}

        while let Some(joined) = self.sessions.join_next().await {
            self.reap(joined);
        }
    }

    fn start_session(&mut self, stream: TcpStream, addr: SocketAddr) {
        debug!(peer = %addr, "session opened");

        if let Err(err) = stream.set_nodelay(true) {
            self.inspector.register_error("set_nodelay failed", &err);
        }

        let mut protocol = self.factory.init_protocol(&self.req_limits);
        protocol.accept_peer(addr);

        let session = Session::new(
            stream,
            protocol,
            &self.server_limits,
            &self.conn_limits,
            Arc::clone(&self.inspector),
        );
        self.sessions.spawn(session.run());
    }

    fn reap(&self, joined: Result<(), JoinError>) {
        if let Err(err) = joined {
            self.inspector
                .register_error("session task failed", &io::Error::other(err.to_string()));
        }
    }
}

/// Builder for configuring and creating [`Server`] instances.
pub struct ServerBuilder<F: ProtocolFactory> {
    listener: Option<TcpListener>,
    factory: Option<F>,
    inspector: Option<Arc<dyn Inspector>>,

    server_limits: Option<ServerLimits>,
    request_limits: Option<ReqLimits>,
    connection_limits: Option<ConnLimits>,
}

impl<F: ProtocolFactory> ServerBuilder<F> {
    /// Sets the factory creating the protocol of every session.
    ///
    /// **This is a required component.**
    #[inline(always)]
    pub fn protocol(mut self, factory: F) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Uses an already bound listener instead of [`Server::bind_to`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// use std::sync::Arc;
    /// use tokio::net::TcpListener;
    /// use webapp_http::{HttpFactory, Router, Server};
    ///
    /// let server = Server::builder()
    ///     .protocol(HttpFactory::new(Arc::new(Router::new())))
    ///     .listener(TcpListener::bind("127.0.0.1:8080").await.unwrap())
    ///     .build();
    /// # }
    /// ```
    #[inline(always)]
    pub fn listener(mut self, listener: TcpListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Replaces the default [`TracingInspector`].
    #[inline(always)]
    pub fn inspector<I: Inspector>(mut self, inspector: I) -> Self {
        self.inspector = Some(Arc::new(inspector));
        self
    }

    #[inline(always)]
    pub fn server_limits(mut self, limits: ServerLimits) -> Self {
        self.server_limits = Some(limits);
        self
    }

    #[inline(always)]
    pub fn connection_limits(mut self, limits: ConnLimits) -> Self {
        self.connection_limits = Some(limits);
        self
    }

    #[inline(always)]
    pub fn request_limits(mut self, limits: ReqLimits) -> Self {
        self.request_limits = Some(limits);
        self
    }

    /// Finalizes the builder and constructs a [`Server`] instance.
    ///
    /// # Panics
    ///
    /// When the `protocol` method was not called, with the message
    /// ``The `protocol` method must be called to create``.
    #[inline]
    #[track_caller]
    pub fn build(self) -> Server<F> {
        Server {
            listener: self.listener,
            factory: self
                .factory
                .expect("The `protocol` method must be called to create"),
            inspector: self.inspector.unwrap_or_else(|| Arc::new(TracingInspector)),
            sessions: JoinSet::new(),

            server_limits: self.server_limits.unwrap_or_default(),
            conn_limits: self.connection_limits.unwrap_or_default(),
            req_limits: self.request_limits.unwrap_or_default(),
        }
    }
}
