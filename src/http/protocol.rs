//! Protocol seam between the session loop and the HTTP engine.

use crate::{
    errors::ErrorKind,
    http::{field::StorageGenerator, request::Request, response::Response, router::Router},
    limits::ReqLimits,
};
use std::{io, net::SocketAddr, sync::Arc};
use tracing::debug;

/// Byte-level protocol driven by a session.
///
/// The session alternates between two phases: it feeds every chunk read
/// from the socket to [`handle_request`](Protocol::handle_request) while it
/// returns `true`, then sends whatever
/// [`prepare_response`](Protocol::prepare_response) produces until it
/// returns `0`. The session ends once
/// [`need_to_close_session`](Protocol::need_to_close_session) says so.
pub trait Protocol: Send + 'static {
    /// Called once with the peer address of a new session.
    fn accept_peer(&mut self, _addr: SocketAddr) {}

    /// Consumes `data`; `true` while more input is expected.
    fn handle_request(&mut self, data: &[u8]) -> bool;

    /// Writes the next response bytes into `out`; `Ok(0)` once the response
    /// was handed out whole.
    fn prepare_response(&mut self, out: &mut [u8]) -> io::Result<usize>;

    fn need_to_close_session(&self) -> bool;
}

/// Creates one [`Protocol`] per accepted connection.
pub trait ProtocolFactory: Send + Sync + 'static {
    type Protocol: Protocol;

    fn init_protocol(&self, limits: &ReqLimits) -> Self::Protocol;
}

/// Factory of [`ProtocolHttp`] sessions sharing one [`Router`].
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use webapp_http::{HttpFactory, Router};
///
/// let mut router = Router::new();
/// router
///     .add_handler_for("/", |_, _, resp| {
///         resp.set_body("Hello World!");
///         true
///     })
///     .unwrap();
///
/// let factory = HttpFactory::new(Arc::new(router));
/// ```
#[derive(Clone)]
pub struct HttpFactory {
    router: Arc<Router>,
    storage_generator: Option<StorageGenerator>,
}

impl HttpFactory {
    #[inline]
    pub fn new(router: Arc<Router>) -> Self {
        Self {
            router,
            storage_generator: None,
        }
    }

    /// Storage generator installed into every request.
    #[inline]
    pub fn storage_generator(mut self, generator: StorageGenerator) -> Self {
        self.storage_generator = Some(generator);
        self
    }
}

impl ProtocolFactory for HttpFactory {
    type Protocol = ProtocolHttp;

    fn init_protocol(&self, limits: &ReqLimits) -> ProtocolHttp {
        let mut protocol = ProtocolHttp::new(Arc::clone(&self.router), limits);
        if let Some(generator) = &self.storage_generator {
            protocol.request.use_storage_generator(Arc::clone(generator));
        }
        protocol
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingHeader,
    AwaitingBody,
    /// The request was parsed whole or rejected.
    Complete,
    /// The response is filled and waits to be sent.
    Dispatched,
    RespondingHeader,
    RespondingBody,
    Closed,
}

/// HTTP/1.1 over one connection: one request, one response, then close.
///
/// ```text
///  AwaitingHeader -> AwaitingBody -> Complete -> Dispatched
///                                                    |
///  Closed <- RespondingBody <- RespondingHeader <----/
/// ```
///
/// A request that fails to parse skips the router and is answered with the
/// status of its [`ErrorKind`].
pub struct ProtocolHttp {
    router: Arc<Router>,
    request: Request,
    response: Response,
    state: State,
    close: bool,
}

impl ProtocolHttp {
    pub fn new(router: Arc<Router>, limits: &ReqLimits) -> Self {
        Self {
            router,
            request: Request::new(limits),
            response: Response::default(),
            state: State::AwaitingHeader,
            close: false,
        }
    }

    fn dispatch(&mut self) {
        self.state = State::Dispatched;

        if !self.router.call_handler_for(&self.request, &mut self.response) {
            debug!(uri = %self.request.uri(), "no handler");
            self.response.reset_state();
        }
    }

    fn reject(&mut self, err: ErrorKind) {
        let status = err.status_code();
        debug!(%err, status = status.as_u16(), "request rejected");

        self.response.reset_state();
        self.response.set_body(status.reason()).set_status(status);
        self.close = true;
        self.state = State::Dispatched;
    }

    fn finish(&mut self) {
        self.request.reset_state();
        self.response.reset_state();
        self.state = State::Closed;
        self.close = true;
    }
}

impl Protocol for ProtocolHttp {
    fn accept_peer(&mut self, addr: SocketAddr) {
        self.request.client_addr = addr;
    }

    fn handle_request(&mut self, data: &[u8]) -> bool {
        if !matches!(self.state, State::AwaitingHeader | State::AwaitingBody) {
            return false;
        }

        if let Err(err) = self.request.parse(data) {
            self.state = State::Complete;
            self.reject(err);
            return false;
        }

        if self.request.completed() {
            self.state = State::Complete;
            self.dispatch();
            return false;
        }

        self.state = match self.request.header().complete {
            true => State::AwaitingBody,
            false => State::AwaitingHeader,
        };
        true
    }

    fn prepare_response(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if self.state == State::Dispatched {
            self.state = State::RespondingHeader;
        }

        if self.state == State::RespondingHeader {
            match self.response.read_header(out) {
                0 => self.state = State::RespondingBody,
                count => return Ok(count),
            }
        }

        if self.state == State::RespondingBody {
            match self.response.read_body(out)? {
                0 => {}
                count => return Ok(count),
            }
        }

        self.finish();
        Ok(0)
    }

    #[inline]
    fn need_to_close_session(&self) -> bool {
        self.close
    }
}
