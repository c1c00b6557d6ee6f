use crate::{
    http::protocol::Protocol,
    limits::{ConnLimits, ServerLimits},
    server::inspector::Inspector,
};
use std::{future::Future, io, sync::Arc, time::Duration};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
    time::timeout,
};
use tracing::debug;

/// One accepted connection: its socket, buffer and protocol.
///
/// Reads until the protocol has a whole request, then writes the response
/// the protocol prepares batch by batch through the same buffer. A batch is
/// sent with as many writes as the socket needs before the next one is
/// prepared.
pub(crate) struct Session<P: Protocol, S = TcpStream> {
    stream: S,
    protocol: P,
    buffer: Box<[u8]>,
    need_to_send: usize,
    was_sent: usize,

    conn_limits: ConnLimits,
    inspector: Arc<dyn Inspector>,
}

impl<P, S> Session<P, S>
where
    P: Protocol,
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub(crate) fn new(
        stream: S,
        protocol: P,
        server_limits: &ServerLimits,
        conn_limits: &ConnLimits,
        inspector: Arc<dyn Inspector>,
    ) -> Self {
        Self {
            stream,
            protocol,
            buffer: vec![0; server_limits.session_buffer_size.max(1)].into_boxed_slice(),
            need_to_send: 0,
            was_sent: 0,

            conn_limits: conn_limits.clone(),
            inspector,
        }
    }

    /// Serves the connection until the protocol or the peer ends it.
    pub(crate) async fn run(mut self) {
        if let Err(err) = self.serve().await {
            self.inspector.register_error("session aborted", &err);
        }

        if let Err(err) = self.stream.shutdown().await {
            debug!(error = %err, "shutdown failed");
        }
    }

    async fn serve(&mut self) -> io::Result<()> {
        loop {
            if !self.receive().await? {
                debug!("peer closed the connection");
                return Ok(());
            }

            self.send().await?;

            if self.protocol.need_to_close_session() {
                return Ok(());
            }
        }
    }

    // `false` when the peer closed before the request was complete.
    async fn receive(&mut self) -> io::Result<bool> {
        loop {
            let read = with_timeout(
                self.conn_limits.socket_read_timeout,
                self.stream.read(&mut self.buffer),
            )
            .await?;

            if read == 0 {
                return Ok(false);
            }

            if !self.protocol.handle_request(&self.buffer[..read]) {
                return Ok(true);
            }
        }
    }

    async fn send(&mut self) -> io::Result<()> {
        loop {
            self.need_to_send = self.protocol.prepare_response(&mut self.buffer)?;
            self.was_sent = 0;

            if self.need_to_send == 0 {
                return self.stream.flush().await;
            }

            while self.was_sent < self.need_to_send {
                let sent = with_timeout(
                    self.conn_limits.socket_write_timeout,
                    self.stream.write(&self.buffer[self.was_sent..self.need_to_send]),
                )
                .await?;

                if sent == 0 {
                    return Err(io::ErrorKind::WriteZero.into());
                }
                self.was_sent += sent;
            }
        }
    }
}

#[inline]
async fn with_timeout<T, F>(limit: Option<Duration>, future: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match limit {
        Some(limit) => timeout(limit, future)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "socket timed out"))?,
        None => future.await,
    }
}
