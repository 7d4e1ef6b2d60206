//! Single-connection TCP responder.
//!
//! Binds a listener with a backlog of one, accepts exactly one client,
//! serves it until the session closes, then releases everything. A new
//! client needs a new process.
//!
//! Every `.await` is a suspension point of one task; the cancellation
//! future is raced against accept and against each read/respond step.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, info, trace, warn};

use crate::config::{Config, EmptyReadPolicy};
use crate::error::ServerError;
use crate::protocols::Handler;
use crate::session::{CloseReason, Session, SessionState};

/// Pending-connection queue length.
const LISTEN_BACKLOG: i32 = 1;

/// Responder instance
pub struct Responder {
    config: Config,
    listener: TcpListener,
}

impl Responder {
    /// Bind the listener. Must be called from within a Tokio runtime.
    pub fn bind(config: Config) -> Result<Self, ServerError> {
        let addr = config.listen;
        let listener = create_listener(addr)
            .and_then(TcpListener::from_std)
            .map_err(|source| ServerError::Bind { addr, source })?;

        info!(address = %addr, "Server listening");
        Ok(Responder { config, listener })
    }

    /// Bind, serve one client, and shut down.
    pub async fn start<F>(config: Config, shutdown: F) -> Result<CloseReason, ServerError>
    where
        F: Future<Output = ()>,
    {
        Self::bind(config)?.run(shutdown).await
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept one connection and serve it until it closes or `shutdown`
    /// completes.
    pub async fn run<F>(self, shutdown: F) -> Result<CloseReason, ServerError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let accepted = tokio::select! {
            accepted = self.listener.accept() => Some(accepted),
            _ = &mut shutdown => None,
        };

        let mut session = match accepted {
            Some(Ok((stream, peer))) => {
                info!(peer = %peer, "Connected");
                Session::new(stream, peer)
            }
            Some(Err(e)) => {
                warn!(error = %e, "Failed to accept connection");
                self.stop(None).await;
                return Err(ServerError::Accept(e));
            }
            None => {
                info!("Shutdown signal received while waiting for a client");
                self.stop(None).await;
                return Ok(CloseReason::Cancelled);
            }
        };

        let reason = self.serve(&mut session, &mut shutdown).await;
        match &reason {
            CloseReason::Fault(e) => warn!(peer = %session.peer(), error = %e, "Connection error"),
            reason => info!(peer = %session.peer(), %reason, "Session ending"),
        }

        self.stop(Some(session)).await;
        Ok(reason)
    }

    /// Service loop: read, classify, respond, until the state leaves `Open`.
    async fn serve<S>(&self, session: &mut Session, shutdown: &mut S) -> CloseReason
    where
        S: Future<Output = ()> + Unpin,
    {
        let mut buf = vec![0u8; self.config.buffer_size];
        let mut handler = Handler::new(&self.config);
        let mut state = SessionState::Open;

        loop {
            state = match state {
                SessionState::Open => tokio::select! {
                    next = self.step(session, &mut handler, &mut buf) => next,
                    _ = &mut *shutdown => SessionState::Closing(CloseReason::Cancelled),
                },
                SessionState::Closing(reason) => return reason,
            };
        }
    }

    /// One iteration: a single read and at most one write.
    async fn step(&self, session: &mut Session, handler: &mut Handler, buf: &mut [u8]) -> SessionState {
        let n = match session.read_frame(buf).await {
            Ok(n) => n,
            Err(e) => return SessionState::Closing(CloseReason::Fault(e)),
        };

        if n == 0 {
            return match self.config.empty_read {
                EmptyReadPolicy::Close => {
                    debug!(peer = %session.peer(), "Connection closed by client");
                    SessionState::Closing(CloseReason::PeerClosed)
                }
                EmptyReadPolicy::Retry => {
                    trace!("Empty read, retrying");
                    SessionState::Open
                }
            };
        }

        let frame = &buf[..n];
        debug!(bytes = n, frame = ?String::from_utf8_lossy(frame), "Received frame");

        let reply = handler.process(frame);

        if let Some(delay) = reply.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(response) = reply.response {
            trace!(bytes = response.len(), "Sending response");
            if let Err(e) = session.respond(&response).await {
                return SessionState::Closing(CloseReason::Fault(e));
            }
        }

        if reply.close {
            info!("Exit command received");
            SessionState::Closing(CloseReason::ExitRequested)
        } else {
            SessionState::Open
        }
    }

    /// Close the session transport (if any) and release the listener.
    async fn stop(self, session: Option<Session>) {
        if let Some(session) = session {
            session.close().await;
        }
        drop(self.listener);
        info!("Server shutting down");
    }
}

/// Create a non-blocking TCP listener with an explicit backlog.
fn create_listener(addr: SocketAddr) -> io::Result<std::net::TcpListener> {
    let socket = socket2::Socket::new(
        match addr {
            SocketAddr::V4(_) => socket2::Domain::IPV4,
            SocketAddr::V6(_) => socket2::Domain::IPV6,
        },
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;

    Ok(socket.into())
}
