//! Session state machine for the single accepted connection.
//!
//! The responder threads a [`SessionState`] by value through its loop:
//! every iteration either stays `Open` or moves to `Closing` with the reason
//! the session ended. There is no way back from `Closing`.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info};

/// Why a session left the `Open` state.
#[derive(Debug)]
pub enum CloseReason {
    /// A frame contained the `exit` marker (or the TCS `exit` command).
    ExitRequested,
    /// The cancellation signal fired.
    Cancelled,
    /// A zero-length read under the `close` empty-read policy.
    PeerClosed,
    /// Unrecoverable read or write fault on the transport.
    Fault(io::Error),
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::ExitRequested => write!(f, "exit requested"),
            CloseReason::Cancelled => write!(f, "cancelled"),
            CloseReason::PeerClosed => write!(f, "peer closed"),
            CloseReason::Fault(e) => write!(f, "transport fault: {e}"),
        }
    }
}

/// Current state of the session.
#[derive(Debug)]
pub enum SessionState {
    /// Keep serving frames.
    Open,
    /// Leave the loop after this iteration.
    Closing(CloseReason),
}

/// The one client connection a responder serves.
#[derive(Debug)]
pub struct Session {
    stream: TcpStream,
    peer: SocketAddr,
    frames_read: u64,
    empty_reads: u64,
    responses_sent: u64,
}

impl Session {
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self {
            stream,
            peer,
            frames_read: 0,
            empty_reads: 0,
            responses_sent: 0,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Read one frame of at most `buf.len()` bytes. Returns the length read;
    /// zero means the peer closed its side.
    pub async fn read_frame(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.stream.read(buf).await?;
        if n == 0 {
            self.empty_reads += 1;
        } else {
            self.frames_read += 1;
        }
        Ok(n)
    }

    /// Write a complete response.
    pub async fn respond(&mut self, response: &[u8]) -> io::Result<()> {
        self.stream.write_all(response).await?;
        self.responses_sent += 1;
        Ok(())
    }

    /// Shut down the transport and release it.
    pub async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!(peer = %self.peer, error = %e, "Shutdown failed");
        }
        info!(
            peer = %self.peer,
            frames = self.frames_read,
            empty_reads = self.empty_reads,
            responses = self.responses_sent,
            "Connection closed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        let state = SessionState::Open;
        assert!(matches!(state, SessionState::Open));

        let state = SessionState::Closing(CloseReason::ExitRequested);
        assert!(matches!(state, SessionState::Closing(CloseReason::ExitRequested)));
    }

    #[test]
    fn test_close_reason_display() {
        assert_eq!(CloseReason::Cancelled.to_string(), "cancelled");
        assert_eq!(CloseReason::PeerClosed.to_string(), "peer closed");

        let fault = CloseReason::Fault(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        assert_eq!(fault.to_string(), "transport fault: reset");
    }

    #[tokio::test]
    async fn test_session_counts_frames() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut client = TcpStream::connect(addr).await.unwrap();
        let (stream, peer) = listener.accept().await.unwrap();
        let mut session = Session::new(stream, peer);
        assert_eq!(session.peer(), peer);

        client.write_all(b"abc").await.unwrap();
        let mut buf = [0u8; 16];
        let n = session.read_frame(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"abc");
        session.respond(b"ok\r\n").await.unwrap();

        let mut reply = [0u8; 4];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(&reply, b"ok\r\n");

        client.shutdown().await.unwrap();
        assert_eq!(session.read_frame(&mut buf).await.unwrap(), 0);

        assert_eq!(session.frames_read, 1);
        assert_eq!(session.empty_reads, 1);
        assert_eq!(session.responses_sent, 1);
        session.close().await;
    }
}
