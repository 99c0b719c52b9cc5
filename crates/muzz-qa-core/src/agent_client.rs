//! Framed request/response transport to the on-device agent.
//!
//! One [`AgentClient`] owns one stream. Every exchange writes a single
//! request frame and reads back a single response frame (see
//! [`crate::protocol`] for the layout). When an exchange breaks off part way
//! (I/O error, missed deadline, oversized frame) the stream position is no
//! longer known, so the client drops it and every later call fails with
//! [`AgentClientError::NotConnected`].
//!
//! ```no_run
//! use muzz_qa_core::agent_client::{AgentClient, DEFAULT_READ_TIMEOUT};
//! use muzz_qa_core::protocol::Request;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = AgentClient::connect("127.0.0.1:9800".parse()?).await?;
//! client.heartbeat().await?;
//! let tree = client.request(&Request::DumpTree, DEFAULT_READ_TIMEOUT).await?;
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, debug_span, trace, Instrument};

use crate::protocol::{
    checked_frame_length, decode_response, encode_request, ProtocolError, Request, Response,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Read deadline for requests the agent answers straight away.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Any byte stream the agent can be reached over.
pub trait AgentStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> AgentStream for T {}

#[derive(Error, Debug)]
pub enum AgentClientError {
    #[error("not connected to agent")]
    NotConnected,

    #[error("cannot connect to agent at {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The agent answered with an error frame.
    #[error("agent rejected {opcode}: {message}")]
    Rejected {
        opcode: &'static str,
        message: String,
    },

    #[error("no reply from agent within {0:?}")]
    Timeout(Duration),
}

impl AgentClientError {
    /// Whether the stream is out of step after this error.
    fn breaks_stream(&self) -> bool {
        matches!(
            self,
            AgentClientError::Io(_)
                | AgentClientError::Timeout(_)
                | AgentClientError::Protocol(ProtocolError::FrameTooLarge(_))
        )
    }
}

pub struct AgentClient {
    stream: Option<Box<dyn AgentStream>>,
}

impl AgentClient {
    /// Dials the agent over TCP.
    pub async fn connect(addr: SocketAddr) -> Result<Self, AgentClientError> {
        debug!(%addr, "connecting to agent");
        let stream = match timeout(CONNECT_TIMEOUT, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(AgentClientError::Connect { addr, source }),
            Err(_) => return Err(AgentClientError::Timeout(CONNECT_TIMEOUT)),
        };
        stream.set_nodelay(true)?;
        Ok(Self::over(stream))
    }

    /// Wraps an already-open stream.
    pub fn over(stream: impl AgentStream + 'static) -> Self {
        Self {
            stream: Some(Box::new(stream)),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Round-trips a heartbeat; anything but [`Response::Ok`] is an error.
    pub async fn heartbeat(&mut self) -> Result<(), AgentClientError> {
        match self.request(&Request::Heartbeat, DEFAULT_READ_TIMEOUT).await? {
            Response::Ok => Ok(()),
            other => Err(ProtocolError::InvalidPayload(format!(
                "heartbeat answered with {other:?}"
            ))
            .into()),
        }
    }

    /// Sends `request` and waits up to `read_timeout` for the reply.
    ///
    /// Error frames from the agent come back as
    /// [`AgentClientError::Rejected`].
    pub async fn request(
        &mut self,
        request: &Request,
        read_timeout: Duration,
    ) -> Result<Response, AgentClientError> {
        let opcode = request.opcode_name();
        let outcome = self
            .exchange(request, read_timeout)
            .instrument(debug_span!("agent_request", opcode))
            .await;

        match outcome {
            Ok(Response::Error { message }) => Err(AgentClientError::Rejected { opcode, message }),
            Ok(response) => Ok(response),
            Err(e) => {
                if e.breaks_stream() {
                    debug!(error = %e, "dropping agent stream");
                    self.stream = None;
                }
                Err(e)
            }
        }
    }

    async fn exchange(
        &mut self,
        request: &Request,
        read_timeout: Duration,
    ) -> Result<Response, AgentClientError> {
        let stream = self.stream.as_mut().ok_or(AgentClientError::NotConnected)?;

        let frame = encode_request(request);
        trace!(frame_bytes = frame.len(), "writing request");
        stream.write_all(&frame).await?;
        stream.flush().await?;

        let payload = timeout(read_timeout, read_payload(stream))
            .await
            .map_err(|_| AgentClientError::Timeout(read_timeout))??;
        Ok(decode_response(&payload)?)
    }
}

async fn read_payload<S>(stream: &mut S) -> Result<Vec<u8>, AgentClientError>
where
    S: AsyncRead + Unpin + ?Sized,
{
    let mut header = [0u8; 4];
    stream.read_exact(&mut header).await?;
    let len = checked_frame_length(&header)?;
    trace!(payload_bytes = len, "reading response");

    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).await?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Selector;
    use crate::protocol::{decode_request, encode_response, read_frame_length, MAX_FRAME_LEN};
    use tokio::io::DuplexStream;

    /// Reads one request frame off the agent side of a duplex pipe.
    async fn next_request(agent: &mut DuplexStream) -> Request {
        let mut header = [0u8; 4];
        agent.read_exact(&mut header).await.unwrap();
        let mut payload = vec![0u8; read_frame_length(&header) as usize];
        agent.read_exact(&mut payload).await.unwrap();
        decode_request(&payload).unwrap()
    }

    /// A client whose agent answers each request with the next reply.
    fn scripted(replies: Vec<Response>) -> AgentClient {
        let (client, mut agent) = tokio::io::duplex(4096);
        tokio::spawn(async move {
            for reply in replies {
                next_request(&mut agent).await;
                agent.write_all(&encode_response(&reply)).await.unwrap();
            }
        });
        AgentClient::over(client)
    }

    #[tokio::test]
    async fn request_returns_agent_reply() {
        let mut client = scripted(vec![Response::Tree { json: "[]".into() }]);
        let reply = client
            .request(&Request::DumpTree, DEFAULT_READ_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(reply, Response::Tree { json: "[]".into() });
        assert!(client.is_connected());
    }

    #[tokio::test]
    async fn rejection_names_the_request_and_keeps_the_stream() {
        let mut client = scripted(vec![
            Response::Error {
                message: "no node with tag 'button_like'".into(),
            },
            Response::Ok,
        ]);

        let click = Request::Click {
            selector: Selector::tag("button_like"),
        };
        match client.request(&click, DEFAULT_READ_TIMEOUT).await {
            Err(AgentClientError::Rejected { opcode, message }) => {
                assert_eq!(opcode, "click");
                assert!(message.contains("button_like"));
            }
            other => panic!("expected rejection, got: {other:?}"),
        }

        assert!(client.is_connected());
        client.heartbeat().await.unwrap();
    }

    #[tokio::test]
    async fn heartbeat_requires_ok() {
        let mut client = scripted(vec![Response::Element { json: None }]);
        let err = client.heartbeat().await.unwrap_err();
        assert!(matches!(
            err,
            AgentClientError::Protocol(ProtocolError::InvalidPayload(_))
        ));
    }

    #[tokio::test]
    async fn missed_deadline_drops_the_stream() {
        let (client, _agent) = tokio::io::duplex(1024);
        let mut client = AgentClient::over(client);

        let err = client
            .request(&Request::DumpTree, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentClientError::Timeout(d) if d == Duration::from_millis(50)));
        assert!(!client.is_connected());

        let err = client.heartbeat().await.unwrap_err();
        assert!(matches!(err, AgentClientError::NotConnected));
    }

    #[tokio::test]
    async fn oversized_frame_is_refused_before_reading_it() {
        let (client, mut agent) = tokio::io::duplex(1024);
        tokio::spawn(async move {
            next_request(&mut agent).await;
            // Header only; the announced payload never follows.
            agent
                .write_all(&(MAX_FRAME_LEN + 1).to_le_bytes())
                .await
                .unwrap();
            std::future::pending::<()>().await;
        });
        let mut client = AgentClient::over(client);

        let err = client
            .request(&Request::DumpTree, DEFAULT_READ_TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AgentClientError::Protocol(ProtocolError::FrameTooLarge(len)) if len == MAX_FRAME_LEN + 1
        ));
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn connect_refused_names_the_address() {
        // Port 1 on loopback is reserved and refuses connections.
        let addr: SocketAddr = "127.0.0.1:1".parse().unwrap();
        match AgentClient::connect(addr).await {
            Err(e @ AgentClientError::Connect { .. }) => {
                assert!(e.to_string().contains("127.0.0.1:1"))
            }
            Err(other) => panic!("expected connect error, got: {other:?}"),
            Ok(_) => panic!("connected to a closed port"),
        }
    }
}
