//! [`AutomationDriver`] implementation backed by an on-device agent connection.
//!
//! This module provides [`AgentDriver`], which implements the
//! [`AutomationDriver`] trait by talking to the instrumentation agent running
//! next to the app under test, using the binary protocol defined in
//! [`crate::protocol`]. The agent's port is expected to be reachable over
//! TCP (typically forwarded from the device to localhost).
//!
//! # Example
//!
//! ```no_run
//! use muzz_qa_core::agent_driver::AgentDriver;
//! use muzz_qa_core::driver::AutomationDriver;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut driver = AgentDriver::direct("localhost", 9800);
//! driver.connect().await?;
//! let tree = driver.dump_tree().await?;
//! println!("{} root nodes", tree.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use tracing::{debug, instrument};

use crate::agent_client::{AgentClient, AgentClientError, DEFAULT_READ_TIMEOUT};
use crate::driver::{AutomationDriver, DriverError, Selector};
use crate::element::UIElement;
use crate::protocol::{Request, Response};

/// Extra read slack on top of an idle wait, so the agent times out first.
const IDLE_READ_SLACK: Duration = Duration::from_secs(5);

/// Maps an [`AgentClientError`] to a [`DriverError`].
fn map_client_error(err: AgentClientError) -> DriverError {
    match err {
        AgentClientError::NotConnected => DriverError::NotConnected,
        err @ AgentClientError::Connect { .. } => DriverError::ConnectionLost(err.to_string()),
        AgentClientError::Io(e) => DriverError::Io(e),
        AgentClientError::Protocol(e) => DriverError::CommandFailed(e.to_string()),
        AgentClientError::Rejected { message, .. } => DriverError::CommandFailed(message),
        AgentClientError::Timeout(_) => DriverError::Timeout,
    }
}

/// Checks that the response is [`Response::Ok`] and returns a
/// [`DriverError::CommandFailed`] if it is not.
fn expect_ok(response: Response) -> Result<(), DriverError> {
    match response {
        Response::Ok => Ok(()),
        other => Err(DriverError::CommandFailed(format!(
            "unexpected response: {other:?}"
        ))),
    }
}

/// An [`AutomationDriver`] backed by a TCP connection to the device agent.
///
/// The client is wrapped in a [`tokio::sync::Mutex`] so that the `&self`
/// trait methods can acquire mutable access for sending requests.
pub struct AgentDriver {
    host: String,
    port: u16,
    client: Mutex<Option<AgentClient>>,
}

impl AgentDriver {
    /// Creates a driver for a direct TCP connection.
    ///
    /// No connection is established until [`connect`](AutomationDriver::connect) is called.
    pub fn direct(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            client: Mutex::new(None),
        }
    }

    /// Returns the configured host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Resolves the target, opens a client and verifies it with a heartbeat.
    async fn create_client(&self) -> Result<AgentClient, DriverError> {
        let host_port = format!("{}:{}", self.host, self.port);
        let addr = tokio::net::lookup_host(&host_port)
            .await
            .map_err(|e| DriverError::ConnectionLost(e.to_string()))?
            .next()
            .ok_or_else(|| DriverError::ConnectionLost(format!("could not resolve {host_port}")))?;

        let mut client = AgentClient::connect(addr).await.map_err(map_client_error)?;
        client.heartbeat().await.map_err(map_client_error)?;
        Ok(client)
    }

    async fn send(&self, request: &Request) -> Result<Response, DriverError> {
        self.send_within(request, DEFAULT_READ_TIMEOUT).await
    }

    async fn send_within(
        &self,
        request: &Request,
        read_timeout: Duration,
    ) -> Result<Response, DriverError> {
        let mut guard = self.client.lock().await;
        let client = guard.as_mut().ok_or(DriverError::NotConnected)?;
        client
            .request(request, read_timeout)
            .await
            .map_err(map_client_error)
    }
}

#[async_trait]
impl AutomationDriver for AgentDriver {
    #[instrument(skip(self), level = "debug")]
    async fn connect(&mut self) -> Result<(), DriverError> {
        let client = self.create_client().await?;
        *self.client.lock().await = Some(client);
        debug!(host = %self.host, port = self.port, "agent driver connected");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        // try_lock avoids blocking; a held lock means a request is in flight
        // on a live client.
        match self.client.try_lock() {
            Ok(guard) => guard.as_ref().map_or(false, |c| c.is_connected()),
            Err(_) => true,
        }
    }

    #[instrument(skip(self), level = "debug")]
    async fn dump_tree(&self) -> Result<Vec<UIElement>, DriverError> {
        match self.send(&Request::DumpTree).await? {
            Response::Tree { json } => {
                serde_json::from_str(&json).map_err(|e| DriverError::JsonParse(e.to_string()))
            }
            other => Err(DriverError::CommandFailed(format!(
                "unexpected response: {other:?}"
            ))),
        }
    }

    #[instrument(skip(self), level = "debug")]
    async fn find_element(&self, selector: &Selector) -> Result<Option<UIElement>, DriverError> {
        let response = self
            .send(&Request::FindElement {
                selector: selector.clone(),
            })
            .await?;
        match response {
            Response::Element { json: None } => Ok(None),
            Response::Element { json: Some(json) } => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| DriverError::JsonParse(e.to_string())),
            other => Err(DriverError::CommandFailed(format!(
                "unexpected response: {other:?}"
            ))),
        }
    }

    #[instrument(skip(self), level = "debug")]
    async fn click(&self, selector: &Selector) -> Result<(), DriverError> {
        let response = self
            .send(&Request::Click {
                selector: selector.clone(),
            })
            .await?;
        expect_ok(response)
    }

    #[instrument(skip(self, text), level = "debug")]
    async fn type_text(&self, selector: &Selector, text: &str) -> Result<(), DriverError> {
        let response = self
            .send(&Request::TypeText {
                selector: selector.clone(),
                text: text.to_string(),
            })
            .await?;
        expect_ok(response)
    }

    #[instrument(skip(self), level = "debug")]
    async fn clear_text(&self, selector: &Selector) -> Result<(), DriverError> {
        let response = self
            .send(&Request::ClearText {
                selector: selector.clone(),
            })
            .await?;
        expect_ok(response)
    }

    #[instrument(skip(self), level = "debug")]
    async fn wait_for_idle(&self, timeout_ms: u64) -> Result<(), DriverError> {
        let read_timeout = Duration::from_millis(timeout_ms) + IDLE_READ_SLACK;
        let response = self
            .send_within(&Request::WaitForIdle { timeout_ms }, read_timeout)
            .await?;
        expect_ok(response)
    }

    #[instrument(skip(self), level = "debug")]
    async fn relaunch(&self) -> Result<(), DriverError> {
        let response = self.send(&Request::Relaunch).await?;
        expect_ok(response)
    }
}
