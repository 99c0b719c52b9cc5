//! Shared test helpers for muzz-qa-core integration tests.
//!
//! Provides scripted mock agents for exercising the TCP protocol path, a
//! bridge that serves a [`SimulatedApp`] over that protocol, and a quiet
//! suite configuration so scenario runs finish quickly.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use muzz_qa_core::config::SuiteConfig;
use muzz_qa_core::driver::AutomationDriver;
use muzz_qa_core::harness::{AppLauncher, ScenarioHarness};
use muzz_qa_core::protocol::{
    decode_request, encode_response, read_frame_length, Request, Response,
};
use muzz_qa_core::report::MemoryReporter;
use muzz_qa_core::simulated::{SimulatedApp, SimulatedOptions};

/// Suite timings short enough for tests; no like pacing.
pub fn fast_config() -> SuiteConfig {
    SuiteConfig {
        default_wait_ms: 500,
        login_timeout_ms: 1_000,
        idle_timeout_ms: 1_000,
        poll_interval_ms: 10,
        like_pacing_ms: 0,
        ..SuiteConfig::default()
    }
}

/// A harness over `launcher` that records everything it reports.
pub fn quiet_harness(launcher: Arc<dyn AppLauncher>) -> (ScenarioHarness, Arc<MemoryReporter>) {
    let reporter = Arc::new(MemoryReporter::new());
    let harness = ScenarioHarness::new(launcher, reporter.clone(), fast_config());
    (harness, reporter)
}

async fn read_request_frame(stream: &mut TcpStream) -> Option<Vec<u8>> {
    let mut header = [0u8; 4];
    stream.read_exact(&mut header).await.ok()?;
    let len = read_frame_length(&header) as usize;
    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).await.ok()?;
    Some(payload)
}

/// Start a mock TCP agent that accepts one connection and answers a fixed
/// sequence of requests. The first response is consumed by the heartbeat
/// that `AgentDriver::connect()` sends.
pub async fn mock_agent(responses: Vec<Response>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        for response in responses {
            if read_request_frame(&mut stream).await.is_none() {
                return;
            }
            stream.write_all(&encode_response(&response)).await.unwrap();
            stream.flush().await.unwrap();
        }
    });

    addr
}

/// Describes the behavior a mock agent should exhibit for a single incoming
/// request frame.
pub enum MockBehavior {
    /// Read one request frame and reply with the given response.
    Respond(Response),
    /// Read one request frame, sleep for `Duration`, then reply.
    Delay(Duration, Response),
    /// Read one request frame and then close the connection.
    Drop,
    /// Read one request frame and send invalid (non-protocol) bytes.
    SendGarbage,
    /// Accept the connection but never read or write.
    Hang,
}

/// Start a mock TCP agent whose behavior is scripted per request.
pub async fn programmable_mock_agent(behaviors: Vec<MockBehavior>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        for behavior in behaviors {
            match behavior {
                MockBehavior::Respond(response) => {
                    if read_request_frame(&mut stream).await.is_none() {
                        return;
                    }
                    let _ = stream.write_all(&encode_response(&response)).await;
                    let _ = stream.flush().await;
                }
                MockBehavior::Delay(duration, response) => {
                    if read_request_frame(&mut stream).await.is_none() {
                        return;
                    }
                    tokio::time::sleep(duration).await;
                    let _ = stream.write_all(&encode_response(&response)).await;
                    let _ = stream.flush().await;
                }
                MockBehavior::Drop => {
                    let _ = read_request_frame(&mut stream).await;
                    return;
                }
                MockBehavior::SendGarbage => {
                    if read_request_frame(&mut stream).await.is_none() {
                        return;
                    }
                    let garbage = [0x04, 0x00, 0x00, 0x00, 0xDE, 0xAD, 0xBE, 0xEF];
                    let _ = stream.write_all(&garbage).await;
                    let _ = stream.flush().await;
                }
                MockBehavior::Hang => {
                    std::future::pending::<()>().await;
                }
            }
        }
    });

    addr
}

/// Answer one decoded request against the simulated app.
async fn dispatch(app: &SimulatedApp, request: Request) -> Response {
    let result = match request {
        Request::Heartbeat => Ok(Response::Ok),
        Request::Click { selector } => app.click(&selector).await.map(|_| Response::Ok),
        Request::TypeText { selector, text } => {
            app.type_text(&selector, &text).await.map(|_| Response::Ok)
        }
        Request::ClearText { selector } => app.clear_text(&selector).await.map(|_| Response::Ok),
        Request::WaitForIdle { timeout_ms } => {
            app.wait_for_idle(timeout_ms).await.map(|_| Response::Ok)
        }
        Request::DumpTree => app.dump_tree().await.map(|tree| Response::Tree {
            json: serde_json::to_string(&tree).unwrap(),
        }),
        Request::FindElement { selector } => {
            app.find_element(&selector).await.map(|found| Response::Element {
                json: found.map(|el| serde_json::to_string(&el).unwrap()),
            })
        }
        Request::Relaunch => app.relaunch().await.map(|_| Response::Ok),
    };
    result.unwrap_or_else(|e| Response::Error {
        message: e.to_string(),
    })
}

/// Serve a [`SimulatedApp`] over the agent protocol, one connection at a time,
/// until the test's runtime shuts down.
pub async fn simulated_agent(options: SimulatedOptions) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Arc::new(SimulatedApp::new(options));

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            while let Some(payload) = read_request_frame(&mut stream).await {
                let response = match decode_request(&payload) {
                    Ok(request) => dispatch(&app, request).await,
                    Err(e) => Response::Error {
                        message: e.to_string(),
                    },
                };
                if stream.write_all(&encode_response(&response)).await.is_err() {
                    break;
                }
                let _ = stream.flush().await;
            }
        }
    });

    addr
}
