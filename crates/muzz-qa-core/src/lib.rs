//! # muzz-qa-core
//!
//! End-to-end UI test suite for the Muzz dating app, built on page objects
//! over a backend-agnostic automation driver.
//!
//! Scenarios drive the app's login and profile-swiping flows and assert on
//! what is on screen: element presence, field contents and the like counter.
//! They run against either the on-device automation agent (over TCP) or an
//! in-process simulation of the app.
//!
//! ## Modules
//!
//! - [`element`] - UI tree node type shared by all backends
//! - [`driver`] - The [`AutomationDriver`](driver::AutomationDriver) trait, selectors and tree search
//! - [`protocol`] - Binary wire protocol spoken with the device agent
//! - [`agent_client`] - Framed TCP client for the agent
//! - [`agent_driver`] - Driver backend over the agent client
//! - [`simulated`] - In-process model of the app
//! - [`locator`] - Element lookup, interaction and polling waits
//! - [`pages`] - Login and profiles page objects
//! - [`report`] - Test-flow reporter
//! - [`fixtures`] - Credentials, counts and timeouts
//! - [`config`] - Persistent suite settings
//! - [`harness`] - Scenario registry types, launchers and the runner
//! - [`scenarios`] - The registered login and profile scenarios
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use muzz_qa_core::config::SuiteConfig;
//! use muzz_qa_core::harness::{ScenarioHarness, SimulatedLauncher};
//! use muzz_qa_core::report::ConsoleReporter;
//!
//! # async fn example() {
//! let harness = ScenarioHarness::new(
//!     Arc::new(SimulatedLauncher::default()),
//!     Arc::new(ConsoleReporter::new()),
//!     SuiteConfig::load(),
//! );
//! let report = harness.run_all(&muzz_qa_core::scenarios::all()).await;
//! println!("{} passed, {} failed", report.passed(), report.failed());
//! # }
//! ```

pub mod agent_client;
pub mod agent_driver;
pub mod config;
pub mod driver;
pub mod element;
pub mod error;
pub mod fixtures;
pub mod harness;
pub mod locator;
pub mod pages;
pub mod protocol;
pub mod report;
pub mod scenarios;
pub mod simulated;
