//! Scenario registry types and the runner that isolates each scenario.
//!
//! Every scenario gets a freshly launched app from an [`AppLauncher`], a
//! [`ScenarioContext`] to reach the login page, and start/pass/fail banners
//! around its body. Failures are collected into a [`SuiteReport`]; one
//! failing scenario never stops the rest.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::agent_driver::AgentDriver;
use crate::config::SuiteConfig;
use crate::driver::AutomationDriver;
use crate::error::SuiteError;
use crate::locator::Screen;
use crate::pages::LoginPage;
use crate::report::Reporter;
use crate::simulated::{SimulatedApp, SimulatedOptions};

/// The future a scenario body returns.
pub type ScenarioFuture = Pin<Box<dyn Future<Output = Result<(), SuiteError>>>>;

/// Which flow a scenario exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    Login,
    Profiles,
}

impl Feature {
    pub fn as_str(self) -> &'static str {
        match self {
            Feature::Login => "login",
            Feature::Profiles => "profiles",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "login" => Ok(Feature::Login),
            "profiles" => Ok(Feature::Profiles),
            other => Err(format!(
                "unknown feature '{other}' (expected 'login' or 'profiles')"
            )),
        }
    }
}

/// A named, self-contained pass/fail check.
#[derive(Clone, Copy)]
pub struct Scenario {
    pub name: &'static str,
    pub feature: Feature,
    pub run: fn(ScenarioContext) -> ScenarioFuture,
}

impl Scenario {
    pub const fn new(
        name: &'static str,
        feature: Feature,
        run: fn(ScenarioContext) -> ScenarioFuture,
    ) -> Self {
        Self { name, feature, run }
    }
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("feature", &self.feature)
            .finish()
    }
}

/// Keeps the scenarios of `feature` (if given) whose name contains `filter`
/// (if given).
pub fn select(
    scenarios: &[Scenario],
    feature: Option<Feature>,
    filter: Option<&str>,
) -> Vec<Scenario> {
    scenarios
        .iter()
        .filter(|s| feature.map_or(true, |f| s.feature == f))
        .filter(|s| filter.map_or(true, |needle| s.name.contains(needle)))
        .copied()
        .collect()
}

/// What a scenario body can reach.
pub struct ScenarioContext {
    name: &'static str,
    screen: Screen,
}

impl ScenarioContext {
    pub fn new(name: &'static str, screen: Screen) -> Self {
        Self { name, screen }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    /// The app always starts on the login screen.
    pub fn login_page(&self) -> LoginPage {
        LoginPage::new(self.screen.clone())
    }

    pub fn log_step(&self, step: &str) {
        self.screen.reporter().step(step);
    }

    pub async fn wait_for_idle(&self) -> Result<(), SuiteError> {
        self.screen.wait_for_idle().await
    }

    pub fn reporter(&self) -> &dyn Reporter {
        self.screen.reporter()
    }

    pub fn config(&self) -> &SuiteConfig {
        self.screen.config()
    }
}

/// Provides a freshly started app for each scenario.
#[async_trait]
pub trait AppLauncher: Send + Sync {
    /// Checks the backend is reachable before any scenario runs.
    async fn prepare(&self) -> Result<(), SuiteError> {
        Ok(())
    }

    /// Returns a driver attached to an app in its initial state.
    async fn launch(&self) -> Result<Arc<dyn AutomationDriver>, SuiteError>;
}

/// Launches a new [`SimulatedApp`] per scenario.
#[derive(Debug, Clone, Default)]
pub struct SimulatedLauncher {
    options: SimulatedOptions,
}

impl SimulatedLauncher {
    pub fn new(options: SimulatedOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl AppLauncher for SimulatedLauncher {
    async fn launch(&self) -> Result<Arc<dyn AutomationDriver>, SuiteError> {
        let mut app = SimulatedApp::new(self.options.clone());
        app.connect().await?;
        Ok(Arc::new(app))
    }
}

/// Shares one agent connection and asks the agent to relaunch the app
/// before each scenario.
pub struct AgentLauncher {
    host: String,
    port: u16,
    driver: Mutex<Option<Arc<AgentDriver>>>,
}

impl AgentLauncher {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            driver: Mutex::new(None),
        }
    }

    async fn connected(&self) -> Result<Arc<AgentDriver>, SuiteError> {
        let mut guard = self.driver.lock().await;
        if let Some(driver) = guard.as_ref() {
            if driver.is_connected() {
                return Ok(driver.clone());
            }
        }

        let mut driver = AgentDriver::direct(self.host.clone(), self.port);
        driver.connect().await.map_err(|e| {
            SuiteError::Launch(format!(
                "cannot reach agent at {}:{}: {e}",
                self.host, self.port
            ))
        })?;
        let driver = Arc::new(driver);
        *guard = Some(driver.clone());
        Ok(driver)
    }
}

#[async_trait]
impl AppLauncher for AgentLauncher {
    async fn prepare(&self) -> Result<(), SuiteError> {
        self.connected().await.map(|_| ())
    }

    async fn launch(&self) -> Result<Arc<dyn AutomationDriver>, SuiteError> {
        let driver = self.connected().await?;
        driver
            .relaunch()
            .await
            .map_err(|e| SuiteError::Launch(format!("agent could not relaunch the app: {e}")))?;
        let driver: Arc<dyn AutomationDriver> = driver;
        Ok(driver)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Passed,
    Failed,
}

/// Result of one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub name: String,
    pub feature: Feature,
    pub verdict: Verdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Passed
    }
}

/// Result of a whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.scenarios.iter().filter(|s| s.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.scenarios.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }
}

/// Runs scenarios one at a time, each against a fresh app.
pub struct ScenarioHarness {
    launcher: Arc<dyn AppLauncher>,
    reporter: Arc<dyn Reporter>,
    config: Arc<SuiteConfig>,
}

impl ScenarioHarness {
    pub fn new(
        launcher: Arc<dyn AppLauncher>,
        reporter: Arc<dyn Reporter>,
        config: SuiteConfig,
    ) -> Self {
        Self {
            launcher,
            reporter,
            config: Arc::new(config),
        }
    }

    pub async fn prepare(&self) -> Result<(), SuiteError> {
        self.launcher.prepare().await
    }

    pub async fn run(&self, scenario: &Scenario) -> ScenarioReport {
        let span = info_span!("scenario", name = scenario.name, feature = %scenario.feature);
        self.run_inner(scenario).instrument(span).await
    }

    async fn run_inner(&self, scenario: &Scenario) -> ScenarioReport {
        let started_at = Utc::now();
        let clock = Instant::now();
        self.reporter.test_start(scenario.name);

        let result = match self.launcher.launch().await {
            Ok(driver) => {
                let screen = Screen::new(driver, self.reporter.clone(), self.config.clone());
                (scenario.run)(ScenarioContext::new(scenario.name, screen)).await
            }
            Err(e) => Err(e),
        };

        let duration_ms = clock.elapsed().as_millis() as u64;
        let (verdict, error, error_kind) = match &result {
            Ok(()) => {
                self.reporter.test_passed(scenario.name);
                (Verdict::Passed, None, None)
            }
            Err(e) => {
                self.reporter.test_failed(scenario.name, &e.to_string());
                (
                    Verdict::Failed,
                    Some(e.to_string()),
                    Some(e.kind().to_string()),
                )
            }
        };
        info!(verdict = ?verdict, duration_ms, "scenario finished");

        ScenarioReport {
            name: scenario.name.to_string(),
            feature: scenario.feature,
            verdict,
            error,
            error_kind,
            started_at,
            duration_ms,
        }
    }

    pub async fn run_all(&self, scenarios: &[Scenario]) -> SuiteReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, count = scenarios.len(), "starting scenario run");

        let mut reports = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            reports.push(self.run(scenario).await);
        }

        SuiteReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            scenarios: reports,
        }
    }
}
