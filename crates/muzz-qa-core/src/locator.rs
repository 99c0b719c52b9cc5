//! Element lookup, interaction and waiting on top of an [`AutomationDriver`].
//!
//! A [`Locator`] is only a selector; it is resolved against a fresh snapshot
//! each time it is used, so it never goes stale across navigation or
//! settling waits. [`Screen`] bundles the driver, the reporter and the suite
//! timings, and is the only thing a page object holds.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::SuiteConfig;
use crate::driver::{AutomationDriver, DriverError, Selector};
use crate::element::UIElement;
use crate::error::SuiteError;
use crate::report::Reporter;

/// A re-resolvable reference to at most one element on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    selector: Selector,
}

impl Locator {
    pub fn selector(&self) -> &Selector {
        &self.selector
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.selector, f)
    }
}

/// Driver, reporter and timings shared by every page of a scenario.
#[derive(Clone)]
pub struct Screen {
    driver: Arc<dyn AutomationDriver>,
    reporter: Arc<dyn Reporter>,
    config: Arc<SuiteConfig>,
}

impl fmt::Debug for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Screen")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Screen {
    pub fn new(
        driver: Arc<dyn AutomationDriver>,
        reporter: Arc<dyn Reporter>,
        config: Arc<SuiteConfig>,
    ) -> Self {
        Self {
            driver,
            reporter,
            config,
        }
    }

    pub fn reporter(&self) -> &dyn Reporter {
        self.reporter.as_ref()
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    pub fn find_by_text(&self, text: &str) -> Locator {
        debug!(text, "locating by text");
        Locator {
            selector: Selector::text(text),
        }
    }

    pub fn find_by_tag(&self, tag: &str) -> Locator {
        debug!(tag, "locating by tag");
        Locator {
            selector: Selector::tag(tag),
        }
    }

    async fn resolve(&self, locator: &Locator) -> Result<Option<UIElement>, DriverError> {
        self.driver.find_element(&locator.selector).await
    }

    /// Polls until `locator` resolves or `timeout` elapses.
    ///
    /// Timing out is not an error: the locator comes back either way and the
    /// caller's next action or assertion reports the absence.
    pub async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Locator {
        debug!(%locator, timeout_ms = timeout.as_millis() as u64, "waiting for element");
        let start = Instant::now();
        loop {
            if matches!(self.resolve(locator).await, Ok(Some(_))) {
                break;
            }
            if start.elapsed() >= timeout {
                debug!(%locator, "wait elapsed without a match");
                break;
            }
            tokio::time::sleep(self.config.poll_interval()).await;
        }
        locator.clone()
    }

    /// Polls `condition` until it returns `true`, failing with
    /// [`SuiteError::Timeout`] once `timeout` has elapsed.
    ///
    /// The condition is checked at least once, even with a zero timeout.
    pub async fn wait_until<F, Fut>(
        &self,
        what: &str,
        timeout: Duration,
        mut condition: F,
    ) -> Result<(), SuiteError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        let start = Instant::now();
        loop {
            if condition().await {
                return Ok(());
            }
            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Err(SuiteError::Timeout {
                    what: what.to_string(),
                    elapsed_ms: elapsed.as_millis() as u64,
                });
            }
            tokio::time::sleep(self.config.poll_interval()).await;
        }
    }

    /// `true` only if the element exists and is not reported hidden.
    pub async fn is_displayed(&self, locator: &Locator) -> bool {
        match self.resolve(locator).await {
            Ok(Some(element)) => element.is_displayed(),
            Ok(None) => false,
            Err(e) => {
                debug!(%locator, error = %e, "lookup failed while checking visibility");
                false
            }
        }
    }

    pub async fn assert_displayed(&self, locator: &Locator) -> Result<(), SuiteError> {
        match self.resolve(locator).await? {
            Some(element) if element.is_displayed() => Ok(()),
            _ => Err(SuiteError::not_displayed(locator.to_string())),
        }
    }

    pub async fn click(&self, locator: &Locator) -> Result<(), SuiteError> {
        debug!(%locator, "click");
        self.driver.click(&locator.selector).await?;
        self.wait_for_idle().await
    }

    pub async fn type_text(&self, locator: &Locator, text: &str) -> Result<(), SuiteError> {
        debug!(%locator, "type text");
        self.driver.type_text(&locator.selector, text).await?;
        self.wait_for_idle().await
    }

    pub async fn clear_text(&self, locator: &Locator) -> Result<(), SuiteError> {
        debug!(%locator, "clear text");
        self.driver.clear_text(&locator.selector).await?;
        self.wait_for_idle().await
    }

    /// Editable contents, else the label, else `""`. Never fails.
    pub async fn get_text(&self, locator: &Locator) -> String {
        match self.resolve(locator).await {
            Ok(Some(element)) => element.visible_text().to_string(),
            Ok(None) => {
                self.reporter
                    .warn(&format!("Could not get text: no node matching {locator}"));
                String::new()
            }
            Err(e) => {
                warn!(%locator, error = %e, "text lookup failed");
                self.reporter.warn(&format!("Could not get text: {e}"));
                String::new()
            }
        }
    }

    /// Blocks until the app reports idle, bounded by the configured timeout.
    pub async fn wait_for_idle(&self) -> Result<(), SuiteError> {
        self.driver
            .wait_for_idle(self.config.idle_timeout_ms)
            .await
            .map_err(SuiteError::from)
    }

    /// Fixed delay, for conditions the screen cannot show.
    pub async fn pause(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        debug!(ms = duration.as_millis() as u64, "pausing");
        tokio::time::sleep(duration).await;
    }
}
