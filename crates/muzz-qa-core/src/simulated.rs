//! In-process model of the dating app, implementing [`AutomationDriver`].
//!
//! [`SimulatedApp`] renders the same semantics tree the real app exposes
//! (same test tags, same fixed texts) from a small state machine:
//!
//! - **Login**: title, tagline, username/password fields, login button, and an
//!   error message after a rejected attempt.
//! - **Profiles**: a logout button, then either a loading indicator, an error
//!   state with a retry button, the current profile card, or (once the feed is
//!   exhausted) the finished state with like/pass counters.
//!
//! Knobs on [`SimulatedOptions`] make the slow, failing and flaky paths
//! reachable from tests.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument};

use crate::driver::{search_tree, AutomationDriver, DriverError, Selector};
use crate::element::UIElement;
use crate::fixtures::{texts, valid};

const DEFAULT_PROFILES: [&str; 5] = ["Amira", "Bilal", "Hana", "Yusuf", "Leila"];

/// Behaviour of a [`SimulatedApp`].
#[derive(Debug, Clone)]
pub struct SimulatedOptions {
    /// Names in the profile feed, in display order.
    pub profiles: Vec<String>,
    /// How long the feed shows its loading indicator after login or retry.
    pub load_delay: Duration,
    /// Fail the first feed load, showing the error state until retried.
    pub network_error: bool,
    /// Like clicks after this many succeed with a dropped connection.
    pub fail_likes_after: Option<usize>,
}

impl Default for SimulatedOptions {
    fn default() -> Self {
        Self {
            profiles: DEFAULT_PROFILES.iter().map(|s| s.to_string()).collect(),
            load_delay: Duration::ZERO,
            network_error: false,
            fail_likes_after: None,
        }
    }
}

impl SimulatedOptions {
    /// A feed of `count` generated profiles.
    pub fn with_profile_count(mut self, count: usize) -> Self {
        self.profiles = (1..=count).map(|i| format!("Profile {i}")).collect();
        self
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    pub fn with_network_error(mut self, enabled: bool) -> Self {
        self.network_error = enabled;
        self
    }

    pub fn with_fail_likes_after(mut self, likes: usize) -> Self {
        self.fail_likes_after = Some(likes);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Login,
    Profiles,
}

#[derive(Debug)]
struct AppState {
    screen: Screen,
    username: String,
    password: String,
    login_rejected: bool,
    load_started: Instant,
    load_attempts: u32,
    index: usize,
    liked: usize,
    passed: usize,
}

impl AppState {
    fn fresh() -> Self {
        Self {
            screen: Screen::Login,
            username: String::new(),
            password: String::new(),
            login_rejected: false,
            load_started: Instant::now(),
            load_attempts: 0,
            index: 0,
            liked: 0,
            passed: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Feed {
    Loading,
    Failed,
    Showing,
    Finished,
}

/// An in-memory [`AutomationDriver`] backend.
pub struct SimulatedApp {
    options: SimulatedOptions,
    state: Mutex<AppState>,
    connected: bool,
}

impl SimulatedApp {
    pub fn new(options: SimulatedOptions) -> Self {
        Self {
            options,
            state: Mutex::new(AppState::fresh()),
            connected: false,
        }
    }

    /// Likes and passes recorded by the backend so far.
    pub async fn counts(&self) -> (usize, usize) {
        let state = self.state.lock().await;
        (state.liked, state.passed)
    }

    fn feed(&self, state: &AppState) -> Feed {
        if state.load_started.elapsed() < self.options.load_delay {
            Feed::Loading
        } else if self.options.network_error && state.load_attempts == 1 {
            Feed::Failed
        } else if state.index < self.options.profiles.len() {
            Feed::Showing
        } else {
            Feed::Finished
        }
    }

    fn render(&self, state: &AppState) -> Vec<UIElement> {
        match state.screen {
            Screen::Login => vec![self.render_login(state)],
            Screen::Profiles => vec![self.render_profiles(state)],
        }
    }

    fn render_login(&self, state: &AppState) -> UIElement {
        let mut root = UIElement::tagged("login_screen")
            .with_child(UIElement::tagged("app_title").with_text("Muzz"))
            .with_child(UIElement::tagged("app_tagline").with_text("Find your someone"))
            .with_child(
                UIElement::tagged("username_field")
                    .with_role("TextField")
                    .with_text("Username")
                    .with_editable_text(state.username.clone()),
            )
            .with_child(
                UIElement::tagged("password_field")
                    .with_role("TextField")
                    .with_text("Password")
                    .with_editable_text(state.password.clone()),
            )
            .with_child(
                UIElement::tagged("login_button")
                    .with_role("Button")
                    .with_text("Login"),
            );
        if state.login_rejected {
            root = root.with_child(
                UIElement::tagged("error_message").with_text("Invalid username or password"),
            );
        }
        root
    }

    fn render_profiles(&self, state: &AppState) -> UIElement {
        let root = UIElement::tagged("profiles_screen").with_child(
            UIElement::tagged("button_logout")
                .with_role("Button")
                .with_text("Logout"),
        );

        match self.feed(state) {
            Feed::Loading => root.with_child(UIElement::tagged("loading").with_text("Loading...")),
            Feed::Failed => root
                .with_child(UIElement::tagged("error_state").with_text("Something went wrong"))
                .with_child(
                    UIElement::tagged("button_retry")
                        .with_role("Button")
                        .with_text("Retry"),
                ),
            Feed::Showing => root.with_child(
                UIElement::tagged("profile_card")
                    .with_child(
                        UIElement::tagged("profile_name")
                            .with_text(self.options.profiles[state.index].clone()),
                    )
                    .with_child(
                        UIElement::tagged("button_like")
                            .with_role("Button")
                            .with_text("Like"),
                    )
                    .with_child(
                        UIElement::tagged("button_pass")
                            .with_role("Button")
                            .with_text("Pass"),
                    ),
            ),
            Feed::Finished => root.with_child(
                UIElement::tagged("finished_state")
                    .with_text(texts::FINISHED)
                    .with_child(
                        UIElement::tagged("likes_count_text")
                            .with_text(format!("{} {}", texts::LIKES_PREFIX, state.liked)),
                    )
                    .with_child(
                        UIElement::tagged("passes_count_text")
                            .with_text(format!("Passed: {}", state.passed)),
                    ),
            ),
        }
    }

    /// Resolves `selector` against the current screen and returns the tag of
    /// the matched node.
    fn resolve(&self, state: &AppState, selector: &Selector) -> Result<String, DriverError> {
        search_tree(&self.render(state), selector)
            .and_then(|el| el.test_tag)
            .ok_or_else(|| DriverError::ElementNotFound(selector.to_string()))
    }

    fn start_load(state: &mut AppState) {
        state.load_started = Instant::now();
        state.load_attempts += 1;
    }
}

impl Default for SimulatedApp {
    fn default() -> Self {
        Self::new(SimulatedOptions::default())
    }
}

#[async_trait]
impl AutomationDriver for SimulatedApp {
    async fn connect(&mut self) -> Result<(), DriverError> {
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn dump_tree(&self) -> Result<Vec<UIElement>, DriverError> {
        let state = self.state.lock().await;
        Ok(self.render(&state))
    }

    #[instrument(skip(self), level = "debug")]
    async fn click(&self, selector: &Selector) -> Result<(), DriverError> {
        let mut state = self.state.lock().await;
        let tag = self.resolve(&state, selector)?;

        match tag.as_str() {
            "login_button" => {
                if state.username == valid::USERNAME && state.password == valid::PASSWORD {
                    state.screen = Screen::Profiles;
                    state.login_rejected = false;
                    Self::start_load(&mut state);
                } else {
                    state.login_rejected = true;
                }
            }
            "button_like" => {
                if let Some(limit) = self.options.fail_likes_after {
                    if state.liked >= limit {
                        return Err(DriverError::ConnectionLost(
                            "simulated connection drop".to_string(),
                        ));
                    }
                }
                state.liked += 1;
                state.index += 1;
            }
            "button_pass" => {
                state.passed += 1;
                state.index += 1;
            }
            "button_retry" => Self::start_load(&mut state),
            "button_logout" => {
                state.screen = Screen::Login;
                state.username.clear();
                state.password.clear();
                state.login_rejected = false;
            }
            _ => {}
        }
        debug!(%tag, "simulated click");
        Ok(())
    }

    async fn type_text(&self, selector: &Selector, text: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock().await;
        match self.resolve(&state, selector)?.as_str() {
            "username_field" => state.username.push_str(text),
            "password_field" => state.password.push_str(text),
            other => {
                return Err(DriverError::CommandFailed(format!(
                    "node '{other}' is not editable"
                )))
            }
        }
        Ok(())
    }

    async fn clear_text(&self, selector: &Selector) -> Result<(), DriverError> {
        let mut state = self.state.lock().await;
        match self.resolve(&state, selector)?.as_str() {
            "username_field" => state.username.clear(),
            "password_field" => state.password.clear(),
            other => {
                return Err(DriverError::CommandFailed(format!(
                    "node '{other}' is not editable"
                )))
            }
        }
        Ok(())
    }

    async fn relaunch(&self) -> Result<(), DriverError> {
        *self.state.lock().await = AppState::fresh();
        Ok(())
    }
}
