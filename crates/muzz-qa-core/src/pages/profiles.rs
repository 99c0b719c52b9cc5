use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::Serialize;

use crate::error::SuiteError;
use crate::fixtures::texts;
use crate::locator::{Locator, Screen};
use crate::pages::LoginPage;

const BUTTON_LOGOUT: &str = "button_logout";
const PROFILE_CARD: &str = "profile_card";
const PROFILE_NAME: &str = "profile_name";
const FINISHED_STATE: &str = "finished_state";
const ERROR_STATE: &str = "error_state";
const BUTTON_RETRY: &str = "button_retry";
const BUTTON_LIKE: &str = "button_like";
const BUTTON_PASS: &str = "button_pass";
const LIKES_COUNT_TEXT: &str = "likes_count_text";

/// Extracts the integer from a `Liked: N` counter label.
///
/// Labels that do not contain the pattern count as zero.
pub fn parse_likes_count(text: &str) -> usize {
    static LIKED: OnceLock<Option<Regex>> = OnceLock::new();
    LIKED
        .get_or_init(|| Regex::new(r"Liked:\s*(\d+)").ok())
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Why [`ProfilesPage::like_multiple_profiles`] stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum StopReason {
    /// All requested likes were performed.
    Completed,
    /// The feed reached its finished state first.
    Exhausted,
    /// No profile card was on screen.
    NoProfile,
    /// An interaction failed; the message is the underlying error.
    Interrupted(String),
}

/// Outcome of a bulk like run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LikeRun {
    pub requested: usize,
    pub liked: usize,
    pub stop: StopReason,
}

/// The profiles screen: the swipe feed plus its loading, error and finished
/// states.
#[derive(Debug)]
pub struct ProfilesPage {
    screen: Screen,
}

impl ProfilesPage {
    pub fn new(screen: Screen) -> Self {
        screen.reporter().info("=== Navigated to: Profiles Page ===");
        Self { screen }
    }

    fn logout_button(&self) -> Locator {
        self.screen.find_by_tag(BUTTON_LOGOUT)
    }

    fn profile_card(&self) -> Locator {
        self.screen.find_by_tag(PROFILE_CARD)
    }

    fn profile_name(&self) -> Locator {
        self.screen.find_by_tag(PROFILE_NAME)
    }

    fn finished_state(&self) -> Locator {
        self.screen.find_by_tag(FINISHED_STATE)
    }

    fn error_state(&self) -> Locator {
        self.screen.find_by_tag(ERROR_STATE)
    }

    fn retry_button(&self) -> Locator {
        self.screen.find_by_tag(BUTTON_RETRY)
    }

    fn like_button(&self) -> Locator {
        self.screen.find_by_tag(BUTTON_LIKE)
    }

    fn pass_button(&self) -> Locator {
        self.screen.find_by_tag(BUTTON_PASS)
    }

    fn likes_count_text(&self) -> Locator {
        self.screen.find_by_tag(LIKES_COUNT_TEXT)
    }

    pub async fn like_profile(&self) -> Result<&Self, SuiteError> {
        self.screen.reporter().info("Liking profile");
        self.screen.click(&self.like_button()).await?;
        Ok(self)
    }

    pub async fn pass_profile(&self) -> Result<&Self, SuiteError> {
        self.screen.reporter().info("Passing on profile");
        self.screen.click(&self.pass_button()).await?;
        Ok(self)
    }

    /// Waits until the feed shows its next state after a swipe.
    async fn wait_for_feed_to_settle(&self) -> Result<(), SuiteError> {
        let card = self.profile_card();
        let finished = self.finished_state();
        let error = self.error_state();
        let (card, finished, error) = (&card, &finished, &error);
        let screen = &self.screen;
        screen
            .wait_until(
                "next profile, finished or error state",
                screen.config().default_wait(),
                move || async move {
                    screen.is_displayed(card).await
                        || screen.is_displayed(finished).await
                        || screen.is_displayed(error).await
                },
            )
            .await
    }

    /// Likes up to `count` profiles, stopping early when the feed runs out.
    ///
    /// Never fails: a broken interaction ends the run with
    /// [`StopReason::Interrupted`] and the likes performed so far.
    pub async fn like_multiple_profiles(&self, count: usize) -> LikeRun {
        let reporter = self.screen.reporter();
        reporter.info(&format!("Liking {count} profiles"));
        let pacing = self.screen.config().like_pacing();

        let mut liked = 0;
        let mut stop = StopReason::Completed;
        for i in 1..=count {
            reporter.info(&format!("Liking profile {i} of {count}"));

            if self.is_finished_state_displayed().await {
                reporter.info(&format!("Reached end of profiles at {liked} likes"));
                stop = StopReason::Exhausted;
                break;
            }
            if !self.is_profile_displayed().await {
                reporter.warn(&format!("Profile {i} not displayed, stopping"));
                stop = StopReason::NoProfile;
                break;
            }

            if let Err(e) = self.like_profile().await {
                reporter.error(&format!("Failed to like profile {i}: {e}"));
                stop = StopReason::Interrupted(e.to_string());
                break;
            }
            liked += 1;

            if let Err(e) = self.wait_for_feed_to_settle().await {
                reporter.error(&format!("Feed did not settle after like {i}: {e}"));
                stop = StopReason::Interrupted(e.to_string());
                break;
            }
            // The backend records a like asynchronously and the screen
            // has no marker for it.
            self.screen.pause(pacing).await;
        }

        reporter.info(&format!(
            "Successfully liked {liked} out of {count} profiles"
        ));
        LikeRun {
            requested: count,
            liked,
            stop,
        }
    }

    /// Performs `likes` likes then `passes` passes, skipping each once no
    /// profile is left to act on.
    pub async fn like_and_pass_profiles(
        &self,
        likes: usize,
        passes: usize,
    ) -> Result<&Self, SuiteError> {
        self.screen
            .reporter()
            .info(&format!("Performing {likes} likes and {passes} passes"));

        for _ in 0..likes {
            if self.can_swipe().await {
                self.like_profile().await?;
            }
        }
        for _ in 0..passes {
            if self.can_swipe().await {
                self.pass_profile().await?;
            }
        }
        Ok(self)
    }

    async fn can_swipe(&self) -> bool {
        self.is_profile_displayed().await && !self.is_finished_state_displayed().await
    }

    pub async fn click_retry(&self) -> Result<&Self, SuiteError> {
        self.screen.reporter().info("Clicking retry button");
        self.screen.click(&self.retry_button()).await?;
        Ok(self)
    }

    pub async fn click_logout(self) -> Result<LoginPage, SuiteError> {
        self.screen.reporter().info("Clicking logout button");
        self.screen.click(&self.logout_button()).await?;
        Ok(LoginPage::new(self.screen))
    }

    pub async fn verify_profile_displayed(&self) -> Result<&Self, SuiteError> {
        self.screen.reporter().info("Verifying profile is displayed");
        self.screen.assert_displayed(&self.profile_card()).await?;
        self.screen.reporter().info("✓ Profile verified");
        Ok(self)
    }

    pub async fn verify_profiles_loaded(&self) -> Result<&Self, SuiteError> {
        self.screen.reporter().info("Verifying profiles are loaded");
        self.screen.wait_for_idle().await?;
        for locator in [self.profile_card(), self.like_button(), self.pass_button()] {
            self.screen.assert_displayed(&locator).await?;
        }
        self.screen.reporter().info("✓ Profiles loaded verified");
        Ok(self)
    }

    pub async fn verify_finished_state_displayed(&self) -> Result<&Self, SuiteError> {
        self.screen
            .reporter()
            .info("Verifying finished state is displayed");
        self.screen.assert_displayed(&self.finished_state()).await?;
        self.screen
            .assert_displayed(&self.screen.find_by_text(texts::FINISHED))
            .await?;
        self.screen.reporter().info("✓ Finished state verified");
        Ok(self)
    }

    /// Compares the finished-state like counter with `expected`.
    pub async fn verify_likes_count(&self, expected: usize) -> Result<&Self, SuiteError> {
        let reporter = self.screen.reporter();
        reporter.info(&format!("Verifying likes count: {expected}"));

        if !self.is_finished_state_displayed().await {
            reporter.warn("Not in finished state yet, waiting...");
            self.screen
                .wait_for(&self.finished_state(), self.screen.config().default_wait())
                .await;
        }

        let text = self.screen.get_text(&self.likes_count_text()).await;
        reporter.info(&format!("Likes count text: '{text}'"));

        let actual = parse_likes_count(&text);
        if actual == expected {
            reporter.info(&format!("✓ Likes count verified: {actual}"));
            Ok(self)
        } else {
            reporter.error(&format!(
                "✗ Likes count mismatch - Expected: {expected}, Actual: {actual}"
            ));
            Err(SuiteError::AssertionFailed(format!(
                "Expected {expected} likes, but found {actual}"
            )))
        }
    }

    pub async fn verify_like_button_enabled(&self) -> Result<&Self, SuiteError> {
        self.screen.reporter().info("Verifying like button is enabled");
        self.screen.assert_displayed(&self.like_button()).await?;
        self.screen.reporter().info("✓ Like button enabled");
        Ok(self)
    }

    pub async fn verify_pass_button_enabled(&self) -> Result<&Self, SuiteError> {
        self.screen.reporter().info("Verifying pass button is enabled");
        self.screen.assert_displayed(&self.pass_button()).await?;
        self.screen.reporter().info("✓ Pass button enabled");
        Ok(self)
    }

    pub async fn is_profile_displayed(&self) -> bool {
        self.screen.is_displayed(&self.profile_card()).await
    }

    pub async fn is_error_state_displayed(&self) -> bool {
        self.screen.is_displayed(&self.error_state()).await
    }

    pub async fn is_finished_state_displayed(&self) -> bool {
        self.screen.is_displayed(&self.finished_state()).await
    }

    pub async fn profile_name_text(&self) -> String {
        self.screen.get_text(&self.profile_name()).await
    }

    /// Waits for the first profile card; silent if it never shows.
    pub async fn wait_for_profiles_to_load(&self, timeout: Duration) -> &Self {
        self.screen.reporter().info("Waiting for profiles to load");
        self.screen.wait_for(&self.profile_card(), timeout).await;
        self.screen.reporter().info("Profiles loaded");
        self
    }
}
