use crate::error::SuiteError;
use crate::locator::{Locator, Screen};
use crate::pages::ProfilesPage;

const USERNAME_FIELD: &str = "username_field";
const PASSWORD_FIELD: &str = "password_field";
const LOGIN_BUTTON: &str = "login_button";
const ERROR_MESSAGE: &str = "error_message";
const APP_TITLE: &str = "app_title";
const APP_TAGLINE: &str = "app_tagline";
/// Only rendered once the profiles screen is up.
const DESTINATION_MARKER: &str = "button_logout";

/// Where a login attempt ended up.
#[derive(Debug)]
pub enum LoginOutcome {
    LoggedIn(ProfilesPage),
    Rejected(LoginPage),
}

impl LoginOutcome {
    /// The profiles page, or an assertion failure if the login was rejected.
    pub fn profiles(self) -> Result<ProfilesPage, SuiteError> {
        match self {
            LoginOutcome::LoggedIn(page) => Ok(page),
            LoginOutcome::Rejected(_) => Err(SuiteError::AssertionFailed(
                "Expected to reach the profiles screen, but login was rejected".to_string(),
            )),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self, LoginOutcome::LoggedIn(_))
    }
}

/// The login screen.
#[derive(Debug)]
pub struct LoginPage {
    screen: Screen,
}

impl LoginPage {
    pub fn new(screen: Screen) -> Self {
        screen.reporter().info("=== Navigated to: Login Page ===");
        Self { screen }
    }

    fn username_field(&self) -> Locator {
        self.screen.find_by_tag(USERNAME_FIELD)
    }

    fn password_field(&self) -> Locator {
        self.screen.find_by_tag(PASSWORD_FIELD)
    }

    fn login_button(&self) -> Locator {
        self.screen.find_by_tag(LOGIN_BUTTON)
    }

    fn error_message(&self) -> Locator {
        self.screen.find_by_tag(ERROR_MESSAGE)
    }

    fn app_title(&self) -> Locator {
        self.screen.find_by_tag(APP_TITLE)
    }

    fn app_tagline(&self) -> Locator {
        self.screen.find_by_tag(APP_TAGLINE)
    }

    pub async fn enter_username(&self, username: &str) -> Result<&Self, SuiteError> {
        self.screen
            .reporter()
            .info(&format!("Entering username: '{username}'"));
        let field = self.username_field();
        self.screen.clear_text(&field).await?;
        self.screen.type_text(&field, username).await?;
        Ok(self)
    }

    pub async fn enter_password(&self, password: &str) -> Result<&Self, SuiteError> {
        let masked = "*".repeat(password.chars().count());
        self.screen
            .reporter()
            .info(&format!("Entering password: '{masked}'"));
        let field = self.password_field();
        self.screen.clear_text(&field).await?;
        self.screen.type_text(&field, password).await?;
        Ok(self)
    }

    pub async fn click_login(&self) -> Result<&Self, SuiteError> {
        self.screen.reporter().info("Clicking login button");
        self.screen.click(&self.login_button()).await?;
        Ok(self)
    }

    /// Submits the credentials and waits for the app to either show the
    /// profiles screen or the login error.
    pub async fn login(self, username: &str, password: &str) -> Result<LoginOutcome, SuiteError> {
        self.screen
            .reporter()
            .info(&format!("Attempting login with username: '{username}'"));
        self.enter_username(username).await?;
        self.enter_password(password).await?;
        self.click_login().await?;

        let screen = &self.screen;
        let destination = screen.find_by_tag(DESTINATION_MARKER);
        let error = self.error_message();
        let (destination, error) = (&destination, &error);
        screen
            .wait_until("login outcome", screen.config().login_timeout(), move || async move {
                screen.is_displayed(destination).await || screen.is_displayed(error).await
            })
            .await?;

        if screen.is_displayed(destination).await {
            screen
                .reporter()
                .info("Login successful - navigating to Profiles Page");
            Ok(LoginOutcome::LoggedIn(ProfilesPage::new(self.screen)))
        } else {
            screen.reporter().info("Login failed - remaining on Login Page");
            Ok(LoginOutcome::Rejected(self))
        }
    }

    /// Submits credentials expected to be refused, then waits (silently,
    /// bounded by the login timeout) for the error marker.
    pub async fn attempt_invalid_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<&Self, SuiteError> {
        self.screen.reporter().info("Attempting invalid login");
        self.enter_username(username).await?;
        self.enter_password(password).await?;
        self.click_login().await?;
        self.screen
            .wait_for(&self.error_message(), self.screen.config().login_timeout())
            .await;
        Ok(self)
    }

    pub async fn verify_login_screen_displayed(&self) -> Result<&Self, SuiteError> {
        self.screen.reporter().info("Verifying login screen is displayed");
        for locator in [
            self.app_title(),
            self.app_tagline(),
            self.username_field(),
            self.password_field(),
            self.login_button(),
        ] {
            self.screen.assert_displayed(&locator).await?;
        }
        self.screen.reporter().info("✓ Login screen verified");
        Ok(self)
    }

    pub async fn verify_username_field_displayed(&self) -> Result<&Self, SuiteError> {
        self.screen
            .reporter()
            .info("Verifying username field is displayed");
        self.screen.assert_displayed(&self.username_field()).await?;
        self.screen.reporter().info("✓ Username field verified");
        Ok(self)
    }

    pub async fn verify_password_field_displayed(&self) -> Result<&Self, SuiteError> {
        self.screen
            .reporter()
            .info("Verifying password field is displayed");
        self.screen.assert_displayed(&self.password_field()).await?;
        self.screen.reporter().info("✓ Password field verified");
        Ok(self)
    }

    pub async fn verify_login_button_displayed(&self) -> Result<&Self, SuiteError> {
        self.screen
            .reporter()
            .info("Verifying login button is displayed");
        self.screen.assert_displayed(&self.login_button()).await?;
        self.screen.reporter().info("✓ Login button verified");
        Ok(self)
    }

    pub async fn verify_error_markers_displayed(&self) -> Result<&Self, SuiteError> {
        self.screen
            .reporter()
            .info("Verifying error markers are displayed");
        match self.screen.assert_displayed(&self.error_message()).await {
            Ok(()) => {
                self.screen.reporter().info("✓ Error markers verified");
                Ok(self)
            }
            Err(_) => {
                self.screen.reporter().error("✗ Error markers not found");
                Err(SuiteError::AssertionFailed(
                    "Error markers not displayed after invalid login".to_string(),
                ))
            }
        }
    }

    pub async fn username_text(&self) -> String {
        self.screen.get_text(&self.username_field()).await
    }

    pub async fn password_text(&self) -> String {
        self.screen.get_text(&self.password_field()).await
    }

    pub async fn verify_username_text(&self, expected: &str) -> Result<&Self, SuiteError> {
        let actual = self.username_text().await;
        if actual == expected {
            self.screen
                .reporter()
                .info(&format!("✓ Username field holds '{actual}'"));
            Ok(self)
        } else {
            Err(SuiteError::AssertionFailed(format!(
                "Expected username field to hold '{expected}', but found '{actual}'"
            )))
        }
    }
}
