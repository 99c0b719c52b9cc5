use crate::error::SuiteError;
use crate::fixtures::{invalid, valid};
use crate::harness::{Feature, Scenario, ScenarioContext};

pub(super) fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new("login_screen_displayed", Feature::Login, |ctx| {
            Box::pin(login_screen_displayed(ctx))
        }),
        Scenario::new("login_fails_with_wrong_username", Feature::Login, |ctx| {
            Box::pin(login_fails_with_wrong_username(ctx))
        }),
        Scenario::new("login_fails_with_wrong_password", Feature::Login, |ctx| {
            Box::pin(login_fails_with_wrong_password(ctx))
        }),
        Scenario::new("login_fails_with_wrong_credentials", Feature::Login, |ctx| {
            Box::pin(login_fails_with_wrong_credentials(ctx))
        }),
        Scenario::new("login_fails_with_empty_fields", Feature::Login, |ctx| {
            Box::pin(login_fails_with_empty_fields(ctx))
        }),
        Scenario::new("successful_login", Feature::Login, |ctx| {
            Box::pin(successful_login(ctx))
        }),
        Scenario::new("username_field_accepts_input", Feature::Login, |ctx| {
            Box::pin(username_field_accepts_input(ctx))
        }),
        Scenario::new("password_field_accepts_input", Feature::Login, |ctx| {
            Box::pin(password_field_accepts_input(ctx))
        }),
        Scenario::new("login_button_is_visible", Feature::Login, |ctx| {
            Box::pin(login_button_is_visible(ctx))
        }),
        Scenario::new("username_field_is_visible", Feature::Login, |ctx| {
            Box::pin(username_field_is_visible(ctx))
        }),
        Scenario::new("password_field_is_visible", Feature::Login, |ctx| {
            Box::pin(password_field_is_visible(ctx))
        }),
        Scenario::new("clear_and_reenter_username", Feature::Login, |ctx| {
            Box::pin(clear_and_reenter_username(ctx))
        }),
    ]
}

async fn login_screen_displayed(ctx: ScenarioContext) -> Result<(), SuiteError> {
    ctx.log_step("Given: User opens app for the first time");
    let login = ctx.login_page();

    ctx.log_step("When: App is launched");
    ctx.log_step(
        "Then: Login screen with username, password fields and login button is displayed",
    );
    login.verify_login_screen_displayed().await?;
    Ok(())
}

/// Shared body of the rejected-credentials scenarios.
async fn rejects(
    ctx: ScenarioContext,
    when: &str,
    username: &str,
    password: &str,
) -> Result<(), SuiteError> {
    ctx.log_step("Given: User is on login screen");
    let login = ctx.login_page();

    ctx.log_step(when);
    login.attempt_invalid_login(username, password).await?;

    ctx.log_step("Then: Error markers are displayed");
    login.verify_error_markers_displayed().await?;
    Ok(())
}

async fn login_fails_with_wrong_username(ctx: ScenarioContext) -> Result<(), SuiteError> {
    rejects(
        ctx,
        "When: User enters wrong username and correct password",
        invalid::WRONG_USERNAME,
        valid::PASSWORD,
    )
    .await
}

async fn login_fails_with_wrong_password(ctx: ScenarioContext) -> Result<(), SuiteError> {
    rejects(
        ctx,
        "When: User enters correct username and wrong password",
        valid::USERNAME,
        invalid::WRONG_PASSWORD,
    )
    .await
}

async fn login_fails_with_wrong_credentials(ctx: ScenarioContext) -> Result<(), SuiteError> {
    rejects(
        ctx,
        "When: User enters wrong username and wrong password",
        invalid::WRONG_USERNAME,
        invalid::WRONG_PASSWORD,
    )
    .await
}

async fn login_fails_with_empty_fields(ctx: ScenarioContext) -> Result<(), SuiteError> {
    rejects(
        ctx,
        "When: User leaves fields empty and clicks login",
        invalid::EMPTY_USERNAME,
        invalid::EMPTY_PASSWORD,
    )
    .await
}

async fn successful_login(ctx: ScenarioContext) -> Result<(), SuiteError> {
    ctx.log_step("Given: User is on login screen");
    let login = ctx.login_page();

    ctx.log_step("When: User enters correct credentials and clicks login");
    let profiles = login
        .login(valid::USERNAME, valid::PASSWORD)
        .await?
        .profiles()?;

    ctx.log_step("Then: User is taken to profiles screen");
    profiles.verify_profile_displayed().await?;
    Ok(())
}

async fn username_field_accepts_input(ctx: ScenarioContext) -> Result<(), SuiteError> {
    ctx.log_step("Given: User is on login screen");
    let login = ctx.login_page();

    ctx.log_step("When: User types in username field");
    login.enter_username(valid::USERNAME).await?;

    ctx.log_step("Then: Text is entered successfully");
    login
        .verify_username_field_displayed()
        .await?
        .verify_username_text(valid::USERNAME)
        .await?;
    Ok(())
}

async fn password_field_accepts_input(ctx: ScenarioContext) -> Result<(), SuiteError> {
    ctx.log_step("Given: User is on login screen");
    let login = ctx.login_page();

    ctx.log_step("When: User types in password field");
    login.enter_password(valid::PASSWORD).await?;

    ctx.log_step("Then: Text is entered successfully");
    login.verify_password_field_displayed().await?;
    Ok(())
}

async fn login_button_is_visible(ctx: ScenarioContext) -> Result<(), SuiteError> {
    ctx.log_step("Given: User is on login screen");
    let login = ctx.login_page();

    ctx.log_step("Then: Login button is visible");
    login.verify_login_button_displayed().await?;
    Ok(())
}

async fn username_field_is_visible(ctx: ScenarioContext) -> Result<(), SuiteError> {
    ctx.log_step("Given: User is on login screen");
    let login = ctx.login_page();

    ctx.log_step("Then: Username field is visible");
    login.verify_username_field_displayed().await?;
    Ok(())
}

async fn password_field_is_visible(ctx: ScenarioContext) -> Result<(), SuiteError> {
    ctx.log_step("Given: User is on login screen");
    let login = ctx.login_page();

    ctx.log_step("Then: Password field is visible");
    login.verify_password_field_displayed().await?;
    Ok(())
}

async fn clear_and_reenter_username(ctx: ScenarioContext) -> Result<(), SuiteError> {
    ctx.log_step("Given: User has entered username");
    let login = ctx.login_page();
    login.enter_username(valid::FIRST_USER).await?;

    ctx.log_step("When: User clears and re-enters different username");
    login.enter_username(valid::SECOND_USER).await?;

    ctx.log_step("Then: New username is set");
    login
        .verify_username_field_displayed()
        .await?
        .verify_username_text(valid::SECOND_USER)
        .await?;
    Ok(())
}
