use std::time::Duration;

use tokio::time::Instant;

use crate::error::SuiteError;
use crate::fixtures::{counts, timeouts, valid};
use crate::harness::{Feature, Scenario, ScenarioContext};
use crate::pages::{ProfilesPage, StopReason};

pub(super) fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new("profiles_displayed_after_login", Feature::Profiles, |ctx| {
            Box::pin(profiles_displayed_after_login(ctx))
        }),
        Scenario::new("like_and_pass_buttons_visible", Feature::Profiles, |ctx| {
            Box::pin(like_and_pass_buttons_visible(ctx))
        }),
        Scenario::new("user_can_like_profile", Feature::Profiles, |ctx| {
            Box::pin(user_can_like_profile(ctx))
        }),
        Scenario::new("user_can_pass_profile", Feature::Profiles, |ctx| {
            Box::pin(user_can_pass_profile(ctx))
        }),
        Scenario::new(
            "liking_multiple_profiles_shows_correct_count",
            Feature::Profiles,
            |ctx| Box::pin(liking_multiple_profiles_shows_correct_count(ctx)),
        ),
        Scenario::new("mix_of_likes_and_passes", Feature::Profiles, |ctx| {
            Box::pin(mix_of_likes_and_passes(ctx))
        }),
        Scenario::new("retry_after_network_error", Feature::Profiles, |ctx| {
            Box::pin(retry_after_network_error(ctx))
        }),
        Scenario::new("profiles_load_quickly", Feature::Profiles, |ctx| {
            Box::pin(profiles_load_quickly(ctx))
        }),
    ]
}

async fn login_to_app(ctx: &ScenarioContext) -> Result<ProfilesPage, SuiteError> {
    ctx.login_page()
        .login(valid::USERNAME, valid::PASSWORD)
        .await?
        .profiles()
}

/// After a single swipe the feed must show either the next card or its end.
async fn expect_next_card_or_end(
    profiles: &ProfilesPage,
    action: &str,
) -> Result<(), SuiteError> {
    if profiles.is_profile_displayed().await || profiles.is_finished_state_displayed().await {
        Ok(())
    } else {
        Err(SuiteError::AssertionFailed(format!(
            "After {action}, should show next profile or finished state"
        )))
    }
}

async fn profiles_displayed_after_login(ctx: ScenarioContext) -> Result<(), SuiteError> {
    ctx.log_step("Given: User successfully logged in");
    let profiles = login_to_app(&ctx).await?;

    ctx.log_step("When: Profiles page loads");
    ctx.log_step("Then: Profiles are displayed with like and pass buttons");
    profiles.verify_profiles_loaded().await?;
    Ok(())
}

async fn like_and_pass_buttons_visible(ctx: ScenarioContext) -> Result<(), SuiteError> {
    ctx.log_step("Given: User logged in and profiles loaded");
    let profiles = login_to_app(&ctx).await?;
    profiles
        .wait_for_profiles_to_load(ctx.config().default_wait())
        .await;

    ctx.log_step("Then: Like and Pass buttons are visible");
    profiles
        .verify_like_button_enabled()
        .await?
        .verify_pass_button_enabled()
        .await?;
    Ok(())
}

async fn user_can_like_profile(ctx: ScenarioContext) -> Result<(), SuiteError> {
    ctx.log_step("Given: Profile is displayed");
    let profiles = login_to_app(&ctx).await?;
    profiles.verify_profile_displayed().await?;

    ctx.log_step("When: User clicks like button");
    let name = profiles.profile_name_text().await;
    ctx.reporter().info(&format!("Liking profile: {name}"));
    profiles.like_profile().await?;
    ctx.wait_for_idle().await?;

    ctx.log_step("Then: Next profile loads or finished state shows");
    expect_next_card_or_end(&profiles, "liking").await
}

async fn user_can_pass_profile(ctx: ScenarioContext) -> Result<(), SuiteError> {
    ctx.log_step("Given: Profile is displayed");
    let profiles = login_to_app(&ctx).await?;
    profiles.verify_profile_displayed().await?;

    ctx.log_step("When: User clicks pass button");
    let name = profiles.profile_name_text().await;
    ctx.reporter().info(&format!("Passing on profile: {name}"));
    profiles.pass_profile().await?;
    ctx.wait_for_idle().await?;

    ctx.log_step("Then: Next profile loads or finished state shows");
    expect_next_card_or_end(&profiles, "passing").await
}

async fn liking_multiple_profiles_shows_correct_count(
    ctx: ScenarioContext,
) -> Result<(), SuiteError> {
    ctx.log_step("Given: Dating profiles are successfully loaded");
    let profiles = login_to_app(&ctx).await?;
    profiles.verify_profiles_loaded().await?;

    ctx.log_step("When: User likes multiple profiles");
    let run = profiles
        .like_multiple_profiles(counts::PROFILES_TO_LIKE)
        .await;
    if let StopReason::Interrupted(reason) = &run.stop {
        return Err(SuiteError::AssertionFailed(format!(
            "Liking stopped after {} of {} profiles: {reason}",
            run.liked, run.requested
        )));
    }

    ctx.log_step("Then: Correct count is displayed");
    if profiles.is_finished_state_displayed().await {
        profiles.verify_likes_count(run.liked).await?;
    }
    Ok(())
}

async fn mix_of_likes_and_passes(ctx: ScenarioContext) -> Result<(), SuiteError> {
    ctx.log_step("Given: Profiles are loaded");
    let profiles = login_to_app(&ctx).await?;

    ctx.log_step("When: User likes 3 profiles and passes 2 profiles");
    profiles
        .like_and_pass_profiles(counts::LIKES_FOR_MIX_TEST, counts::PASSES_FOR_MIX_TEST)
        .await?;
    ctx.wait_for_idle().await?;

    ctx.log_step("Then: Correct counts are shown in finished state");
    if profiles.is_finished_state_displayed().await {
        profiles.verify_finished_state_displayed().await?;
        ctx.reporter().info("Finished state displayed with counts");
    }
    Ok(())
}

async fn retry_after_network_error(ctx: ScenarioContext) -> Result<(), SuiteError> {
    ctx.log_step("Given: Error state is displayed");
    let profiles = login_to_app(&ctx).await?;

    if !profiles.is_error_state_displayed().await {
        ctx.reporter()
            .warn("Error state not present - skipping retry test");
        return Ok(());
    }

    ctx.log_step("When: User clicks Retry button");
    profiles.click_retry().await?;
    ctx.wait_for_idle().await?;
    profiles
        .wait_for_profiles_to_load(ctx.config().default_wait())
        .await;

    ctx.log_step("Then: Profiles load successfully");
    profiles.verify_profiles_loaded().await?;
    ctx.reporter().info("✓ Retry successful - profiles loaded");
    Ok(())
}

async fn profiles_load_quickly(ctx: ScenarioContext) -> Result<(), SuiteError> {
    let budget = Duration::from_millis(timeouts::PROFILES_LOAD_BUDGET_MS);

    ctx.log_step("Given: User logged in");
    let start = Instant::now();
    let profiles = login_to_app(&ctx).await?;

    ctx.log_step("When: Profiles are loading");
    profiles
        .wait_for_profiles_to_load(Duration::from_millis(timeouts::MEDIUM_TIMEOUT_MS))
        .await;
    let load_ms = start.elapsed().as_millis() as u64;

    ctx.log_step("Then: Profiles load within 5 seconds");
    if load_ms >= budget.as_millis() as u64 {
        return Err(SuiteError::AssertionFailed(format!(
            "Profiles took {load_ms}ms to load, expected < {}ms",
            budget.as_millis()
        )));
    }
    ctx.reporter().info(&format!(
        "✓ Profiles loaded in {load_ms}ms (within acceptable time)"
    ));
    Ok(())
}
