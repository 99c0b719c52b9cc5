//! The registered scenarios, grouped by feature.

mod login;
mod profiles;

use crate::harness::Scenario;

/// Every scenario, login flows first.
pub fn all() -> Vec<Scenario> {
    let mut scenarios = login::scenarios();
    scenarios.extend(profiles::scenarios());
    scenarios
}
