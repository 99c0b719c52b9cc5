//! Static test data: credentials, counts and timeouts the scenarios share.

/// Credentials the app under test accepts.
pub mod valid {
    pub const USERNAME: &str = "user";
    pub const PASSWORD: &str = "password";
    pub const FIRST_USER: &str = "first_user";
    pub const SECOND_USER: &str = "second_user";
}

/// Credentials the app under test rejects.
pub mod invalid {
    pub const WRONG_USERNAME: &str = "wrong_user";
    pub const WRONG_PASSWORD: &str = "wrong_pass";
    pub const EMPTY_USERNAME: &str = "";
    pub const EMPTY_PASSWORD: &str = "";
}

/// How many profiles the swiping scenarios act on.
pub mod counts {
    pub const PROFILES_TO_LIKE: usize = 5;
    pub const PROFILES_TO_PASS: usize = 2;
    pub const LIKES_FOR_MIX_TEST: usize = 3;
    pub const PASSES_FOR_MIX_TEST: usize = 2;
}

/// Scenario-level time limits, in milliseconds.
pub mod timeouts {
    pub const MEDIUM_TIMEOUT_MS: u64 = 5_000;
    /// Upper bound for the first profile card to appear after login.
    pub const PROFILES_LOAD_BUDGET_MS: u64 = 5_000;
}

/// Fixed strings rendered by the app.
pub mod texts {
    pub const FINISHED: &str = "You're all caught up!";
    pub const LIKES_PREFIX: &str = "Liked:";
}
