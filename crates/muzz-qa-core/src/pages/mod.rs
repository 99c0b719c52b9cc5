//! Page objects for the app's two screens.
//!
//! A page holds nothing but a [`Screen`](crate::locator::Screen); its
//! identity is its type. Actions and verifications that stay on the screen
//! return `&Self` so they chain, and navigation consumes the page and
//! returns the next one.

mod login;
mod profiles;

pub use login::{LoginOutcome, LoginPage};
pub use profiles::{parse_likes_count, LikeRun, ProfilesPage, StopReason};
