//! Proptest generators for property-based testing.

use proptest::prelude::*;

/// A team name the registry accepts.
pub fn team_name() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9][a-zA-Z0-9 _.-]{0,30}[a-zA-Z0-9]"
}

/// A team name the registry rejects.
pub fn invalid_team_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[a-z]{1,10}".prop_map(|n| format!(" {}", n)),
        "[a-z]{1,10}".prop_map(|n| format!("{}\t", n)),
        "[a-z]{1,10}".prop_map(|n| format!("{}\u{0}{}", n, n)),
        "[a-z]{300,310}",
    ]
}

/// A display name for a user.
pub fn user_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,15}"
}
