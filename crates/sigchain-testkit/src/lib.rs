//! # Sigchain Testkit
//!
//! Testing utilities for sigchain.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: Ready-made users, teams and registries
//! - **Generators**: Proptest strategies for names and key material
//! - **Tracing**: A test-friendly subscriber, see [`init_tracing`]
//!
//! ## Test Fixtures
//!
//! ```rust
//! use sigchain_testkit::fixtures::TeamFixture;
//!
//! let fixture = TeamFixture::new("spacecraft");
//! let bob = fixture.admit("bob");
//! assert!(fixture.chain.team().has(&bob.user.user_id));
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use sigchain_testkit::generators::team_name;
//!
//! proptest! {
//!     #[test]
//!     fn names_are_accepted(name in team_name()) {
//!         prop_assert!(sigchain::validate_name(&name, 255).is_ok());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{context, init_tracing, memory_service, TeamFixture};
pub use generators::{invalid_team_name, team_name, user_name};
