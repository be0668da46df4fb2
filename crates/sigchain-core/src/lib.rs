//! # Sigchain Core
//!
//! Pure primitives for sigchain: signed links, the team graph, and
//! canonicalization.
//!
//! This crate contains no I/O and no storage. It is pure computation over
//! signed, content-addressed data structures.
//!
//! ## Key Types
//!
//! - [`Link`] - One signed action in a team's history
//! - [`LinkId`] - Content-addressed identifier (Blake3 hash)
//! - [`TeamGraph`] - The ordered, append-only log of links for one team
//! - [`LinkKind`] - Discriminator for payload interpretation
//!
//! ## Canonicalization
//!
//! Link headers are encoded using deterministic CBOR. See [`canonical`] module.

pub mod canonical;
pub mod crypto;
pub mod error;
pub mod graph;
pub mod link;
pub mod types;
pub mod validation;

pub use canonical::{canonical_bytes, canonical_header_bytes};
pub use crypto::{Blake3Hash, Ed25519PublicKey, Ed25519Signature, Keypair};
pub use error::{CoreError, ValidationError};
pub use graph::TeamGraph;
pub use link::{Link, LinkBuilder, LinkHeader, LinkKind};
pub use types::{now_millis, LinkId, UserId};
pub use validation::{validate_link, validate_successor};
