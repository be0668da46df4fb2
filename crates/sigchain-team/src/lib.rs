//! # Sigchain Team
//!
//! Team semantics on top of the signed graph in `sigchain-core`: members
//! and devices, roles, invitations, and the keys that let members encrypt
//! for the team, for a role, or for each other.
//!
//! ## Key Types
//!
//! - [`Team`] - A team graph bound to the local user and their keyring
//! - [`TeamState`] - State replayed and authorized link by link
//! - [`TeamAction`] - The payload carried by each link
//! - [`Keyring`] - Symmetric scope keys held locally
//! - [`Lockbox`] - A scope key sealed to one member's encryption key
//!
//! ## Invitations
//!
//! Invitations are derived from a seed shared out of band. See the
//! [`invitation`] module.

pub mod action;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod invitation;
pub mod keyring;
pub mod lockbox;
pub mod role;
pub mod state;
pub mod team;
pub mod user;

pub use action::TeamAction;
pub use crypto::{EncryptionKey, X25519PublicKey, X25519StaticSecret};
pub use envelope::{EncryptedEnvelope, SignatureAuthor, SignedEnvelope};
pub use error::{Result, TeamError};
pub use invitation::{
    generate_proof, generate_seed, normalize_seed, Invitation, InvitationState, InviteOptions,
    InviteResult, ProofOfInvitation,
};
pub use keyring::{KeyScope, Keyring, ScopedKey};
pub use lockbox::Lockbox;
pub use role::{PermissionsMap, Role, ADMIN, MEMBER};
pub use state::{Member, MemberSearchOptions, TeamState};
pub use team::Team;
pub use user::{
    create_device, create_user, Device, DeviceWithSecrets, Keyset, KeysetWithSecrets,
    LocalUserContext, User, UserWithSecrets,
};
