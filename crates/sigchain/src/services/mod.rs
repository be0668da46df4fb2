//! Domain services over a [`SigChain`](crate::SigChain).
//!
//! Each service is a borrowed view that translates the application's
//! vocabulary (users, channels, invites) into team operations.

pub mod channels;
pub mod crypto;
pub mod devices;
pub mod invites;
pub mod roles;
pub mod users;

pub use channels::{Channel, ChannelService, CHANNEL_ROLE_PREFIX};
pub use crypto::{
    CryptoService, EncryptedAndSignedPayload, EncryptedPayload, EncryptionScope,
    EncryptionScopeType,
};
pub use devices::DeviceService;
pub use invites::{InviteService, DEFAULT_INVITATION_VALID_FOR_MS, DEFAULT_MAX_USES};
pub use roles::{RoleService, RoleView, MODIFIABLE_MEMBERSHIP};
pub use users::{ProspectiveUser, UserService};
