//! Team actions: the payloads carried by links.
//!
//! Each link in a team graph carries exactly one CBOR-encoded action whose
//! variant matches the link's [`LinkKind`].

use serde::{Deserialize, Serialize};

use sigchain_core::{Link, LinkKind, UserId};

use crate::error::{from_cbor, to_cbor, Result, TeamError};
use crate::invitation::{Invitation, ProofOfInvitation};
use crate::lockbox::Lockbox;
use crate::role::Role;
use crate::user::{Device, User};

/// A change to team state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamAction {
    /// Founds the team. The founder becomes a member with the admin role.
    Root {
        team_name: String,
        founder: User,
        device: Device,
        lockboxes: Vec<Lockbox>,
    },
    AddMember {
        user: User,
        lockboxes: Vec<Lockbox>,
    },
    RemoveMember {
        user_id: UserId,
    },
    AddDevice {
        device: Device,
    },
    AddRole {
        role: Role,
        /// The new role key, sealed to every admin.
        lockboxes: Vec<Lockbox>,
    },
    RemoveRole {
        role_name: String,
    },
    AddMemberRole {
        user_id: UserId,
        role_name: String,
        lockboxes: Vec<Lockbox>,
    },
    RemoveMemberRole {
        user_id: UserId,
        role_name: String,
    },
    InviteMember {
        invitation: Invitation,
    },
    InviteDevice {
        invitation: Invitation,
    },
    RevokeInvitation {
        id: String,
    },
    AdmitMember {
        proof: ProofOfInvitation,
        user: User,
        lockboxes: Vec<Lockbox>,
    },
    AdmitDevice {
        proof: ProofOfInvitation,
        device: Device,
    },
}

impl TeamAction {
    /// The link kind this action is recorded under.
    pub fn kind(&self) -> LinkKind {
        match self {
            TeamAction::Root { .. } => LinkKind::Root,
            TeamAction::AddMember { .. } => LinkKind::AddMember,
            TeamAction::RemoveMember { .. } => LinkKind::RemoveMember,
            TeamAction::AddDevice { .. } => LinkKind::AddDevice,
            TeamAction::AddRole { .. } => LinkKind::AddRole,
            TeamAction::RemoveRole { .. } => LinkKind::RemoveRole,
            TeamAction::AddMemberRole { .. } => LinkKind::AddMemberRole,
            TeamAction::RemoveMemberRole { .. } => LinkKind::RemoveMemberRole,
            TeamAction::InviteMember { .. } => LinkKind::InviteMember,
            TeamAction::InviteDevice { .. } => LinkKind::InviteDevice,
            TeamAction::RevokeInvitation { .. } => LinkKind::RevokeInvitation,
            TeamAction::AdmitMember { .. } => LinkKind::AdmitMember,
            TeamAction::AdmitDevice { .. } => LinkKind::AdmitDevice,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        to_cbor(self)
    }

    /// Decode the action carried by `link`, checking it matches the link kind.
    pub fn from_link(link: &Link) -> Result<Self> {
        let action: TeamAction = from_cbor(&link.payload)?;
        if action.kind() != link.kind() {
            return Err(TeamError::InvalidAction(format!(
                "payload is {:?} but link kind is {:?}",
                action.kind(),
                link.kind()
            )));
        }
        Ok(action)
    }
}
