//! Team state computation.
//!
//! Team state is computed by replaying the links of a team graph in order.
//! Every link is authorized against the state produced by the links before
//! it, so a graph containing an action its author was not entitled to take
//! fails to replay.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use sigchain_core::{Ed25519PublicKey, Link, TeamGraph, UserId};

use crate::action::TeamAction;
use crate::crypto::X25519PublicKey;
use crate::error::{Result, TeamError};
use crate::invitation::{InvitationState, ProofOfInvitation};
use crate::lockbox::Lockbox;
use crate::role::{Role, ADMIN};
use crate::user::{Device, Keyset, User};

/// A team member and everything the graph says about them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: UserId,
    pub user_name: String,
    pub keys: Keyset,
    pub roles: BTreeSet<String>,
    pub devices: Vec<Device>,
}

impl Member {
    fn from_user(user: User) -> Self {
        Self {
            user_id: user.user_id,
            user_name: user.user_name,
            keys: user.keys,
            roles: BTreeSet::new(),
            devices: Vec::new(),
        }
    }

    pub fn has_role(&self, role_name: &str) -> bool {
        self.roles.contains(role_name)
    }
}

/// How to look members up by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberSearchOptions {
    /// Also return members that have been removed.
    pub include_removed: bool,
    /// Fail when an id matches no member instead of skipping it.
    pub fail_on_missing: bool,
}

impl Default for MemberSearchOptions {
    fn default() -> Self {
        Self {
            include_removed: false,
            fail_on_missing: true,
        }
    }
}

/// Aggregated team state.
///
/// Built by replaying every link of a [`TeamGraph`].
#[derive(Debug, Clone, Default)]
pub struct TeamState {
    team_name: String,

    /// Current members indexed by user id.
    members: BTreeMap<UserId, Member>,

    /// Members that were removed, kept for historical lookups.
    removed: BTreeMap<UserId, Member>,

    roles: BTreeMap<String, Role>,

    invitations: BTreeMap<String, InvitationState>,

    lockboxes: Vec<Lockbox>,

    /// Index: signing key -> current member.
    by_signing_key: HashMap<Ed25519PublicKey, UserId>,
}

impl TeamState {
    /// Replay a whole graph.
    pub fn replay(graph: &TeamGraph) -> Result<Self> {
        let mut state = TeamState::default();
        for (_, link) in graph.iter() {
            state.apply_link(link)?;
        }
        if state.team_name != graph.team_name() {
            return Err(TeamError::InvalidAction(format!(
                "graph is labelled {:?} but its root founds {:?}",
                graph.team_name(),
                state.team_name
            )));
        }
        Ok(state)
    }

    /// Authorize and apply one link.
    ///
    /// On error the state is left unchanged.
    pub fn apply_link(&mut self, link: &Link) -> Result<()> {
        let action = TeamAction::from_link(link)?;
        self.authorize(link, &action)?;
        self.apply(action, link.timestamp())
    }

    // ────────────────────────────────────────────────────────────────────────
    // Authorization
    // ────────────────────────────────────────────────────────────────────────

    fn authorize(&self, link: &Link, action: &TeamAction) -> Result<()> {
        if let TeamAction::Root { founder, .. } = action {
            if !self.team_name.is_empty() || !self.members.is_empty() {
                return Err(TeamError::InvalidAction("second root link".into()));
            }
            if founder.keys.signature != *link.author() {
                return Err(TeamError::PermissionDenied(
                    "root must be signed by the founder".into(),
                ));
            }
            return Ok(());
        }

        let author = self.member_by_signing_key(link.author()).ok_or_else(|| {
            TeamError::PermissionDenied(format!("{:?} is not a team member", link.author()))
        })?;
        let is_admin = author.has_role(ADMIN);

        let allowed = match action {
            TeamAction::Root { .. } => false,
            TeamAction::AddDevice { device } => device.user_id == author.user_id,
            TeamAction::RemoveMemberRole { user_id, .. } => is_admin || *user_id == author.user_id,
            TeamAction::InviteDevice { invitation } => {
                is_admin || invitation.user_id.as_ref() == Some(&author.user_id)
            }
            TeamAction::AdmitDevice { device, .. } => is_admin || device.user_id == author.user_id,
            TeamAction::AddMember { .. }
            | TeamAction::RemoveMember { .. }
            | TeamAction::AddRole { .. }
            | TeamAction::RemoveRole { .. }
            | TeamAction::AddMemberRole { .. }
            | TeamAction::InviteMember { .. }
            | TeamAction::RevokeInvitation { .. }
            | TeamAction::AdmitMember { .. } => is_admin,
        };

        if allowed {
            Ok(())
        } else {
            Err(TeamError::PermissionDenied(format!(
                "{} may not perform {:?}",
                author.user_id,
                link.kind()
            )))
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Application
    // ────────────────────────────────────────────────────────────────────────

    fn apply(&mut self, action: TeamAction, timestamp: i64) -> Result<()> {
        match action {
            TeamAction::Root {
                team_name,
                founder,
                device,
                lockboxes,
            } => {
                if device.user_id != founder.user_id {
                    return Err(TeamError::InvalidAction(
                        "founding device belongs to another user".into(),
                    ));
                }
                let mut member = Member::from_user(founder);
                member.roles.insert(ADMIN.to_string());
                member.devices.push(device);

                self.team_name = team_name;
                self.roles.insert(ADMIN.to_string(), Role::new(ADMIN));
                self.insert_member(member)?;
                self.lockboxes.extend(lockboxes);
            }
            TeamAction::AddMember { user, lockboxes } => {
                self.insert_member(Member::from_user(user))?;
                self.lockboxes.extend(lockboxes);
            }
            TeamAction::RemoveMember { user_id } => {
                let member = self
                    .members
                    .remove(&user_id)
                    .ok_or_else(|| TeamError::MemberNotFound(user_id.to_string()))?;
                if member.has_role(ADMIN) && self.admin_count() == 0 {
                    self.members.insert(user_id, member);
                    return Err(TeamError::InvalidAction(
                        "cannot remove the last admin".into(),
                    ));
                }
                self.by_signing_key.remove(&member.keys.signature);
                self.removed.insert(user_id, member);
            }
            TeamAction::AddDevice { device } => {
                let member = self.member_mut(&device.user_id)?;
                member.devices.push(device);
            }
            TeamAction::AddRole { role, lockboxes } => {
                if self.roles.contains_key(&role.role_name) {
                    return Err(TeamError::RoleExists(role.role_name));
                }
                self.roles.insert(role.role_name.clone(), role);
                self.lockboxes.extend(lockboxes);
            }
            TeamAction::RemoveRole { role_name } => {
                if role_name == ADMIN {
                    return Err(TeamError::InvalidAction(
                        "the admin role cannot be removed".into(),
                    ));
                }
                if self.roles.remove(&role_name).is_none() {
                    return Err(TeamError::RoleNotFound(role_name));
                }
                for member in self.members.values_mut() {
                    member.roles.remove(&role_name);
                }
            }
            TeamAction::AddMemberRole {
                user_id,
                role_name,
                lockboxes,
            } => {
                if !self.roles.contains_key(&role_name) {
                    return Err(TeamError::RoleNotFound(role_name));
                }
                self.member_mut(&user_id)?.roles.insert(role_name);
                self.lockboxes.extend(lockboxes);
            }
            TeamAction::RemoveMemberRole { user_id, role_name } => {
                if role_name == ADMIN {
                    let is_admin = self.member(&user_id).map(|m| m.has_role(ADMIN));
                    if is_admin == Some(true) && self.admin_count() == 1 {
                        return Err(TeamError::InvalidAction(
                            "cannot remove the last admin".into(),
                        ));
                    }
                }
                self.member_mut(&user_id)?.roles.remove(&role_name);
            }
            TeamAction::InviteMember { invitation } | TeamAction::InviteDevice { invitation } => {
                if self.invitations.contains_key(&invitation.id) {
                    return Err(TeamError::InvalidAction(format!(
                        "invitation {} already exists",
                        invitation.id
                    )));
                }
                self.invitations
                    .insert(invitation.id.clone(), InvitationState::new(invitation));
            }
            TeamAction::RevokeInvitation { id } => {
                let invitation = self
                    .invitations
                    .get_mut(&id)
                    .ok_or(TeamError::InvitationNotFound(id))?;
                invitation.revoked = true;
            }
            TeamAction::AdmitMember {
                proof,
                user,
                lockboxes,
            } => {
                let invitation = self.validate_invitation(&proof, timestamp)?;
                if invitation.invitation.user_id.is_some() {
                    return Err(TeamError::InvalidAction(format!(
                        "invitation {} is for a device",
                        proof.id
                    )));
                }
                self.insert_member(Member::from_user(user))?;
                self.use_invitation(&proof.id);
                self.lockboxes.extend(lockboxes);
            }
            TeamAction::AdmitDevice { proof, device } => {
                let invitation = self.validate_invitation(&proof, timestamp)?;
                if invitation.invitation.user_id.as_ref() != Some(&device.user_id) {
                    return Err(TeamError::InvalidAction(format!(
                        "invitation {} is not for a device of {}",
                        proof.id, device.user_id
                    )));
                }
                self.member_mut(&device.user_id)?.devices.push(device);
                self.use_invitation(&proof.id);
            }
        }
        Ok(())
    }

    fn insert_member(&mut self, member: Member) -> Result<()> {
        if self.members.contains_key(&member.user_id)
            || self.by_signing_key.contains_key(&member.keys.signature)
        {
            return Err(TeamError::MemberExists(member.user_id.to_string()));
        }
        self.by_signing_key
            .insert(member.keys.signature, member.user_id.clone());
        self.members.insert(member.user_id.clone(), member);
        Ok(())
    }

    fn member_mut(&mut self, user_id: &UserId) -> Result<&mut Member> {
        self.members
            .get_mut(user_id)
            .ok_or_else(|| TeamError::MemberNotFound(user_id.to_string()))
    }

    fn use_invitation(&mut self, id: &str) {
        if let Some(invitation) = self.invitations.get_mut(id) {
            invitation.uses += 1;
        }
    }

    fn admin_count(&self) -> usize {
        self.members.values().filter(|m| m.has_role(ADMIN)).count()
    }

    // ────────────────────────────────────────────────────────────────────────
    // Queries
    // ────────────────────────────────────────────────────────────────────────

    pub fn team_name(&self) -> &str {
        &self.team_name
    }

    /// Current members, ordered by user id.
    pub fn members(&self) -> Vec<&Member> {
        self.members.values().collect()
    }

    pub fn member(&self, user_id: &UserId) -> Option<&Member> {
        self.members.get(user_id)
    }

    pub fn has_member(&self, user_id: &UserId) -> bool {
        self.members.contains_key(user_id)
    }

    /// Look members up by id.
    pub fn members_by_id(
        &self,
        user_ids: &[UserId],
        options: MemberSearchOptions,
    ) -> Result<Vec<&Member>> {
        let mut found = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            let member = self.members.get(user_id).or_else(|| {
                options
                    .include_removed
                    .then(|| self.removed.get(user_id))
                    .flatten()
            });
            match member {
                Some(member) => found.push(member),
                None if options.fail_on_missing => {
                    return Err(TeamError::MemberNotFound(user_id.to_string()))
                }
                None => {}
            }
        }
        Ok(found)
    }

    pub fn member_by_signing_key(&self, key: &Ed25519PublicKey) -> Option<&Member> {
        self.by_signing_key
            .get(key)
            .and_then(|id| self.members.get(id))
    }

    pub fn roles(&self) -> Vec<&Role> {
        self.roles.values().collect()
    }

    pub fn role(&self, role_name: &str) -> Option<&Role> {
        self.roles.get(role_name)
    }

    pub fn member_has_role(&self, user_id: &UserId, role_name: &str) -> bool {
        self.members
            .get(user_id)
            .map(|m| m.has_role(role_name))
            .unwrap_or(false)
    }

    pub fn members_in_role(&self, role_name: &str) -> Vec<&Member> {
        self.members
            .values()
            .filter(|m| m.has_role(role_name))
            .collect()
    }

    pub fn is_admin(&self, user_id: &UserId) -> bool {
        self.member_has_role(user_id, ADMIN)
    }

    pub fn invitations(&self) -> Vec<&InvitationState> {
        self.invitations.values().collect()
    }

    pub fn invitation(&self, id: &str) -> Option<&InvitationState> {
        self.invitations.get(id)
    }

    /// Check a proof against the invitation it names.
    pub fn validate_invitation(
        &self,
        proof: &ProofOfInvitation,
        now: i64,
    ) -> Result<&InvitationState> {
        let invitation = self
            .invitations
            .get(&proof.id)
            .ok_or_else(|| TeamError::InvitationNotFound(proof.id.clone()))?;
        invitation.validate(proof, now)?;
        Ok(invitation)
    }

    /// Lockboxes addressed to the given encryption key.
    pub fn lockboxes_for<'a>(
        &'a self,
        recipient: &'a X25519PublicKey,
    ) -> impl Iterator<Item = &'a Lockbox> + 'a {
        self.lockboxes
            .iter()
            .filter(move |l| l.recipient_key == *recipient)
    }
}
