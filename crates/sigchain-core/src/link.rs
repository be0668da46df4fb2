//! Link: one signed action in a team's history.
//!
//! A link is immutable once signed. Changes to a team are represented by
//! appending new links to its graph.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::canonical::{canonical_bytes, signed_message_from_parts};
use crate::crypto::{Blake3Hash, Ed25519PublicKey, Ed25519Signature, Keypair};
use crate::types::LinkId;

/// The current link schema version.
pub const LINK_VERSION: u8 = 0;

/// The kind of link, determining how the payload is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum LinkKind {
    // Membership kinds (0x0000 - 0x00FF)
    /// First link of a team (seq=1). Payload names the team and its founder.
    Root = 0x0001,
    AddMember = 0x0002,
    RemoveMember = 0x0003,
    AddDevice = 0x0004,

    // Role kinds (0x0100 - 0x01FF)
    AddRole = 0x0100,
    RemoveRole = 0x0101,
    AddMemberRole = 0x0102,
    RemoveMemberRole = 0x0103,

    // Invitation kinds (0x0200 - 0x02FF)
    InviteMember = 0x0200,
    InviteDevice = 0x0201,
    RevokeInvitation = 0x0202,
    AdmitMember = 0x0203,
    AdmitDevice = 0x0204,
}

impl LinkKind {
    /// Convert to u16 for serialization.
    pub fn to_u16(self) -> u16 {
        self as u16
    }

    /// Try to parse from u16.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0001 => Some(Self::Root),
            0x0002 => Some(Self::AddMember),
            0x0003 => Some(Self::RemoveMember),
            0x0004 => Some(Self::AddDevice),
            0x0100 => Some(Self::AddRole),
            0x0101 => Some(Self::RemoveRole),
            0x0102 => Some(Self::AddMemberRole),
            0x0103 => Some(Self::RemoveMemberRole),
            0x0200 => Some(Self::InviteMember),
            0x0201 => Some(Self::InviteDevice),
            0x0202 => Some(Self::RevokeInvitation),
            0x0203 => Some(Self::AdmitMember),
            0x0204 => Some(Self::AdmitDevice),
            _ => None,
        }
    }

    /// Check if this is a membership kind.
    pub fn is_membership(self) -> bool {
        (self.to_u16() & 0xFF00) == 0x0000
    }

    /// Check if this is a role kind.
    pub fn is_role(self) -> bool {
        (self.to_u16() & 0xFF00) == 0x0100
    }

    /// Check if this is an invitation kind.
    pub fn is_invitation(self) -> bool {
        (self.to_u16() & 0xFF00) == 0x0200
    }
}

/// The header of a link, containing all signed metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkHeader {
    /// Schema version (currently 0).
    pub version: u8,

    /// The author's signing key.
    pub author: Ed25519PublicKey,

    /// Position in the team graph (1-indexed).
    pub seq: u64,

    /// Author-claimed timestamp (Unix milliseconds). Untrusted.
    pub timestamp: i64,

    pub kind: LinkKind,

    /// Id of the previous link (None for the root).
    pub prev: Option<LinkId>,

    /// Blake3 hash of the payload bytes.
    pub payload_hash: Blake3Hash,
}

/// A complete link: header + payload + signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub header: LinkHeader,

    /// CBOR-encoded action payload.
    pub payload: Bytes,

    /// Ed25519 signature over (canonical_header || payload).
    pub signature: Ed25519Signature,
}

impl Link {
    /// Compute the link ID (Blake3 hash of canonical bytes).
    pub fn compute_id(&self) -> LinkId {
        LinkId(Blake3Hash::hash(&canonical_bytes(self)).0)
    }

    pub fn author(&self) -> &Ed25519PublicKey {
        &self.header.author
    }

    pub fn seq(&self) -> u64 {
        self.header.seq
    }

    pub fn kind(&self) -> LinkKind {
        self.header.kind
    }

    pub fn timestamp(&self) -> i64 {
        self.header.timestamp
    }

    /// Check if this is the root of a team graph.
    pub fn is_root(&self) -> bool {
        self.header.kind == LinkKind::Root && self.header.seq == 1
    }
}

/// Builder for creating links.
pub struct LinkBuilder {
    author: Ed25519PublicKey,
    seq: u64,
    timestamp: i64,
    kind: LinkKind,
    prev: Option<LinkId>,
    payload: Bytes,
}

impl LinkBuilder {
    /// Start building a link.
    pub fn new(author: Ed25519PublicKey, seq: u64) -> Self {
        Self {
            author,
            seq,
            timestamp: 0,
            kind: LinkKind::Root,
            prev: None,
            payload: Bytes::new(),
        }
    }

    pub fn timestamp(mut self, ts: i64) -> Self {
        self.timestamp = ts;
        self
    }

    pub fn kind(mut self, kind: LinkKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn prev(mut self, prev: LinkId) -> Self {
        self.prev = Some(prev);
        self
    }

    pub fn payload(mut self, p: impl Into<Bytes>) -> Self {
        self.payload = p.into();
        self
    }

    /// Build and sign the link.
    pub fn sign(self, keypair: &Keypair) -> Link {
        let header = LinkHeader {
            version: LINK_VERSION,
            author: self.author,
            seq: self.seq,
            timestamp: self.timestamp,
            kind: self.kind,
            prev: self.prev,
            payload_hash: Blake3Hash::hash(&self.payload),
        };

        let signature = keypair.sign(&signed_message_from_parts(&header, &self.payload));

        Link {
            header,
            payload: self.payload,
            signature,
        }
    }
}
