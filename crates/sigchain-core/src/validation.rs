//! Link validation: signature verification and structural checks.

use crate::canonical::signed_message;
use crate::crypto::Blake3Hash;
use crate::error::ValidationError;
use crate::link::{Link, LinkKind, LINK_VERSION};
use crate::types::LinkId;

/// Validate a link on its own, without graph context.
///
/// This performs:
/// - Version check
/// - Payload hash verification
/// - Root placement rules (root iff seq=1, root has no prev)
/// - Signature verification
pub fn validate_link(link: &Link) -> Result<(), ValidationError> {
    let header = &link.header;

    if header.version != LINK_VERSION {
        return Err(ValidationError::UnsupportedVersion(header.version));
    }

    if Blake3Hash::hash(&link.payload) != header.payload_hash {
        return Err(ValidationError::PayloadHashMismatch);
    }

    match (header.kind == LinkKind::Root, header.seq == 1) {
        (true, false) => return Err(ValidationError::MisplacedRoot),
        (false, true) => return Err(ValidationError::MissingRoot),
        _ => {}
    }

    if header.seq == 0 {
        return Err(ValidationError::InvalidSequence {
            expected: 1,
            got: 0,
        });
    }

    if header.seq == 1 && header.prev.is_some() {
        return Err(ValidationError::InvalidPrev {
            expected: None,
            got: header.prev,
        });
    }

    if header.seq > 1 && header.prev.is_none() {
        return Err(ValidationError::StructuralError(
            "seq > 1 requires prev".into(),
        ));
    }

    header
        .author
        .verify(&signed_message(link), &link.signature)
        .map_err(|_| ValidationError::SignatureFailed)
}

/// Check that `link` may follow a graph whose head is `head` at `head_seq`.
///
/// An empty graph has `head_seq == 0` and no head.
pub fn validate_successor(
    head_seq: u64,
    head: Option<LinkId>,
    link: &Link,
) -> Result<(), ValidationError> {
    let expected = head_seq + 1;
    if link.header.seq != expected {
        return Err(ValidationError::InvalidSequence {
            expected,
            got: link.header.seq,
        });
    }

    if link.header.prev != head {
        return Err(ValidationError::InvalidPrev {
            expected: head,
            got: link.header.prev,
        });
    }

    Ok(())
}
