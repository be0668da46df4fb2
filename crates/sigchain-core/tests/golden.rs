//! Golden link vectors.
//!
//! Every implementation that reads a sigchain graph must produce identical:
//! - header_bytes (canonical CBOR)
//! - signed_message
//! - signature (deterministic Ed25519)
//! - link_bytes
//! - link_id

use serde::{Deserialize, Serialize};
use sigchain_core::canonical::signed_message;
use sigchain_core::{
    canonical_bytes, canonical_header_bytes, validate_link, Ed25519Signature, Keypair, Link,
    LinkBuilder, LinkId, LinkKind, TeamGraph, ValidationError,
};

/// A single golden test vector.
#[derive(Debug, Serialize, Deserialize)]
pub struct GoldenVector {
    pub name: String,
    pub description: String,

    // Inputs
    pub author_seed: String, // 32 bytes hex
    pub author_pk: String,   // 32 bytes hex (derived)
    pub seq: u64,
    pub timestamp: i64,
    pub kind: u16,
    pub prev: Option<String>, // 32 bytes hex
    pub payload: String,      // hex

    // Derived outputs
    pub header_bytes: String,
    pub signed_message: String, // header_bytes || payload
    pub signature: String,      // 64 bytes
    pub link_bytes: String,
    pub link_id: String, // 32 bytes
}

fn build_link(
    seed: [u8; 32],
    seq: u64,
    timestamp: i64,
    kind: LinkKind,
    prev: Option<LinkId>,
    payload: &[u8],
) -> Link {
    let keypair = Keypair::from_seed(&seed);
    let mut builder = LinkBuilder::new(keypair.public_key(), seq)
        .timestamp(timestamp)
        .kind(kind)
        .payload(payload.to_vec());
    if let Some(prev) = prev {
        builder = builder.prev(prev);
    }
    builder.sign(&keypair)
}

fn generate_vector(
    name: &str,
    description: &str,
    seed: [u8; 32],
    seq: u64,
    timestamp: i64,
    kind: LinkKind,
    prev: Option<LinkId>,
    payload: &[u8],
) -> GoldenVector {
    let link = build_link(seed, seq, timestamp, kind, prev, payload);

    GoldenVector {
        name: name.to_string(),
        description: description.to_string(),
        author_seed: hex::encode(seed),
        author_pk: link.author().to_hex(),
        seq,
        timestamp,
        kind: kind.to_u16(),
        prev: prev.map(|id| id.to_hex()),
        payload: hex::encode(payload),
        header_bytes: hex::encode(canonical_header_bytes(&link.header)),
        signed_message: hex::encode(signed_message(&link)),
        signature: link.signature.to_hex(),
        link_bytes: hex::encode(canonical_bytes(&link)),
        link_id: link.compute_id().to_hex(),
    }
}

pub fn generate_all_vectors() -> Vec<GoldenVector> {
    let root = build_link([0x01; 32], 1, 1_736_870_400_000, LinkKind::Root, None, b"root");

    vec![
        generate_vector(
            "root_empty_payload",
            "Root link with no payload",
            [0x01; 32],
            1,
            0,
            LinkKind::Root,
            None,
            &[],
        ),
        generate_vector(
            "root_with_payload",
            "Root link at a realistic timestamp",
            [0x01; 32],
            1,
            1_736_870_400_000,
            LinkKind::Root,
            None,
            b"root",
        ),
        generate_vector(
            "negative_timestamp",
            "Timestamps before the epoch encode as CBOR negative integers",
            [0x02; 32],
            1,
            -1_000,
            LinkKind::Root,
            None,
            b"old",
        ),
        generate_vector(
            "add_role_after_root",
            "Second link naming the root as prev",
            [0x01; 32],
            2,
            1_736_870_400_001,
            LinkKind::AddRole,
            Some(root.compute_id()),
            b"role",
        ),
        generate_vector(
            "large_seq",
            "Sequence number needing an eight-byte integer",
            [0x03; 32],
            u64::MAX,
            1,
            LinkKind::AdmitDevice,
            Some(LinkId::from_bytes([0xaa; 32])),
            b"device",
        ),
        generate_vector(
            "binary_payload",
            "Payload containing all 256 byte values",
            [0x04; 32],
            3,
            42,
            LinkKind::InviteMember,
            Some(LinkId::from_bytes([0x11; 32])),
            &(0u8..=255).collect::<Vec<u8>>(),
        ),
    ]
}

#[test]
fn test_vectors_deterministic() {
    let v1 = generate_all_vectors();
    let v2 = generate_all_vectors();

    for (a, b) in v1.iter().zip(v2.iter()) {
        assert_eq!(a.header_bytes, b.header_bytes, "header_bytes mismatch for {}", a.name);
        assert_eq!(a.signature, b.signature, "signature mismatch for {}", a.name);
        assert_eq!(a.link_bytes, b.link_bytes, "link_bytes mismatch for {}", a.name);
        assert_eq!(a.link_id, b.link_id, "link_id mismatch for {}", a.name);
    }
}

#[test]
fn test_vectors_verify() {
    for v in &generate_all_vectors() {
        let seed: [u8; 32] = hex::decode(&v.author_seed).unwrap().try_into().unwrap();
        let prev = v.prev.as_deref().map(|p| LinkId::from_hex(p).unwrap());
        let kind = LinkKind::from_u16(v.kind).unwrap();
        let payload = hex::decode(&v.payload).unwrap();

        let link = build_link(seed, v.seq, v.timestamp, kind, prev, &payload);
        assert!(validate_link(&link).is_ok(), "verify failed for {}", v.name);
        assert_eq!(hex::encode(canonical_bytes(&link)), v.link_bytes);
        assert_eq!(link.compute_id().to_hex(), v.link_id, "link_id mismatch for {}", v.name);
    }
}

#[test]
fn test_header_layout() {
    let v = &generate_all_vectors()[0];
    let header = hex::decode(&v.header_bytes).unwrap();

    // map(7), key 0, version 0, key 1, bytes(32)
    assert_eq!(&header[..5], &[0xa7, 0x00, 0x00, 0x01, 0x58]);
    assert_eq!(header[5], 32);
    assert_eq!(&header[6..38], hex::decode(&v.author_pk).unwrap().as_slice());

    // Root has no prev: key 5 followed by CBOR null
    let null_at = header.windows(2).position(|w| w == [0x05, 0xf6]);
    assert!(null_at.is_some());

    let link_bytes = hex::decode(&v.link_bytes).unwrap();
    assert_eq!(link_bytes.len(), header.len() + 64);
}

#[test]
fn print_golden_vectors_json() {
    #[derive(Serialize)]
    struct VectorFile {
        version: String,
        description: String,
        vectors: Vec<GoldenVector>,
    }

    let file = VectorFile {
        version: "0.1.0".to_string(),
        description: "Golden link vectors for sigchain team graphs.".to_string(),
        vectors: generate_all_vectors(),
    };

    let json = serde_json::to_string_pretty(&file).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["vectors"].as_array().unwrap().len(), 6);
    println!("{}", json);
}

// =============================================================================
// REJECTION VECTORS
// =============================================================================

#[test]
fn test_reject_invalid_signature() {
    let mut link = build_link([0x42; 32], 1, 0, LinkKind::Root, None, b"hello");
    link.signature = Ed25519Signature::from_bytes([0xff; 64]);

    assert!(matches!(
        validate_link(&link),
        Err(ValidationError::SignatureFailed)
    ));
}

#[test]
fn test_reject_swapped_payload() {
    let mut link = build_link([0x42; 32], 1, 0, LinkKind::Root, None, b"hello");
    link.payload = b"goodbye".to_vec().into();

    assert!(matches!(
        validate_link(&link),
        Err(ValidationError::PayloadHashMismatch)
    ));
}

#[test]
fn test_reject_root_after_seq_one() {
    let link = build_link(
        [0x42; 32],
        2,
        0,
        LinkKind::Root,
        Some(LinkId::from_bytes([1; 32])),
        b"",
    );
    assert!(matches!(
        validate_link(&link),
        Err(ValidationError::MisplacedRoot)
    ));
}

#[test]
fn test_reject_missing_prev() {
    let link = build_link([0x42; 32], 2, 0, LinkKind::AddMember, None, b"");
    assert!(matches!(
        validate_link(&link),
        Err(ValidationError::StructuralError(_))
    ));
}

#[test]
fn test_reject_fork_from_stale_head() {
    let root = build_link([0x42; 32], 1, 0, LinkKind::Root, None, b"root");
    let mut graph = TeamGraph::new("team", root.clone()).unwrap();

    let first = build_link([0x42; 32], 2, 1, LinkKind::AddRole, Some(root.compute_id()), b"a");
    graph.append(first).unwrap();

    // A second link built against the root instead of the new head.
    let stale = build_link([0x42; 32], 3, 2, LinkKind::AddRole, Some(root.compute_id()), b"b");
    assert!(matches!(
        graph.append(stale),
        Err(ValidationError::InvalidPrev { .. })
    ));
    assert_eq!(graph.len(), 2);
}
