//! Canonical CBOR encoding for link headers.
//!
//! Headers follow RFC 8949 Core Deterministic Encoding:
//! - Map keys are small integers written in ascending order
//! - Integers use the smallest valid encoding
//! - Definite lengths only
//! - No floats (timestamps are i64 milliseconds)
//!
//! The same header must produce identical bytes on every platform, since
//! both the signature and the link id are computed over them.

use crate::link::{Link, LinkHeader};

/// Header field keys (integer keys for compact encoding).
///
/// Keys 0-23 encode as single bytes, so ascending numeric order is also
/// ascending encoded-byte order.
mod keys {
    pub const VERSION: u64 = 0;
    pub const AUTHOR: u64 = 1;
    pub const SEQ: u64 = 2;
    pub const TIMESTAMP: u64 = 3;
    pub const KIND: u64 = 4;
    pub const PREV: u64 = 5;
    pub const PAYLOAD_HASH: u64 = 6;

    pub const COUNT: u64 = 7;
}

const MAJOR_UINT: u8 = 0;
const MAJOR_NEGINT: u8 = 1;
const MAJOR_BYTES: u8 = 2;
const MAJOR_MAP: u8 = 5;
const SIMPLE_NULL: u8 = 0xf6;

/// Encode a link header to canonical CBOR bytes.
pub fn canonical_header_bytes(header: &LinkHeader) -> Vec<u8> {
    let mut buf = Vec::with_capacity(128);

    encode_uint(&mut buf, MAJOR_MAP, keys::COUNT);

    encode_uint(&mut buf, MAJOR_UINT, keys::VERSION);
    encode_uint(&mut buf, MAJOR_UINT, header.version.into());

    encode_uint(&mut buf, MAJOR_UINT, keys::AUTHOR);
    encode_bytes(&mut buf, header.author.as_bytes());

    encode_uint(&mut buf, MAJOR_UINT, keys::SEQ);
    encode_uint(&mut buf, MAJOR_UINT, header.seq);

    encode_uint(&mut buf, MAJOR_UINT, keys::TIMESTAMP);
    encode_int(&mut buf, header.timestamp);

    encode_uint(&mut buf, MAJOR_UINT, keys::KIND);
    encode_uint(&mut buf, MAJOR_UINT, header.kind.to_u16().into());

    encode_uint(&mut buf, MAJOR_UINT, keys::PREV);
    match &header.prev {
        Some(id) => encode_bytes(&mut buf, id.as_bytes()),
        None => buf.push(SIMPLE_NULL),
    }

    encode_uint(&mut buf, MAJOR_UINT, keys::PAYLOAD_HASH);
    encode_bytes(&mut buf, header.payload_hash.as_bytes());

    buf
}

/// Encode an entire link to canonical bytes.
///
/// Format: canonical_header || payload || signature
pub fn canonical_bytes(link: &Link) -> Vec<u8> {
    let mut buf = canonical_header_bytes(&link.header);
    buf.extend_from_slice(&link.payload);
    buf.extend_from_slice(link.signature.as_bytes());
    buf
}

/// Construct the signed message (header || payload).
pub fn signed_message(link: &Link) -> Vec<u8> {
    signed_message_from_parts(&link.header, &link.payload)
}

/// Construct the signed message from header and payload.
pub fn signed_message_from_parts(header: &LinkHeader, payload: &[u8]) -> Vec<u8> {
    let mut buf = canonical_header_bytes(header);
    buf.extend_from_slice(payload);
    buf
}

/// Encode a signed integer (major types 0 and 1).
fn encode_int(buf: &mut Vec<u8>, n: i64) {
    if n >= 0 {
        encode_uint(buf, MAJOR_UINT, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        encode_uint(buf, MAJOR_NEGINT, (-1 - n) as u64);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, MAJOR_BYTES, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}
