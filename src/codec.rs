//! Binary layout of a serialized account identity.
//!
//! ```text
//! checksum   [4]  first 4 bytes of double-SHA256 over everything after it
//! size       u32  total length, checksum included
//! version    u16
//! timestamp  u64  seconds since the unix epoch
//! bitcoin    u32 len | fingerprint[4] | chain code[32] | compressed key[33]
//! ethereum   u32 len | uncompressed key[65]
//! ripple     u32 len | compressed key[33]
//! ```
//!
//! All integers are big-endian. Only the current version decodes; version 1
//! predates the ripple key and cannot be upgraded without the phrase.

use bitcoin_hashes::{sha256d, Hash};
use chrono::{DateTime, Utc};
use secp256k1::PublicKey;
use thiserror::Error;

use crate::identity::{Identity, MasterPubKey};

/// Format version every serialization is written in
pub const ACCOUNT_SERIALIZE_DEFAULT_VERSION: u16 = 2;

const CHECKSUM_BYTES: usize = 4;
const HEADER_BYTES: usize = CHECKSUM_BYTES + 4 + 2 + 8;

const FINGERPRINT_BYTES: usize = 4;
const CHAIN_CODE_BYTES: usize = 32;
const COMPRESSED_KEY_BYTES: usize = 33;
const UNCOMPRESSED_KEY_BYTES: usize = 65;
const BITCOIN_FIELD_BYTES: usize = FINGERPRINT_BYTES + CHAIN_CODE_BYTES + COMPRESSED_KEY_BYTES;

const SERIALIZED_BYTES: usize = HEADER_BYTES
    + 3 * 4
    + BITCOIN_FIELD_BYTES
    + UNCOMPRESSED_KEY_BYTES
    + COMPRESSED_KEY_BYTES;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Serialization is empty")]
    Empty,
    #[error("Serialization truncated at offset {offset}")]
    Truncated { offset: usize },
    #[error("Checksum mismatch")]
    ChecksumMismatch,
    #[error("Declared size {declared} does not match actual size {actual}")]
    SizeMismatch { declared: usize, actual: usize },
    #[error("Unsupported serialization version {0}")]
    UnsupportedVersion(u16),
    #[error("Field {field} has length {actual}, expected {expected}")]
    FieldLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{0} trailing bytes")]
    TrailingBytes(usize),
    #[error("Invalid {0} public key")]
    InvalidPublicKey(&'static str),
    #[error("Timestamp {0} out of range")]
    TimestampOutOfRange(u64),
}

pub(crate) fn encode(identity: &Identity) -> Vec<u8> {
    let mut data = Vec::with_capacity(SERIALIZED_BYTES);
    data.extend_from_slice(&[0u8; CHECKSUM_BYTES]);
    data.extend_from_slice(&(SERIALIZED_BYTES as u32).to_be_bytes());
    data.extend_from_slice(&ACCOUNT_SERIALIZE_DEFAULT_VERSION.to_be_bytes());
    // Identities never hold pre-epoch times
    let seconds = u64::try_from(identity.timestamp.timestamp()).unwrap_or(0);
    data.extend_from_slice(&seconds.to_be_bytes());

    let bitcoin = &identity.bitcoin;
    put_length(&mut data, BITCOIN_FIELD_BYTES);
    data.extend_from_slice(&bitcoin.fingerprint);
    data.extend_from_slice(&bitcoin.chain_code);
    data.extend_from_slice(&bitcoin.public_key.serialize());

    put_length(&mut data, UNCOMPRESSED_KEY_BYTES);
    data.extend_from_slice(&identity.ethereum.serialize_uncompressed());

    put_length(&mut data, COMPRESSED_KEY_BYTES);
    data.extend_from_slice(&identity.ripple.serialize());

    let checksum = checksum(&data[CHECKSUM_BYTES..]);
    data[..CHECKSUM_BYTES].copy_from_slice(&checksum);
    data
}

pub(crate) fn decode(bytes: &[u8]) -> Result<Identity, CodecError> {
    if bytes.is_empty() {
        return Err(CodecError::Empty);
    }
    if bytes.len() < HEADER_BYTES {
        return Err(CodecError::Truncated {
            offset: bytes.len(),
        });
    }

    let (expected, body) = bytes.split_at(CHECKSUM_BYTES);
    if checksum(body)[..] != *expected {
        return Err(CodecError::ChecksumMismatch);
    }

    let mut reader = Reader::new(body, CHECKSUM_BYTES);
    let declared = reader.u32()? as usize;
    if declared != bytes.len() {
        return Err(CodecError::SizeMismatch {
            declared,
            actual: bytes.len(),
        });
    }

    let version = reader.u16()?;
    if version != ACCOUNT_SERIALIZE_DEFAULT_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let seconds = reader.u64()?;
    let timestamp = i64::try_from(seconds)
        .ok()
        .and_then(|seconds| DateTime::<Utc>::from_timestamp(seconds, 0))
        .ok_or(CodecError::TimestampOutOfRange(seconds))?;

    let field = reader.field("bitcoin", BITCOIN_FIELD_BYTES)?;
    let (fingerprint, rest) = field.split_at(FINGERPRINT_BYTES);
    let (chain_code, key) = rest.split_at(CHAIN_CODE_BYTES);
    let bitcoin = MasterPubKey {
        fingerprint: fingerprint.try_into().map_err(|_| CodecError::InvalidPublicKey("bitcoin"))?,
        chain_code: chain_code.try_into().map_err(|_| CodecError::InvalidPublicKey("bitcoin"))?,
        public_key: public_key("bitcoin", key)?,
    };

    let ethereum = public_key("ethereum", reader.field("ethereum", UNCOMPRESSED_KEY_BYTES)?)?;
    let ripple = public_key("ripple", reader.field("ripple", COMPRESSED_KEY_BYTES)?)?;

    if reader.remaining() != 0 {
        return Err(CodecError::TrailingBytes(reader.remaining()));
    }

    Ok(Identity {
        timestamp,
        bitcoin,
        ethereum,
        ripple,
    })
}

fn put_length(data: &mut Vec<u8>, length: usize) {
    data.extend_from_slice(&(length as u32).to_be_bytes());
}

fn checksum(data: &[u8]) -> [u8; CHECKSUM_BYTES] {
    let hash = sha256d::Hash::hash(data);
    let bytes: &[u8] = hash.as_ref();
    let mut result = [0u8; CHECKSUM_BYTES];
    result.copy_from_slice(&bytes[..CHECKSUM_BYTES]);
    result
}

fn public_key(field: &'static str, bytes: &[u8]) -> Result<PublicKey, CodecError> {
    PublicKey::from_slice(bytes).map_err(|_| CodecError::InvalidPublicKey(field))
}

struct Reader<'a> {
    bytes: &'a [u8],
    position: usize,
    // offset of `bytes` within the whole blob, for error reporting
    base: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8], base: usize) -> Self {
        Reader {
            bytes,
            position: 0,
            base,
        }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < count {
            return Err(CodecError::Truncated {
                offset: self.base + self.bytes.len(),
            });
        }
        let bytes: &'a [u8] = self.bytes;
        let slice = &bytes[self.position..self.position + count];
        self.position += count;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut result = [0u8; N];
        result.copy_from_slice(self.take(N)?);
        Ok(result)
    }

    fn u16(&mut self) -> Result<u16, CodecError> {
        self.array().map(u16::from_be_bytes)
    }

    fn u32(&mut self) -> Result<u32, CodecError> {
        self.array().map(u32::from_be_bytes)
    }

    fn u64(&mut self) -> Result<u64, CodecError> {
        self.array().map(u64::from_be_bytes)
    }

    fn field(&mut self, field: &'static str, expected: usize) -> Result<&'a [u8], CodecError> {
        let actual = self.u32()? as usize;
        if actual != expected {
            return Err(CodecError::FieldLength {
                field,
                expected,
                actual,
            });
        }
        self.take(actual)
    }
}
