//! Key material an account is built around.
//!
//! An [`Identity`] keeps public keys only. The phrase and seed it was derived
//! from are wiped before [`Identity::derive_from_phrase`] returns.

use chrono::{DateTime, SubsecRound, Utc};
use secp256k1::PublicKey;
use sha2::{Digest, Sha256};
use tracing::trace;
use zeroize::Zeroize;

use crate::codec;
use crate::derivation::{paths, ExtendedKey};
use crate::error::Result;
use crate::mnemonic::SecureMnemonic;

/// Bitcoin master public key: the root fingerprint plus chain code and key of `m/0'`
#[derive(PartialEq, Eq)]
pub(crate) struct MasterPubKey {
    pub(crate) fingerprint: [u8; 4],
    pub(crate) chain_code: [u8; 32],
    pub(crate) public_key: PublicKey,
}

/// Owned handle to derived key material. Not `Clone`; dropping it releases the
/// material exactly once.
pub struct Identity {
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) bitcoin: MasterPubKey,
    pub(crate) ethereum: PublicKey,
    pub(crate) ripple: PublicKey,
}

impl Identity {
    /// Derives the identity for `phrase`. The same phrase and timestamp always
    /// produce the same serialization.
    ///
    /// `timestamp` is kept at whole-second resolution; times before the unix
    /// epoch become the epoch.
    pub fn derive_from_phrase(phrase: &str, timestamp: DateTime<Utc>) -> Result<Self> {
        let mnemonic = SecureMnemonic::from_phrase(phrase)?;
        let seed = mnemonic.to_seed();
        let root = ExtendedKey::from_seed(seed.as_slice())?;

        let bitcoin = paths::bitcoin_master().derive(&root)?;
        let ethereum = paths::bip44(paths::ETHEREUM, 0, false, 0).derive(&root)?;
        let ripple = paths::bip44(paths::RIPPLE, 0, false, 0).derive(&root)?;

        Ok(Identity {
            timestamp: timestamp.trunc_subsecs(0).max(DateTime::<Utc>::default()),
            bitcoin: MasterPubKey {
                fingerprint: root.fingerprint(),
                chain_code: bitcoin.chain_code,
                public_key: bitcoin.public_key,
            },
            ethereum: ethereum.public_key,
            ripple: ripple.public_key,
        })
    }

    /// Decodes a serialization produced by [`Identity::serialize`].
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        Ok(codec::decode(bytes)?)
    }

    /// Encodes in the current format version.
    pub fn serialize(&self) -> Vec<u8> {
        codec::encode(self)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// True when both identities carry the same keys, whatever their timestamps.
    pub fn same_keys(&self, other: &Identity) -> bool {
        self.bitcoin == other.bitcoin
            && self.ethereum == other.ethereum
            && self.ripple == other.ripple
    }

    /// Checksum-free `0x`-prefixed Ethereum address of `m/44'/60'/0'/0/0`
    pub fn eth_address(&self) -> String {
        let key = self.ethereum.serialize_uncompressed();
        let hash = keccak_hash::keccak(&key[1..]);
        format!("0x{}", hex::encode(&hash.as_bytes()[12..]))
    }

    /// Hex SHA-256 of the Ethereum public key. Stable for a phrase, so callers
    /// can name per-account storage with it.
    pub fn file_system_identifier(&self) -> String {
        hex::encode(Sha256::digest(self.ethereum.serialize_uncompressed()))
    }
}

impl Drop for Identity {
    fn drop(&mut self) {
        self.bitcoin.chain_code.zeroize();
        self.bitcoin.fingerprint.zeroize();
        trace!("identity released");
    }
}
