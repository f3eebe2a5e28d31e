use bitcoin_hashes::{hash160, Hash};
use hmac::{Hmac, Mac};
use secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey};
use sha2::Sha512;
use std::str::FromStr;
use thiserror::Error;
use zeroize::Zeroize;

const HARDENED_BIT: u32 = 0x80000000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DerivationError {
    #[error("Invalid derivation path")]
    InvalidPath,
    #[error("Invalid child number")]
    InvalidChildNumber,
    #[error("Maximum derivation depth exceeded")]
    DepthExceeded,
    #[error("Key derivation failed")]
    KeyDerivationFailed,
    #[error("HMAC operation failed")]
    HmacError,
    #[error("Secp256k1 operation failed")]
    Secp256k1Error,
}

/// A BIP32 extended private key. Only lives for the duration of a derivation;
/// the identity keeps public material alone.
pub struct ExtendedKey {
    private_key: SecretKey,
    pub public_key: PublicKey,
    pub chain_code: [u8; 32],
    pub depth: u8,
    pub parent_fingerprint: [u8; 4],
    pub child_number: u32,
}

impl ExtendedKey {
    /// Creates the master key from a BIP39 seed
    pub fn from_seed(seed: &[u8]) -> Result<Self, DerivationError> {
        let secp = Secp256k1::signing_only();

        let mut hmac = Hmac::<Sha512>::new_from_slice(b"Bitcoin seed")
            .map_err(|_| DerivationError::HmacError)?;
        hmac.update(seed);
        let result = hmac.finalize().into_bytes();

        let (private_key, chain_code) = split_hmac(&result)?;
        let public_key = PublicKey::from_secret_key(&secp, &private_key);

        Ok(ExtendedKey {
            private_key,
            public_key,
            chain_code,
            depth: 0,
            parent_fingerprint: [0u8; 4],
            child_number: 0,
        })
    }

    /// Derives the child key at `index`; indices with the high bit set are hardened.
    pub fn derive_child(&self, index: u32) -> Result<Self, DerivationError> {
        let secp = Secp256k1::signing_only();
        let depth = self
            .depth
            .checked_add(1)
            .ok_or(DerivationError::DepthExceeded)?;

        // 33 bytes of key material + 4 bytes of index
        let mut data = Vec::with_capacity(37);
        if index & HARDENED_BIT != 0 {
            data.push(0);
            data.extend_from_slice(&self.private_key.secret_bytes());
        } else {
            data.extend_from_slice(&self.public_key.serialize());
        }
        data.extend_from_slice(&index.to_be_bytes());

        let mut hmac = Hmac::<Sha512>::new_from_slice(&self.chain_code)
            .map_err(|_| DerivationError::HmacError)?;
        hmac.update(&data);
        data.zeroize();
        let result = hmac.finalize().into_bytes();

        let (tweak, chain_code) = split_hmac(&result)?;
        let child_private_key = self
            .private_key
            .add_tweak(&Scalar::from(tweak))
            .map_err(|_| DerivationError::KeyDerivationFailed)?;
        let child_public_key = PublicKey::from_secret_key(&secp, &child_private_key);

        Ok(ExtendedKey {
            private_key: child_private_key,
            public_key: child_public_key,
            chain_code,
            depth,
            parent_fingerprint: self.fingerprint(),
            child_number: index,
        })
    }

    /// First four bytes of HASH160 of the compressed public key
    pub fn fingerprint(&self) -> [u8; 4] {
        fingerprint(&self.public_key)
    }
}

impl ExtendedKey {
    fn wipe(&mut self) {
        self.private_key.non_secure_erase();
        self.chain_code.zeroize();
    }
}

impl Drop for ExtendedKey {
    fn drop(&mut self) {
        self.wipe();
    }
}

pub fn fingerprint(public_key: &PublicKey) -> [u8; 4] {
    let hash = hash160::Hash::hash(&public_key.serialize());
    let bytes: &[u8] = hash.as_ref();
    let mut result = [0u8; 4];
    result.copy_from_slice(&bytes[..4]);
    result
}

fn split_hmac(result: &[u8]) -> Result<(SecretKey, [u8; 32]), DerivationError> {
    let mut chain_code = [0u8; 32];
    chain_code.copy_from_slice(&result[32..64]);
    let key = SecretKey::from_slice(&result[..32]).map_err(|_| DerivationError::Secp256k1Error)?;
    Ok((key, chain_code))
}

/// A BIP32 derivation path such as `m/44'/60'/0'/0/0`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationPath {
    indices: Vec<u32>,
}

impl DerivationPath {
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Derives a key following this path
    pub fn derive(&self, root: &ExtendedKey) -> Result<ExtendedKey, DerivationError> {
        let mut indices = self.indices.iter();
        let first = match indices.next() {
            Some(&index) => root.derive_child(index)?,
            None => return Err(DerivationError::InvalidPath),
        };
        indices.try_fold(first, |key, &index| key.derive_child(index))
    }
}

impl FromStr for DerivationPath {
    type Err = DerivationError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let mut components = path.split('/');
        if components.next() != Some("m") {
            return Err(DerivationError::InvalidPath);
        }

        let indices = components
            .map(|component| {
                let (index_str, hardened) = match component
                    .strip_suffix('\'')
                    .or_else(|| component.strip_suffix('h'))
                {
                    Some(stripped) => (stripped, true),
                    None => (component, false),
                };

                let index = index_str
                    .parse::<u32>()
                    .map_err(|_| DerivationError::InvalidChildNumber)?;
                if index & HARDENED_BIT != 0 {
                    return Err(DerivationError::InvalidChildNumber);
                }
                Ok(if hardened { index | HARDENED_BIT } else { index })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DerivationPath { indices })
    }
}

/// Paths of the keys an account identity carries
pub mod paths {
    use super::{DerivationPath, HARDENED_BIT};

    /// Bitcoin master public key, `m/0'`
    pub fn bitcoin_master() -> DerivationPath {
        DerivationPath {
            indices: vec![HARDENED_BIT],
        }
    }

    /// BIP44 - Multi-Account Hierarchy for Deterministic Wallets
    /// Format: m/44'/coin_type'/account'/change/address_index
    pub fn bip44(coin_type: u32, account: u32, change: bool, address_index: u32) -> DerivationPath {
        DerivationPath {
            indices: vec![
                44 | HARDENED_BIT,
                coin_type | HARDENED_BIT,
                account | HARDENED_BIT,
                u32::from(change),
                address_index,
            ],
        }
    }

    /// Ethereum - Coin type 60
    pub const ETHEREUM: u32 = 60;

    /// Ripple - Coin type 144
    pub const RIPPLE: u32 = 144;
}
