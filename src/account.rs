use chrono::{DateTime, Utc};
use std::fmt;
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::identity::Identity;
use crate::mnemonic::{self, MnemonicStrength};

/// A wallet identity derived from a paper key, plus the caller's `uids`.
///
/// Immutable once built. The underlying [`Identity`] is owned exclusively and
/// released when the account is dropped.
pub struct Account {
    identity: Identity,
    // A 'globally unique' id for the account, e.g. the backend wallet id
    uids: String,
}

impl Account {
    /// Recovers an account from a BIP39 paper key.
    ///
    /// `timestamp` marks when the account started being used and is kept at
    /// whole-second resolution; times before the unix epoch become the epoch.
    ///
    /// Returns `None` if the phrase is not a valid BIP39 phrase in any
    /// supported language.
    pub fn create_from_phrase(phrase: &str, timestamp: DateTime<Utc>, uids: &str) -> Option<Self> {
        match Identity::derive_from_phrase(phrase, timestamp) {
            Ok(identity) => Some(Self::new(identity, uids)),
            Err(e) => {
                debug!(uids, error = %e, "account not created from phrase");
                None
            }
        }
    }

    /// Recreates an account from the result of a prior [`Account::serialize`].
    ///
    /// Returns `None` if the serialization is invalid. In that case the
    /// account *must be recreated* from its paper key with
    /// [`Account::create_from_phrase`]. A serialization becomes invalid
    /// whenever the format changes, which always happens when a new blockchain
    /// is added: an old serialization lacks the new chain's public key, and
    /// only the phrase can produce it. Wrong versions, corruption and
    /// truncation are deliberately indistinguishable.
    pub fn create_from_serialization(serialization: &[u8], uids: &str) -> Option<Self> {
        match Identity::deserialize(serialization) {
            Ok(identity) => Some(Self::new(identity, uids)),
            Err(EngineError::Codec(e)) => {
                warn!(uids, bytes = serialization.len(), error = %e, "account serialization rejected");
                None
            }
            Err(e) => {
                debug!(uids, error = %e, "account not created from serialization");
                None
            }
        }
    }

    /// Generates a BIP39 paper key from `word_list` and pairs it with the
    /// current time. Use [`Account::create_from_phrase`] to get the account.
    ///
    /// # Panics
    /// If `word_list` does not hold exactly
    /// [`BIP39_WORDLIST_COUNT`](crate::BIP39_WORDLIST_COUNT) words.
    pub fn generate_phrase<S: AsRef<str>>(word_list: &[S]) -> (String, DateTime<Utc>) {
        let phrase = mnemonic::generate_phrase(word_list, MnemonicStrength::default());
        (phrase, Utc::now())
    }

    /// Checks `phrase` against a locale-specific `word_list`, including the
    /// BIP39 checksum.
    ///
    /// # Panics
    /// If `word_list` does not hold exactly
    /// [`BIP39_WORDLIST_COUNT`](crate::BIP39_WORDLIST_COUNT) words.
    pub fn validate_phrase<S: AsRef<str>>(phrase: &str, word_list: &[S]) -> bool {
        mnemonic::validate_phrase(phrase, word_list)
    }

    /// True when `serialization` decodes and holds the keys `phrase` derives.
    /// Timestamps are not compared.
    pub fn validate_serialization(serialization: &[u8], phrase: &str) -> bool {
        let decoded = match Identity::deserialize(serialization) {
            Ok(identity) => identity,
            Err(_) => return false,
        };
        match Identity::derive_from_phrase(phrase, decoded.timestamp()) {
            Ok(derived) => derived.same_keys(&decoded),
            Err(_) => false,
        }
    }

    fn new(identity: Identity, uids: &str) -> Self {
        Account {
            identity,
            uids: uids.to_string(),
        }
    }

    /// Serializes the account, *always* in the current format version.
    pub fn serialize(&self) -> Vec<u8> {
        self.identity.serialize()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.identity.timestamp()
    }

    pub fn uids(&self) -> &str {
        &self.uids
    }

    /// Identifier suitable for naming this account's local storage
    pub fn file_system_identifier(&self) -> String {
        self.identity.file_system_identifier()
    }

    pub fn eth_address(&self) -> String {
        self.identity.eth_address()
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("uids", &self.uids)
            .field("timestamp", &self.timestamp())
            .finish_non_exhaustive()
    }
}
