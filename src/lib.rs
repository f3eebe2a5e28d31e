//! Deterministic wallet account identity.
//!
//! An [`Account`] is derived once from a BIP39 paper key and a creation
//! timestamp, then persisted through its compact binary serialization. When
//! the serialization format moves on, only the paper key can rebuild it.

pub mod account;
pub mod codec;
pub mod derivation;
pub mod error;
pub mod identity;
pub mod mnemonic;

pub use account::Account;
pub use codec::{CodecError, ACCOUNT_SERIALIZE_DEFAULT_VERSION};
pub use derivation::{DerivationError, DerivationPath, ExtendedKey};
pub use error::{EngineError, Result};
pub use identity::Identity;
pub use mnemonic::{
    MnemonicStrength,
    MnemonicError,
    SecureMnemonic,
    BIP39_WORDLIST_COUNT,
    generate_phrase,
    validate_phrase,
    validate_word_list,
};
