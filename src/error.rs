//! Error types for the key derivation engine

use thiserror::Error;

use crate::codec::CodecError;
use crate::derivation::DerivationError;
use crate::mnemonic::MnemonicError;

/// Why the engine produced no identity. Never carries phrase or key bytes.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Mnemonic error: {0}")]
    Mnemonic(#[from] MnemonicError),

    #[error("Derivation error: {0}")]
    Derivation(#[from] DerivationError),

    #[error("Serialization error: {0}")]
    Codec(#[from] CodecError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
