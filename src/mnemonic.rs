use bip39::{Language, Mnemonic};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

/// Number of entries in every standard BIP39 word table
pub const BIP39_WORDLIST_COUNT: usize = 2048;

const BITS_PER_WORD: usize = 11;

// Word indices are the same in every BIP39 language, so checksums are checked
// against this table after mapping the caller's words onto it.
const REFERENCE_LANGUAGE: Language = Language::English;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MnemonicStrength {
    /// Paper keys are 12 words
    #[default]
    Words12,
    Words15,
    Words18,
    Words21,
    Words24,
}

impl MnemonicStrength {
    fn to_entropy_bits(self) -> usize {
        match self {
            MnemonicStrength::Words12 => 128,
            MnemonicStrength::Words15 => 160,
            MnemonicStrength::Words18 => 192,
            MnemonicStrength::Words21 => 224,
            MnemonicStrength::Words24 => 256,
        }
    }

    pub fn word_count(self) -> usize {
        let entropy_bits = self.to_entropy_bits();
        (entropy_bits + entropy_bits / 32) / BITS_PER_WORD
    }
}

// Messages never carry the words themselves.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MnemonicError {
    #[error("Invalid mnemonic phrase")]
    InvalidMnemonic,
    #[error("Invalid word count: {0}")]
    InvalidWordCount(usize),
    #[error("Word {position} is not in the word list")]
    UnknownWord { position: usize },
    #[error("Mnemonic checksum mismatch")]
    ChecksumMismatch,
}

impl From<bip39::Error> for MnemonicError {
    fn from(err: bip39::Error) -> Self {
        match err {
            bip39::Error::BadWordCount(count) => MnemonicError::InvalidWordCount(count),
            bip39::Error::UnknownWord(position) => MnemonicError::UnknownWord { position },
            bip39::Error::InvalidChecksum => MnemonicError::ChecksumMismatch,
            _ => MnemonicError::InvalidMnemonic,
        }
    }
}

/// Whether a word table of `count` entries is usable for phrase generation.
pub fn validate_word_list(count: usize) -> bool {
    count == BIP39_WORDLIST_COUNT
}

/// Panics unless `wordlist` has exactly [`BIP39_WORDLIST_COUNT`] entries.
///
/// A wrong-sized table is a caller defect, so there is no error value for it.
pub fn assert_word_list<S: AsRef<str>>(wordlist: &[S]) {
    assert!(
        validate_word_list(wordlist.len()),
        "word list must contain {} words, got {}",
        BIP39_WORDLIST_COUNT,
        wordlist.len()
    );
}

/// Generates a fresh phrase of `strength` words drawn from `wordlist`.
///
/// # Panics
/// If `wordlist` is not a full BIP39 table, or if the OS entropy source fails.
pub fn generate_phrase<S: AsRef<str>>(wordlist: &[S], strength: MnemonicStrength) -> String {
    assert_word_list(wordlist);

    let mut entropy = Zeroizing::new(vec![0u8; strength.to_entropy_bits() / 8]);
    OsRng.fill_bytes(&mut entropy);

    match encode_entropy(&entropy, wordlist) {
        Ok(phrase) => phrase,
        Err(e) => unreachable!("{}-bit entropy rejected: {}", strength.to_entropy_bits(), e),
    }
}

/// Checks that every word of `phrase` is in `wordlist` and that the BIP39
/// checksum matches. Words are compared after NFKD normalization, so NFC and
/// NFKD tables both work.
///
/// # Panics
/// If `wordlist` is not a full BIP39 table.
pub fn validate_phrase<S: AsRef<str>>(phrase: &str, wordlist: &[S]) -> bool {
    assert_word_list(wordlist);
    decode_phrase(phrase, wordlist).is_ok()
}

/// Lowercased NFKD form of `word`, as BIP39 compares words.
fn normalize_word(word: &str) -> Zeroizing<String> {
    Zeroizing::new(word.chars().flat_map(char::to_lowercase).nfkd().collect())
}

fn encode_entropy<S: AsRef<str>>(entropy: &[u8], wordlist: &[S]) -> Result<String, MnemonicError> {
    let mnemonic = Mnemonic::from_entropy_in(REFERENCE_LANGUAGE, entropy)?;

    let mut phrase = String::new();
    for (position, index) in mnemonic.word_indices().enumerate() {
        if position > 0 {
            phrase.push(' ');
        }
        phrase.push_str(wordlist[index].as_ref());
    }
    Ok(phrase)
}

fn decode_phrase<S: AsRef<str>>(
    phrase: &str,
    wordlist: &[S],
) -> Result<Zeroizing<Vec<u8>>, MnemonicError> {
    let reference = REFERENCE_LANGUAGE.word_list();

    let mut mapped = Zeroizing::new(String::with_capacity(phrase.len()));
    for (position, word) in phrase.split_whitespace().enumerate() {
        let word = normalize_word(word);
        let index = wordlist
            .iter()
            .position(|candidate| *normalize_word(candidate.as_ref()) == *word)
            .ok_or(MnemonicError::UnknownWord { position })?;
        if position > 0 {
            mapped.push(' ');
        }
        mapped.push_str(reference[index]);
    }

    let mnemonic = Mnemonic::parse_in_normalized(REFERENCE_LANGUAGE, &mapped)?;
    Ok(Zeroizing::new(mnemonic.to_entropy()))
}

/// A parsed phrase in any of the BIP39 languages
pub struct SecureMnemonic {
    mnemonic: Mnemonic,
}

impl SecureMnemonic {
    /// Parses `phrase`, folding case, collapsing runs of whitespace and
    /// applying the NFKD normalization BIP39 requires.
    pub fn from_phrase(phrase: &str) -> Result<Self, MnemonicError> {
        let mut normalized = Zeroizing::new(String::with_capacity(phrase.len()));
        for word in phrase.split_whitespace() {
            if !normalized.is_empty() {
                normalized.push(' ');
            }
            normalized.push_str(&normalize_word(word));
        }

        match Mnemonic::parse_normalized(&normalized) {
            Ok(mnemonic) => Ok(Self { mnemonic }),
            Err(_) => Err(MnemonicError::InvalidMnemonic),
        }
    }

    pub fn word_count(&self) -> usize {
        self.mnemonic.word_count()
    }

    /// The BIP39 seed, with an empty passphrase
    pub fn to_seed(&self) -> Zeroizing<[u8; 64]> {
        Zeroizing::new(self.mnemonic.to_seed_normalized(""))
    }
}
