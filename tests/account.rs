use bip39::Language;
use bitcoin_hashes::{sha256d, Hash};
use chrono::{TimeZone, Utc};
use rand::{thread_rng, RngCore};
use unicode_normalization::UnicodeNormalization;
use wallet_account::{Account, BIP39_WORDLIST_COUNT};

const PAPER_KEY: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

fn word_list() -> &'static [&'static str] {
    Language::English.word_list()
}

fn account(uids: &str) -> Account {
    let timestamp = Utc.timestamp_opt(1_514_764_800, 0).unwrap();
    Account::create_from_phrase(PAPER_KEY, timestamp, uids).unwrap()
}

#[test]
fn test_serialization_round_trip() {
    let a = account("abc123");
    let b = Account::create_from_serialization(&a.serialize(), a.uids()).unwrap();
    assert_eq!(b.serialize(), a.serialize());
    assert_eq!(b.uids(), "abc123");
    assert_eq!(b.eth_address(), a.eth_address());
}

#[test]
fn test_serialization_ignores_uids() {
    let first = account("wallet-1");
    let second = account("wallet-2");
    assert_eq!(first.serialize(), second.serialize());
}

#[test]
fn test_serialize_is_stable() {
    let account = account("uids");
    assert_eq!(account.serialize(), account.serialize());
}

#[test]
fn test_invalid_phrase() {
    assert!(Account::create_from_phrase("not a valid phrase", Utc::now(), "x").is_none());
    assert!(Account::create_from_phrase("", Utc::now(), "x").is_none());
    // Valid words, bad checksum
    let bad_checksum = PAPER_KEY.replace("about", "abandon");
    assert!(Account::create_from_phrase(&bad_checksum, Utc::now(), "x").is_none());
}

#[test]
fn test_invalid_serialization() {
    assert!(Account::create_from_serialization(&[], "x").is_none());

    let mut rng = thread_rng();
    for length in [1, 17, 64, 180, 1024] {
        let mut garbage = vec![0u8; length];
        rng.fill_bytes(&mut garbage);
        assert!(Account::create_from_serialization(&garbage, "x").is_none());
    }

    let serialization = account("x").serialize();
    assert!(Account::create_from_serialization(&serialization[..serialization.len() - 1], "x").is_none());
    let mut corrupt = serialization.clone();
    corrupt[40] ^= 0xff;
    assert!(Account::create_from_serialization(&corrupt, "x").is_none());
}

#[test]
fn test_uids_passthrough() {
    let a = account("abc123");
    assert_eq!(a.uids(), "abc123");
    let b = Account::create_from_serialization(&a.serialize(), "abc123").unwrap();
    assert_eq!(b.uids(), "abc123");
    let c = Account::create_from_serialization(&a.serialize(), "").unwrap();
    assert_eq!(c.uids(), "");
}

#[test]
fn test_timestamp_preserved() {
    let a = account("uids");
    assert_eq!(a.timestamp(), Utc.timestamp_opt(1_514_764_800, 0).unwrap());
    let b = Account::create_from_serialization(&a.serialize(), "uids").unwrap();
    assert_eq!(b.timestamp(), a.timestamp());
}

#[test]
fn test_generated_phrase_creates_account() {
    let before = Utc::now().timestamp();
    let (phrase, timestamp) = Account::generate_phrase(word_list());
    assert_eq!(phrase.split(' ').count(), 12);
    assert!(timestamp.timestamp() >= before);
    assert!(Account::validate_phrase(&phrase, word_list()));

    let account = Account::create_from_phrase(&phrase, timestamp, "x").unwrap();
    assert_eq!(account.timestamp().timestamp(), timestamp.timestamp());
}

#[test]
fn test_generated_phrase_from_owned_word_list() {
    let words: Vec<String> = word_list().iter().map(|w| w.to_string()).collect();
    let (phrase, _) = Account::generate_phrase(&words);
    assert!(phrase.split(' ').all(|w| words.iter().any(|candidate| candidate == w)));
}

#[test]
#[should_panic(expected = "word list must contain")]
fn test_generate_phrase_short_word_list() {
    Account::generate_phrase(&word_list()[..BIP39_WORDLIST_COUNT - 1]);
}

#[test]
#[should_panic(expected = "word list must contain")]
fn test_generate_phrase_empty_word_list() {
    let empty: [&str; 0] = [];
    Account::generate_phrase(&empty);
}

#[test]
fn test_validate_phrase() {
    assert!(Account::validate_phrase(PAPER_KEY, word_list()));
    assert!(!Account::validate_phrase("not a valid phrase", word_list()));
    assert!(!Account::validate_phrase(&PAPER_KEY.replace("about", "zoo"), word_list()));
}

#[test]
fn test_phrase_in_other_language() {
    let (phrase, timestamp) = Account::generate_phrase(Language::Spanish.word_list());
    assert!(Account::create_from_phrase(&phrase, timestamp, "es").is_some());
    assert!(!Account::validate_phrase(&phrase, word_list()));
}

#[test]
fn test_file_system_identifier() {
    let early = Account::create_from_phrase(PAPER_KEY, Utc.timestamp_opt(0, 0).unwrap(), "a").unwrap();
    let late = account("b");
    assert_eq!(early.file_system_identifier(), late.file_system_identifier());
    assert_ne!(early.serialize(), late.serialize());
}

#[test]
fn test_eth_address() {
    assert_eq!(
        account("x").eth_address(),
        "0x9858effd232b4033e47d90003d41ec34ecaeda94"
    );
}

#[test]
fn test_account_shared_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Account>();

    let account = std::sync::Arc::new(account("shared"));
    let expected = account.serialize();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let account = std::sync::Arc::clone(&account);
            std::thread::spawn(move || (account.serialize(), account.uids().to_string()))
        })
        .collect();
    for handle in handles {
        let (serialization, uids) = handle.join().unwrap();
        assert_eq!(serialization, expected);
        assert_eq!(uids, "shared");
    }
}

#[test]
fn test_generated_phrase_from_composed_word_list() {
    let composed: Vec<String> = Language::Spanish
        .word_list()
        .iter()
        .map(|word| word.nfc().collect())
        .collect();
    for _ in 0..50 {
        let (phrase, timestamp) = Account::generate_phrase(&composed);
        assert!(Account::validate_phrase(&phrase, &composed));
        assert!(Account::create_from_phrase(&phrase, timestamp, "es").is_some());
    }
}

#[test]
fn test_serialization_with_unrepresentable_timestamp() {
    let mut data = account("x").serialize();
    data[10..18].copy_from_slice(&(1u64 << 50).to_be_bytes());
    let hash = sha256d::Hash::hash(&data[4..]);
    let checksum: &[u8] = hash.as_ref();
    data[..4].copy_from_slice(&checksum[..4]);
    assert!(Account::create_from_serialization(&data, "x").is_none());
}
