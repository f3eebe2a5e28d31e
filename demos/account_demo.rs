use bip39::Language;
use tracing_subscriber::EnvFilter;
use wallet_account::{Account, ACCOUNT_SERIALIZE_DEFAULT_VERSION};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Wallet Account Demo");
    println!("===================");

    let (phrase, timestamp) = Account::generate_phrase(Language::English.word_list());

    println!("\n⚠️  IMPORTANT: Write down your paper key and store it securely!");
    println!("Paper key: {}", phrase);
    println!("Created:   {}\n", timestamp);

    let account = Account::create_from_phrase(&phrase, timestamp, "demo-wallet")
        .ok_or("generated paper key did not produce an account")?;

    let serialization = account.serialize();
    println!("Serialization (v{}, {} bytes):", ACCOUNT_SERIALIZE_DEFAULT_VERSION, serialization.len());
    println!("{}", hex::encode(&serialization));

    let restored = Account::create_from_serialization(&serialization, account.uids())
        .ok_or("serialization is invalid; recreate the account from its paper key")?;

    println!("\nRestored account:");
    println!("uids:          {}", restored.uids());
    println!("Timestamp:     {}", restored.timestamp());
    println!("Storage id:    {}", restored.file_system_identifier());
    println!("ETH Address:   {}", restored.eth_address());
    println!(
        "Matches phrase: {}",
        Account::validate_serialization(&serialization, &phrase)
    );

    Ok(())
}
