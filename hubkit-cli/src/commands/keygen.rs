//! Keygen command - create or inspect a signing key

use anyhow::Result;
use hubkit_lib::KeyPair;

use crate::ui;

pub fn run(secret: Option<&str>, json: bool, verbose: bool) -> Result<()> {
    let keypair = match secret {
        Some(secret) => KeyPair::from_secret_hex(secret)?,
        None => {
            if verbose {
                ui::info("Generating a new signing key...");
            }
            KeyPair::random()
        }
    };

    if json {
        ui::json(&serde_json::json!({
            "secret": keypair.secret_hex(),
            "publicKey": keypair.public_key().to_hex(),
            "address": keypair.address().to_string(),
        }));
        return Ok(());
    }

    ui::header("Signing Key");
    ui::key_value("Secret", &keypair.secret_hex());
    ui::key_value("Public Key", &keypair.public_key().to_hex());
    ui::key_value("Address", keypair.address().as_str());
    if secret.is_none() {
        ui::warning("Store the secret somewhere safe; it cannot be recovered");
    }

    Ok(())
}
