//! `deckgen check`: setup diagnostics.

use crate::config::{self, KeyStatus, API_KEY_VAR, PLACEHOLDER_KEY};
use deckgen_core::prompt::ping_prompt;
use deckgen_core::{GenerationParams, TextCompletion};
use deckgen_gemini::GeminiClient;
use std::env;
use std::path::Path;

/// Run every check and print the outcome. Returns whether all passed.
pub fn run(env_file: &Path, ping: bool) -> bool {
    let mut results = vec![
        ("env file", check_env_file(env_file)),
        ("API key", check_api_key()),
    ];

    if ping {
        let ready = results.iter().all(|(_, ok)| *ok);
        results.push(("API connection", ready && check_connection()));
    }

    println!();
    println!("Summary:");
    for (name, ok) in &results {
        println!("  {}: {}", name, if *ok { "passed" } else { "FAILED" });
    }

    results.iter().all(|(_, ok)| *ok)
}

fn check_env_file(env_file: &Path) -> bool {
    if env_file.is_file() {
        println!("✓ {} exists", env_file.display());
        true
    } else {
        println!("✗ {} not found", env_file.display());
        println!("  Copy .env.example to .env and fill in {}", API_KEY_VAR);
        false
    }
}

fn check_api_key() -> bool {
    let value = env::var(API_KEY_VAR).ok();
    match KeyStatus::inspect(value.as_deref()) {
        KeyStatus::Missing => {
            println!("✗ {} is not set", API_KEY_VAR);
            println!("  {}", missing_key_hint());
            false
        }
        KeyStatus::Placeholder => {
            println!("✗ {} is still the placeholder '{}'", API_KEY_VAR, PLACEHOLDER_KEY);
            false
        }
        KeyStatus::Unusual(key) => {
            println!("⚠ {} usually starts with 'AIza'", API_KEY_VAR);
            print_key(&key);
            true
        }
        KeyStatus::Valid(key) => {
            print_key(&key);
            true
        }
    }
}

fn missing_key_hint() -> String {
    format!("Add {}=<your key> to .env", API_KEY_VAR)
}

fn print_key(key: &str) {
    println!(
        "✓ {} is set: {} ({} chars)",
        API_KEY_VAR,
        config::mask_key(key),
        key.chars().count()
    );
}

fn check_connection() -> bool {
    let client = match config::gemini_config().map_err(|e| e.to_string()).and_then(|config| {
        log::debug!("Pinging with {:?}", config);
        GeminiClient::new(config).map_err(|e| e.to_string())
    }) {
        Ok(client) => client,
        Err(e) => {
            println!("✗ Could not set up the client: {}", e);
            return false;
        }
    };

    println!("Sending a test request...");
    match client.complete(ping_prompt(), &GenerationParams::PING) {
        Ok(reply) => {
            println!("✓ API connection works");
            println!();
            println!("Reply:");
            println!("{}", reply.trim());
            true
        }
        Err(e) => {
            println!("✗ API request failed: {}", e);
            println!("  Check the key, your network connection and the API quota.");
            false
        }
    }
}
