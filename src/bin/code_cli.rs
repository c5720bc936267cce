//! Issuer-side code derivation tool.
//!
//! Derives the same 6-character code the external bot hands to a player,
//! from the world name, the player's username, and the shared secret.
//! Useful for operator checks and for generating test vectors.

use anyhow::Result;
use hwlink::code::derive_code;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() != 4 || matches!(args.get(1).map(String::as_str), Some("--help" | "--h")) {
        println!("Usage: code_cli WORLD_NAME USERNAME SECRET_KEY");
        println!("Prints the verification code for the given identity.");
        return Ok(());
    }

    let code = derive_code(&args[1], &args[2], &args[3]);
    println!("{}", code);
    Ok(())
}
