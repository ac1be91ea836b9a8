//! Key generation and validation
//!
//! Generates EVM key pairs from BIP-39 mnemonics and validates address and
//! private key strings. Everything here is pure: no network, no storage.
//!
//! Key generation takes its RNG as a parameter bounded by [`CryptoRng`], so a
//! seeded `StdRng` can be injected in tests while non-cryptographic
//! generators are rejected at compile time.

use std::str::FromStr;

use alloy::primitives::{hex, Address};
use alloy::signers::local::coins_bip39::{English, Mnemonic};
use alloy::signers::local::{MnemonicBuilder, PrivateKeySigner};
use lazy_static::lazy_static;
use rand::rngs::StdRng;
use rand::{CryptoRng, Rng, RngCore, SeedableRng};
use regex::Regex;
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::types::{round_amount, AmountRange, WalletRecord};

/// Upper bound on wallets generated per request
pub const MAX_WALLETS_PER_BATCH: usize = 100;

lazy_static! {
    static ref ADDRESS_PATTERN: Regex =
        Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("address pattern compiles");
    static ref PRIVATE_KEY_PATTERN: Regex =
        Regex::new(r"^0x[0-9a-fA-F]{64}$").expect("private key pattern compiles");
}

/// Generate `count` wallets with amounts drawn from `range`
///
/// Uses a generator seeded from the operating system.
pub fn generate(count: usize, range: AmountRange) -> Result<Vec<WalletRecord>> {
    let mut rng = StdRng::from_entropy();
    generate_with(count, range, &mut rng)
}

/// Generate `count` wallets using the supplied cryptographic RNG
pub fn generate_with<R>(count: usize, range: AmountRange, rng: &mut R) -> Result<Vec<WalletRecord>>
where
    R: RngCore + CryptoRng,
{
    if count == 0 || count > MAX_WALLETS_PER_BATCH {
        return Err(Error::InvalidParameter(format!(
            "wallet count must be between 1 and {}, got {}",
            MAX_WALLETS_PER_BATCH, count
        )));
    }
    range.validate()?;

    let mut wallets = Vec::with_capacity(count);
    for _ in 0..count {
        let mnemonic = Mnemonic::<English>::new(rng);
        let phrase = mnemonic.to_phrase();
        let signer = signer_from_mnemonic(&phrase)?;

        let amount = draw_amount(&range, rng);
        let wallet = WalletRecord::new(
            signer.address().to_checksum(None),
            hex::encode_prefixed(signer.to_bytes()),
            Some(phrase),
            amount,
        );
        debug!("Generated wallet {} (amount {})", wallet.short_address(), amount);
        wallets.push(wallet);
    }

    info!("Generated {} wallets", wallets.len());
    Ok(wallets)
}

/// Derive the signer for the first account (`m/44'/60'/0'/0/0`) of a phrase
pub fn signer_from_mnemonic(phrase: &str) -> Result<PrivateKeySigner> {
    MnemonicBuilder::<English>::default()
        .phrase(phrase)
        .build()
        .map_err(|e| Error::KeyDerivation(e.to_string()))
}

/// Draw a trade amount uniformly from the range at fixed precision
fn draw_amount<R: Rng>(range: &AmountRange, rng: &mut R) -> f64 {
    let raw = rng.gen_range(range.min..=range.max);
    round_amount(raw).clamp(range.min, range.max)
}

/// Check an address string: `0x` + 40 hex, EIP-55 checksum when mixed case
pub fn validate_address(candidate: &str) -> bool {
    if !ADDRESS_PATTERN.is_match(candidate) {
        return false;
    }

    let body = &candidate[2..];
    let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());

    if has_lower && has_upper {
        Address::parse_checksummed(candidate, None).is_ok()
    } else {
        Address::from_str(candidate).is_ok()
    }
}

/// Check a private key string: `0x` + 64 hex holding a valid secp256k1 scalar
///
/// The parsed key is dropped immediately.
pub fn validate_private_key(candidate: &str) -> bool {
    PRIVATE_KEY_PATTERN.is_match(candidate) && PrivateKeySigner::from_str(candidate).is_ok()
}
