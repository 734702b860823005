// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `gen-secret` command.

use base64::{engine::general_purpose::STANDARD, Engine};
use rand::{rngs::OsRng, RngCore};

use crate::cli::{Cli, GenSecretArgs};
use crate::error::{BinError, BinResult};

/// Smallest accepted secret size in bytes.
pub const MIN_SECRET_BYTES: usize = 16;

/// Largest accepted secret size in bytes.
pub const MAX_SECRET_BYTES: usize = 512;

/// Prints a base64 signing secret suitable for `JWT_SECRET`.
pub fn gen_secret(_cli: &Cli, args: GenSecretArgs) -> BinResult<()> {
    if !(MIN_SECRET_BYTES..=MAX_SECRET_BYTES).contains(&args.bytes) {
        return Err(BinError::invalid_argument(format!(
            "--bytes must be between {} and {}",
            MIN_SECRET_BYTES, MAX_SECRET_BYTES
        )));
    }

    println!("{}", generate_secret(args.bytes));
    Ok(())
}

/// Returns `bytes` random bytes from the OS, base64-encoded.
pub fn generate_secret(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    STANDARD.encode(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_secret_length() {
        let secret = generate_secret(32);
        assert_eq!(STANDARD.decode(&secret).unwrap().len(), 32);
        assert_ne!(secret, generate_secret(32));
    }

    #[test]
    fn test_rejects_out_of_range() {
        let cli = <Cli as clap::Parser>::parse_from(["authgate"]);
        assert!(gen_secret(&cli, GenSecretArgs { bytes: 4 }).is_err());
        assert!(gen_secret(&cli, GenSecretArgs { bytes: 4096 }).is_err());
    }
}
