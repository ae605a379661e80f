// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Input Validators
//!
//! Pure, synchronous guards applied before any chain interaction. Each
//! validator receives the API field name and the raw value and returns the
//! normalized value, or a [`ValidationError`] naming the field.

use std::fmt;

use alloy::primitives::{Address, B256};

use crate::blockchain::ens::is_ens_name;
use crate::error::ValidationError;

/// Largest duration representable by the sharing contract (`uint40`).
pub const MAX_DURATION: u64 = (1u64 << 40) - 1;

pub const MIN_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 1000;

/// An identifier given either as a raw address or as an ENS name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressOrEns {
    Address(Address),
    Ens(String),
}

impl fmt::Display for AddressOrEns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressOrEns::Address(addr) => write!(f, "{addr:#x}"),
            AddressOrEns::Ens(name) => f.write_str(name),
        }
    }
}

/// An order restriction: a specific address/ENS, or `any`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restriction {
    Any,
    Only(AddressOrEns),
}

/// `0x` followed by 40 hex characters, any case.
pub fn address(field: &str, value: &str) -> Result<Address, ValidationError> {
    let trimmed = value.trim();
    if !is_hex_with_len(trimmed, 40) {
        return Err(ValidationError::new(
            field,
            "should be an ethereum address",
        ));
    }
    trimmed
        .parse::<Address>()
        .map_err(|_| ValidationError::new(field, "should be an ethereum address"))
}

/// A raw address or an ENS name (`*.eth`). ENS names are lower-cased.
pub fn address_or_ens(field: &str, value: &str) -> Result<AddressOrEns, ValidationError> {
    let trimmed = value.trim();
    if is_hex_with_len(trimmed, 40) {
        return address(field, trimmed).map(AddressOrEns::Address);
    }
    let lower = trimmed.to_ascii_lowercase();
    if is_ens_name(&lower) {
        return Ok(AddressOrEns::Ens(lower));
    }
    Err(ValidationError::new(
        field,
        "should be an ethereum address or a ENS name",
    ))
}

/// Like [`address_or_ens`], also accepting the `any` keyword.
pub fn address_or_any(field: &str, value: &str) -> Result<Restriction, ValidationError> {
    if value.trim().eq_ignore_ascii_case("any") {
        return Ok(Restriction::Any);
    }
    address_or_ens(field, value)
        .map(Restriction::Only)
        .map_err(|_| {
            ValidationError::new(
                field,
                "should be an ethereum address, a ENS name, or \"any\"",
            )
        })
}

/// Strictly positive integer.
pub fn positive_integer(field: &str, value: u64) -> Result<u64, ValidationError> {
    if value == 0 {
        return Err(ValidationError::new(
            field,
            "should be a strictly positive integer",
        ));
    }
    Ok(value)
}

/// Integer within `min..=max`.
pub fn bounded(field: &str, value: u64, min: u64, max: u64) -> Result<u64, ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::new(
            field,
            format!("should be between {min} and {max}"),
        ));
    }
    Ok(value)
}

/// Duration in seconds, strictly positive and representable as `uint40`.
pub fn duration(field: &str, value: u64) -> Result<u64, ValidationError> {
    positive_integer(field, value)?;
    bounded(field, value, 1, MAX_DURATION)
}

/// Page size for paginated reads.
pub fn page_size(field: &str, value: u32) -> Result<u32, ValidationError> {
    bounded(
        field,
        u64::from(value),
        u64::from(MIN_PAGE_SIZE),
        u64::from(MAX_PAGE_SIZE),
    )
    .map(|_| value)
}

/// `0x` followed by 64 hex characters (task ids, deal ids, salts).
pub fn bytes32(field: &str, value: &str) -> Result<B256, ValidationError> {
    let trimmed = value.trim();
    if !is_hex_with_len(trimmed, 64) {
        return Err(ValidationError::new(field, "should be a bytes32 hex string"));
    }
    trimmed
        .parse::<B256>()
        .map_err(|_| ValidationError::new(field, "should be a bytes32 hex string"))
}

/// Non-empty string, trimmed.
pub fn non_empty(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "is a required field"));
    }
    Ok(trimmed.to_string())
}

fn is_hex_with_len(value: &str, len: usize) -> bool {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .map(|hex| hex.len() == len && hex.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address as addr;

    use super::*;

    #[test]
    fn address_accepts_any_case() {
        let expected = addr!("a1b2c3d4e5f60718293a4b5c6d7e8f9012345678");
        assert_eq!(
            address("owner", "0xA1B2C3D4E5F60718293A4B5C6D7E8F9012345678").unwrap(),
            expected
        );
        assert_eq!(
            address("owner", " 0xa1b2c3d4e5f60718293a4b5c6d7e8f9012345678 ").unwrap(),
            expected
        );
    }

    #[test]
    fn address_rejects_malformed_values() {
        for bad in [
            "",
            "0x",
            "0x123",
            "a1b2c3d4e5f60718293a4b5c6d7e8f9012345678",
            "0xa1b2c3d4e5f60718293a4b5c6d7e8f901234567z",
            "0xa1b2c3d4e5f60718293a4b5c6d7e8f90123456789",
        ] {
            let err = address("owner", bad).unwrap_err();
            assert_eq!(err.field, "owner", "value {bad:?}");
        }
    }

    #[test]
    fn address_or_ens_distinguishes_both_forms() {
        assert_eq!(
            address_or_ens("protectedData", "Alice.ETH").unwrap(),
            AddressOrEns::Ens("alice.eth".to_string())
        );
        assert!(matches!(
            address_or_ens("protectedData", "0x1111111111111111111111111111111111111111"),
            Ok(AddressOrEns::Address(_))
        ));
        assert!(address_or_ens("protectedData", ".eth").is_err());
        assert!(address_or_ens("protectedData", "alice.com").is_err());
        assert!(address_or_ens("protectedData", "0x1234").is_err());
    }

    #[test]
    fn address_or_any_accepts_keyword() {
        assert_eq!(
            address_or_any("authorizedUser", "ANY").unwrap(),
            Restriction::Any
        );
        assert!(matches!(
            address_or_any("authorizedUser", "bob.eth"),
            Ok(Restriction::Only(AddressOrEns::Ens(_)))
        ));
        let err = address_or_any("authorizedUser", "everyone").unwrap_err();
        assert_eq!(err.field, "authorizedUser");
    }

    #[test]
    fn numeric_guards() {
        assert!(positive_integer("numberOfAccess", 0).is_err());
        assert_eq!(positive_integer("numberOfAccess", 3).unwrap(), 3);

        assert!(duration("duration", 0).is_err());
        assert!(duration("duration", MAX_DURATION + 1).is_err());
        assert_eq!(duration("duration", 2000).unwrap(), 2000);

        assert!(page_size("pageSize", 5).is_err());
        assert!(page_size("pageSize", 1001).is_err());
        assert_eq!(page_size("pageSize", 1000).unwrap(), 1000);

        let err = bounded("page", 11, 0, 10).unwrap_err();
        assert_eq!(err.message, "should be between 0 and 10");
    }

    #[test]
    fn bytes32_and_non_empty() {
        let task = format!("0x{}", "ab".repeat(32));
        assert!(bytes32("taskId", &task).is_ok());
        assert!(bytes32("taskId", "0xabcd").is_err());

        assert_eq!(non_empty("name", "  my data ").unwrap(), "my data");
        assert!(non_empty("name", "   ").is_err());
    }
}
