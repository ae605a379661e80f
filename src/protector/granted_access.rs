// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Normalized view of a dataset order.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::blockchain::SignedDatasetOrder;
use crate::error::ValidationError;

/// A granted access: every field is a lower-case string, ready to be
/// compared, displayed or sent back to [`revoke_one_access`].
///
/// [`revoke_one_access`]: super::DataProtectorCore::revoke_one_access
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantedAccess {
    pub dataset: String,
    pub datasetprice: String,
    pub volume: String,
    pub tag: String,
    pub apprestrict: String,
    pub workerpoolrestrict: String,
    pub requesterrestrict: String,
    pub salt: String,
    pub sign: String,
    pub remaining_access: u64,
}

const FIELDS: [&str; 9] = [
    "dataset",
    "datasetprice",
    "volume",
    "tag",
    "apprestrict",
    "workerpoolrestrict",
    "requesterrestrict",
    "salt",
    "sign",
];

/// Normalize any serializable order (a [`SignedDatasetOrder`], a market
/// entry or an already formatted [`GrantedAccess`]): strings are
/// lower-cased, numbers are stringified.
///
/// `remaining` overrides the remaining volume; otherwise an existing
/// `remainingAccess` is kept, falling back to the order volume.
/// Formatting is idempotent.
pub fn format_granted_access<T: Serialize>(
    order: &T,
    remaining: Option<u64>,
) -> Result<GrantedAccess, ValidationError> {
    let value = serde_json::to_value(order)
        .map_err(|e| ValidationError::new("grantedAccess", e.to_string()))?;

    let mut normalized = serde_json::Map::new();
    for field in FIELDS {
        let text = match value.get(field) {
            Some(Value::String(s)) => s.to_lowercase(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => {
                return Err(ValidationError::new(
                    format!("grantedAccess.{field}"),
                    "is a required field",
                ))
            }
        };
        normalized.insert(field.to_string(), Value::String(text));
    }

    let remaining = remaining
        .or_else(|| value.get("remainingAccess").and_then(Value::as_u64))
        .or_else(|| normalized.get("volume").and_then(|v| v.as_str()?.parse().ok()))
        .unwrap_or_default();
    normalized.insert("remainingAccess".to_string(), Value::from(remaining));

    serde_json::from_value(Value::Object(normalized))
        .map_err(|e| ValidationError::new("grantedAccess", e.to_string()))
}

impl GrantedAccess {
    /// Parse back into a signed order (for cancellation).
    pub fn to_order(&self) -> Result<SignedDatasetOrder, ValidationError> {
        let mut value = serde_json::to_value(self)
            .map_err(|e| ValidationError::new("grantedAccess", e.to_string()))?;
        for field in ["datasetprice", "volume"] {
            let parsed: u64 = value[field]
                .as_str()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| {
                    ValidationError::new(
                        format!("grantedAccess.{field}"),
                        "should be a non-negative integer",
                    )
                })?;
            value[field] = Value::from(parsed);
        }
        serde_json::from_value(value)
            .map_err(|e| ValidationError::new("grantedAccess", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, Address, Bytes, B256};

    use super::*;
    use crate::blockchain::orders::TEE_SCONE_TAG;

    fn order() -> SignedDatasetOrder {
        SignedDatasetOrder {
            dataset: address!("1111111111111111111111111111111111111111"),
            datasetprice: 0,
            volume: 10,
            tag: TEE_SCONE_TAG,
            apprestrict: address!("abcdefabcdefabcdefabcdefabcdefabcdefabcd"),
            workerpoolrestrict: Address::ZERO,
            requesterrestrict: Address::ZERO,
            salt: B256::repeat_byte(0xab),
            sign: Bytes::from(vec![0xAB, 0xCD]),
        }
    }

    #[test]
    fn formatting_is_idempotent() {
        let once = format_granted_access(&order(), Some(7)).unwrap();
        let twice = format_granted_access(&once, None).unwrap();
        assert_eq!(once, twice);
        assert_eq!(format_granted_access(&twice, Some(7)).unwrap(), once);
    }

    #[test]
    fn fields_are_lowercase_strings() {
        let access = format_granted_access(&order(), None).unwrap();
        assert_eq!(access.apprestrict, "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd");
        assert_eq!(access.datasetprice, "0");
        assert_eq!(access.volume, "10");
        assert_eq!(access.sign, "0xabcd");
        // defaults to the order volume
        assert_eq!(access.remaining_access, 10);
    }

    #[test]
    fn mixed_case_input_is_normalized() {
        let raw = serde_json::json!({
            "dataset": "0xABCDEFABCDEFABCDEFABCDEFABCDEFABCDEFABCD",
            "datasetprice": 5,
            "volume": "3",
            "tag": "0x0000000000000000000000000000000000000000000000000000000000000003",
            "apprestrict": "0x0000000000000000000000000000000000000000",
            "workerpoolrestrict": "0x0000000000000000000000000000000000000000",
            "requesterrestrict": "0x0000000000000000000000000000000000000000",
            "salt": "0xAB",
            "sign": "0xCD",
            "remainingAccess": 2
        });
        let access = format_granted_access(&raw, None).unwrap();
        assert_eq!(access.dataset, "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd");
        assert_eq!(access.datasetprice, "5");
        assert_eq!(access.remaining_access, 2);
    }

    #[test]
    fn missing_field_is_a_validation_error() {
        let err = format_granted_access(&serde_json::json!({ "dataset": "0x1" }), None).unwrap_err();
        assert_eq!(err.field, "grantedAccess.datasetprice");
    }

    #[test]
    fn formatted_access_converts_back() {
        let access = format_granted_access(&order(), None).unwrap();
        assert_eq!(access.to_order().unwrap(), order());
    }
}
