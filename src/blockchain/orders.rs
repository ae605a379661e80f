// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! iExec orders and their EIP-712 signatures.
//!
//! A dataset order is the off-chain authorization that lets an (app, user)
//! pair consume a protected data. It is signed by the dataset owner against
//! the PoCo hub domain (`iExecODB` / `5.0.0`) and published on the market.

use std::borrow::Cow;

use alloy::{
    primitives::{b256, keccak256, Address, Bytes, B256, U256},
    signers::{local::PrivateKeySigner, Signer},
    sol_types::{Eip712Domain, SolStruct},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::client::ChainError;
use super::contracts::{
    DatasetOrder, DatasetOrderOperation, IDataProtectorSharing, IexecHub,
};

/// Tag requiring a TEE (Scone) worker.
pub const TEE_SCONE_TAG: B256 =
    b256!("0000000000000000000000000000000000000000000000000000000000000003");

/// `OrderOperationEnum.CLOSE` in PoCo.
pub const ORDER_OPERATION_CLOSE: u8 = 1;

const DOMAIN_NAME: &str = "iExecODB";
const DOMAIN_VERSION: &str = "5.0.0";

/// EIP-712 domain of the PoCo hub.
pub fn order_domain(chain_id: u64, hub: Address) -> Eip712Domain {
    Eip712Domain::new(
        Some(Cow::Borrowed(DOMAIN_NAME)),
        Some(Cow::Borrowed(DOMAIN_VERSION)),
        Some(U256::from(chain_id)),
        Some(hub),
        None,
    )
}

/// Fresh random order salt.
pub fn random_salt() -> B256 {
    keccak256(Uuid::new_v4().as_bytes())
}

/// A dataset order together with its owner's signature, as exchanged with
/// the market API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedDatasetOrder {
    pub dataset: Address,
    pub datasetprice: u64,
    pub volume: u64,
    pub tag: B256,
    pub apprestrict: Address,
    pub workerpoolrestrict: Address,
    pub requesterrestrict: Address,
    pub salt: B256,
    pub sign: Bytes,
}

impl SignedDatasetOrder {
    /// The typed-data part of the order (everything but the signature).
    pub fn unsigned(&self) -> DatasetOrder {
        DatasetOrder {
            dataset: self.dataset,
            datasetprice: U256::from(self.datasetprice),
            volume: U256::from(self.volume),
            tag: self.tag,
            apprestrict: self.apprestrict,
            workerpoolrestrict: self.workerpoolrestrict,
            requesterrestrict: self.requesterrestrict,
            salt: self.salt,
        }
    }

    /// ABI form expected by `manageDatasetOrder`.
    pub fn to_abi(&self) -> IexecHub::SignedDatasetOrder {
        IexecHub::SignedDatasetOrder {
            dataset: self.dataset,
            datasetprice: U256::from(self.datasetprice),
            volume: U256::from(self.volume),
            tag: self.tag,
            apprestrict: self.apprestrict,
            workerpoolrestrict: self.workerpoolrestrict,
            requesterrestrict: self.requesterrestrict,
            salt: self.salt,
            sign: self.sign.clone(),
        }
    }

    /// EIP-712 hash identifying the order on the hub and the market.
    pub fn order_hash(&self, domain: &Eip712Domain) -> B256 {
        self.unsigned().eip712_signing_hash(domain)
    }
}

/// A signed workerpool order, as published on the market API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerpoolOrder {
    pub workerpool: Address,
    pub workerpoolprice: u64,
    pub volume: u64,
    pub tag: B256,
    pub category: u64,
    pub trust: u64,
    pub apprestrict: Address,
    pub datasetrestrict: Address,
    pub requesterrestrict: Address,
    pub salt: B256,
    pub sign: Bytes,
}

impl WorkerpoolOrder {
    pub fn to_abi(&self) -> IDataProtectorSharing::WorkerpoolOrder {
        IDataProtectorSharing::WorkerpoolOrder {
            workerpool: self.workerpool,
            workerpoolprice: U256::from(self.workerpoolprice),
            volume: U256::from(self.volume),
            tag: self.tag,
            category: U256::from(self.category),
            trust: U256::from(self.trust),
            apprestrict: self.apprestrict,
            datasetrestrict: self.datasetrestrict,
            requesterrestrict: self.requesterrestrict,
            salt: self.salt,
            sign: self.sign.clone(),
        }
    }
}

/// Sign a dataset order with the owner's key.
pub async fn sign_dataset_order(
    signer: &PrivateKeySigner,
    order: DatasetOrder,
    domain: &Eip712Domain,
) -> Result<SignedDatasetOrder, ChainError> {
    let hash = order.eip712_signing_hash(domain);
    let signature = signer
        .sign_hash(&hash)
        .await
        .map_err(|e| ChainError::Signing(e.to_string()))?;

    Ok(SignedDatasetOrder {
        dataset: order.dataset,
        datasetprice: order.datasetprice.saturating_to(),
        volume: order.volume.saturating_to(),
        tag: order.tag,
        apprestrict: order.apprestrict,
        workerpoolrestrict: order.workerpoolrestrict,
        requesterrestrict: order.requesterrestrict,
        salt: order.salt,
        sign: Bytes::from(signature.as_bytes().to_vec()),
    })
}

/// Sign the request closing (cancelling) `order`.
pub async fn sign_close_operation(
    signer: &PrivateKeySigner,
    order: &SignedDatasetOrder,
    domain: &Eip712Domain,
) -> Result<IexecHub::DatasetOrderOperationRequest, ChainError> {
    let operation = DatasetOrderOperation {
        order: order.unsigned(),
        operation: U256::from(ORDER_OPERATION_CLOSE),
    };
    let hash = operation.eip712_signing_hash(domain);
    let signature = signer
        .sign_hash(&hash)
        .await
        .map_err(|e| ChainError::Signing(e.to_string()))?;

    Ok(IexecHub::DatasetOrderOperationRequest {
        order: order.to_abi(),
        operation: ORDER_OPERATION_CLOSE,
        sign: Bytes::from(signature.as_bytes().to_vec()),
    })
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;

    const HUB: Address = address!("3eca1b216a7df1c7689aeb259ffb83adfb894e7f");
    const TEST_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn signer() -> PrivateKeySigner {
        TEST_KEY.parse().unwrap()
    }

    fn order() -> DatasetOrder {
        DatasetOrder {
            dataset: address!("1111111111111111111111111111111111111111"),
            datasetprice: U256::ZERO,
            volume: U256::from(10),
            tag: TEE_SCONE_TAG,
            apprestrict: address!("2222222222222222222222222222222222222222"),
            workerpoolrestrict: Address::ZERO,
            requesterrestrict: Address::ZERO,
            salt: B256::repeat_byte(0x42),
        }
    }

    #[test]
    fn salts_are_unique() {
        assert_ne!(random_salt(), random_salt());
    }

    #[tokio::test]
    async fn signature_recovers_to_signer() {
        let signer = signer();
        let domain = order_domain(134, HUB);

        let signed = sign_dataset_order(&signer, order(), &domain).await.unwrap();
        assert_eq!(signed.sign.len(), 65);
        assert_eq!(signed.volume, 10);
        assert_eq!(signed.unsigned(), order());

        let signature = alloy::primitives::Signature::try_from(signed.sign.as_ref()).unwrap();
        let recovered = signature
            .recover_address_from_prehash(&signed.order_hash(&domain))
            .unwrap();
        assert_eq!(recovered, signer.address());
    }

    #[test]
    fn order_hash_depends_on_domain() {
        let signed = SignedDatasetOrder {
            dataset: order().dataset,
            datasetprice: 0,
            volume: 10,
            tag: TEE_SCONE_TAG,
            apprestrict: order().apprestrict,
            workerpoolrestrict: Address::ZERO,
            requesterrestrict: Address::ZERO,
            salt: B256::repeat_byte(0x42),
            sign: Bytes::new(),
        };
        assert_ne!(
            signed.order_hash(&order_domain(134, HUB)),
            signed.order_hash(&order_domain(1, HUB))
        );
    }

    #[tokio::test]
    async fn close_operation_is_signed() {
        let signer = signer();
        let domain = order_domain(134, HUB);
        let signed = sign_dataset_order(&signer, order(), &domain).await.unwrap();

        let request = sign_close_operation(&signer, &signed, &domain).await.unwrap();
        assert_eq!(request.operation, ORDER_OPERATION_CLOSE);
        assert_eq!(request.sign.len(), 65);
        assert_eq!(request.order.sign, signed.sign);
    }
}
