// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use serde::Serialize;

/// Every SDK operation that talks to a remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    // core
    GetProtectedData,
    GrantAccess,
    GetGrantedAccess,
    RevokeOneAccess,
    RevokeAllAccess,
    TransferOwnership,
    WaitForTaskCompletion,
    GetUserVoucher,

    // sharing
    CreateCollection,
    RemoveCollection,
    AddToCollection,
    RemoveProtectedDataFromCollection,
    SetProtectedDataToRenting,
    RemoveProtectedDataFromRenting,
    RentProtectedData,
    SetProtectedDataForSale,
    RemoveProtectedDataForSale,
    BuyProtectedData,
    SetSubscriptionParams,
    SetProtectedDataToSubscription,
    RemoveProtectedDataFromSubscription,
    SubscribeToCollection,
    ConsumeProtectedData,
    CreateAppWhitelist,
    AddAppToAppWhitelist,
    GetCollectionsByOwner,
    GetCollectionSubscriptions,
    GetProtectedDataRentals,
    GetProtectedDataInCollections,
    GetProtectedDataPricingParams,
}

impl Operation {
    /// API name of the operation.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::GetProtectedData => "getProtectedData",
            Operation::GrantAccess => "grantAccess",
            Operation::GetGrantedAccess => "getGrantedAccess",
            Operation::RevokeOneAccess => "revokeOneAccess",
            Operation::RevokeAllAccess => "revokeAllAccess",
            Operation::TransferOwnership => "transferOwnership",
            Operation::WaitForTaskCompletion => "waitForTaskCompletion",
            Operation::GetUserVoucher => "getUserVoucher",
            Operation::CreateCollection => "createCollection",
            Operation::RemoveCollection => "removeCollection",
            Operation::AddToCollection => "addToCollection",
            Operation::RemoveProtectedDataFromCollection => "removeProtectedDataFromCollection",
            Operation::SetProtectedDataToRenting => "setProtectedDataToRenting",
            Operation::RemoveProtectedDataFromRenting => "removeProtectedDataFromRenting",
            Operation::RentProtectedData => "rentProtectedData",
            Operation::SetProtectedDataForSale => "setProtectedDataForSale",
            Operation::RemoveProtectedDataForSale => "removeProtectedDataForSale",
            Operation::BuyProtectedData => "buyProtectedData",
            Operation::SetSubscriptionParams => "setSubscriptionParams",
            Operation::SetProtectedDataToSubscription => "setProtectedDataToSubscription",
            Operation::RemoveProtectedDataFromSubscription => {
                "removeProtectedDataFromSubscription"
            }
            Operation::SubscribeToCollection => "subscribeToCollection",
            Operation::ConsumeProtectedData => "consumeProtectedData",
            Operation::CreateAppWhitelist => "createAppWhitelist",
            Operation::AddAppToAppWhitelist => "addAppToAppWhitelist",
            Operation::GetCollectionsByOwner => "getCollectionsByOwner",
            Operation::GetCollectionSubscriptions => "getCollectionSubscriptions",
            Operation::GetProtectedDataRentals => "getProtectedDataRentals",
            Operation::GetProtectedDataInCollections => "getProtectedDataInCollections",
            Operation::GetProtectedDataPricingParams => "getProtectedDataPricingParams",
        }
    }

    /// Message prefixed to every failure of the operation.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Operation::GetProtectedData => "Failed to fetch protected data",
            Operation::GrantAccess => "Failed to grant access",
            Operation::GetGrantedAccess => "Failed to fetch granted access",
            Operation::RevokeOneAccess => "Failed to revoke access",
            Operation::RevokeAllAccess => "Failed to revoke all access",
            Operation::TransferOwnership => "Failed to transfer protectedData ownership",
            Operation::WaitForTaskCompletion => "Failed to wait for task completion",
            Operation::GetUserVoucher => "Failed to get user voucher",
            Operation::CreateCollection => "Failed to create collection",
            Operation::RemoveCollection => "Failed to remove collection",
            Operation::AddToCollection => "Failed to add protected data to collection",
            Operation::RemoveProtectedDataFromCollection => {
                "Failed to remove protected data from collection"
            }
            Operation::SetProtectedDataToRenting => "Failed to set protected data to renting",
            Operation::RemoveProtectedDataFromRenting => {
                "Failed to remove protected data from renting"
            }
            Operation::RentProtectedData => "Failed to rent protected data",
            Operation::SetProtectedDataForSale => "Failed to set protected data for sale",
            Operation::RemoveProtectedDataForSale => "Failed to remove protected data for sale",
            Operation::BuyProtectedData => "Failed to buy protected data",
            Operation::SetSubscriptionParams => "Failed to set subscription params",
            Operation::SetProtectedDataToSubscription => {
                "Failed to set protected data to subscription"
            }
            Operation::RemoveProtectedDataFromSubscription => {
                "Failed to remove protected data from subscription"
            }
            Operation::SubscribeToCollection => "Failed to subscribe to collection",
            Operation::ConsumeProtectedData => "Failed to consume protected data",
            Operation::CreateAppWhitelist => "Failed to create app whitelist",
            Operation::AddAppToAppWhitelist => "Failed to add app to app whitelist",
            Operation::GetCollectionsByOwner => "Failed to get collections by owner",
            Operation::GetCollectionSubscriptions => "Failed to get collection subscriptions",
            Operation::GetProtectedDataRentals => "Failed to get protected data rentals",
            Operation::GetProtectedDataInCollections => {
                "Failed to get protected data in collections"
            }
            Operation::GetProtectedDataPricingParams => {
                "Failed to get protected data pricing params"
            }
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
