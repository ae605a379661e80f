// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Contract interfaces used by the SDK.
//!
//! Declared with alloy's `sol!` macro. These are the canonical external
//! protocol: argument encoding and event layouts must match the deployed
//! contracts exactly.

use alloy::sol;

sol! {
    /// DataProtector sharing contract: collections, renting, sale and
    /// subscriptions. Collections are ERC-721 tokens of this contract.
    #[sol(rpc)]
    interface IDataProtectorSharing {
        struct RentingParams {
            uint72 price;
            uint40 duration;
        }

        struct SellingParams {
            bool isForSale;
            uint72 price;
        }

        struct SubscriptionParams {
            uint72 price;
            uint40 duration;
        }

        struct ProtectedDataDetails {
            uint256 collection;
            uint48 lastRentalExpiration;
            bool inSubscription;
            RentingParams rentingParams;
            SellingParams sellingParams;
        }

        struct CollectionDetails {
            uint48 lastSubscriptionExpiration;
            address appWhitelist;
            SubscriptionParams subscriptionParams;
        }

        struct WorkerpoolOrder {
            address workerpool;
            uint256 workerpoolprice;
            uint256 volume;
            bytes32 tag;
            uint256 category;
            uint256 trust;
            address apprestrict;
            address datasetrestrict;
            address requesterrestrict;
            bytes32 salt;
            bytes sign;
        }

        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
        event ProtectedDataConsumed(bytes32 dealId, address protectedData, uint8 mode);

        function ownerOf(uint256 tokenId) external view returns (address);
        function protectedDataDetails(address protectedData) external view returns (ProtectedDataDetails memory);
        function collectionDetails(uint256 collectionTokenId) external view returns (CollectionDetails memory);
        function getProtectedDataRenter(address protectedData, address renter) external view returns (uint48);
        function getCollectionSubscriber(uint256 collectionTokenId, address subscriber) external view returns (uint48);

        function createCollection(address to) external returns (uint256);
        function removeCollection(uint256 collectionTokenId) external;
        function addProtectedDataToCollection(uint256 collectionTokenId, address protectedData, address appWhitelist) external;
        function removeProtectedDataFromCollection(address protectedData) external;

        function setProtectedDataToRenting(address protectedData, uint72 price, uint40 duration) external;
        function removeProtectedDataFromRenting(address protectedData) external;
        function rentProtectedData(address protectedData, RentingParams calldata rentingParams) external;

        function setProtectedDataForSale(address protectedData, uint72 price) external;
        function removeProtectedDataForSale(address protectedData) external;
        function buyProtectedData(address protectedData, address to, uint72 price) external;

        function setSubscriptionParams(uint256 collectionTokenId, SubscriptionParams calldata subscriptionParams) external;
        function setProtectedDataToSubscription(address protectedData) external;
        function removeProtectedDataFromSubscription(address protectedData) external;
        function subscribeToCollection(uint256 collectionTokenId, SubscriptionParams calldata subscriptionParams) external;

        function consumeProtectedData(address protectedData, WorkerpoolOrder calldata workerpoolOrder, address app) external returns (bytes32);
    }
}

sol! {
    /// Registry of app whitelists. Each whitelist is an ERC-721 token whose
    /// id is the whitelist contract address.
    #[sol(rpc)]
    interface IAppWhitelistRegistry {
        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);

        function createAppWhitelist(address owner) external returns (address);
        function ownerOf(uint256 tokenId) external view returns (address);
    }
}

sol! {
    #[sol(rpc)]
    interface IAppWhitelist {
        function addApp(address app) external;
        function isRegistered(address app) external view returns (bool);
    }
}

sol! {
    /// iExec dataset registry. Protected data are ERC-721 tokens whose id is
    /// the dataset contract address.
    #[sol(rpc)]
    interface IDatasetRegistry {
        function ownerOf(uint256 tokenId) external view returns (address);
        function getApproved(uint256 tokenId) external view returns (address);
        function approve(address to, uint256 tokenId) external;
        function transferFrom(address from, address to, uint256 tokenId) external;
    }
}

sol! {
    /// iExec PoCo hub: accounts, order management and task records.
    #[sol(rpc)]
    interface IexecHub {
        struct Account {
            uint256 stake;
            uint256 locked;
        }

        struct SignedDatasetOrder {
            address dataset;
            uint256 datasetprice;
            uint256 volume;
            bytes32 tag;
            address apprestrict;
            address workerpoolrestrict;
            address requesterrestrict;
            bytes32 salt;
            bytes sign;
        }

        struct DatasetOrderOperationRequest {
            SignedDatasetOrder order;
            uint8 operation;
            bytes sign;
        }

        struct Task {
            uint8 status;
            bytes32 dealid;
            uint256 idx;
            uint256 timeref;
            uint256 contributionDeadline;
            uint256 revealDeadline;
            uint256 finalDeadline;
            bytes32 consensusValue;
            uint256 revealCounter;
            uint256 winnerCounter;
            address[] contributors;
            bytes32 resultDigest;
            bytes results;
            uint256 resultsTimestamp;
            bytes resultsCallback;
        }

        function viewAccount(address account) external view returns (Account memory);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 value) external returns (bool);
        function manageDatasetOrder(DatasetOrderOperationRequest calldata operation) external;
        function viewTask(bytes32 taskid) external view returns (Task memory);
    }
}

sol! {
    #[sol(rpc)]
    interface IENSRegistry {
        function resolver(bytes32 node) external view returns (address);
    }
}

sol! {
    #[sol(rpc)]
    interface IENSResolver {
        function addr(bytes32 node) external view returns (address);
    }
}

sol! {
    /// iExec voucher hub: at most one voucher per account.
    #[sol(rpc)]
    interface IVoucherHub {
        function getVoucher(address account) external view returns (address);
    }
}

sol! {
    /// Voucher sponsoring an account's computations with prepaid nRLC.
    #[sol(rpc)]
    interface IVoucher {
        function getType() external view returns (uint256);
        function getBalance() external view returns (uint256);
        function getExpiration() external view returns (uint256);
    }
}

sol! {
    #![sol(all_derives)]

    /// EIP-712 dataset order (the signature is not part of the typed data).
    #[sol(all_derives)]
    struct DatasetOrder {
        address dataset;
        uint256 datasetprice;
        uint256 volume;
        bytes32 tag;
        address apprestrict;
        address workerpoolrestrict;
        address requesterrestrict;
        bytes32 salt;
    }

    /// EIP-712 order management request.
    #[sol(all_derives)]
    struct DatasetOrderOperation {
        DatasetOrder order;
        uint256 operation;
    }

    /// EIP-712 market API authentication challenge.
    #[sol(all_derives)]
    struct Challenge {
        string challenge;
    }
}
