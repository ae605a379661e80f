// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! GraphQL documents and `where` filter builders.
//!
//! Every document takes its filter through a `$where` variable so that the
//! query text never embeds user input.

use alloy::primitives::Address;
use serde_json::{json, Map, Value};

pub const PROTECTED_DATA: &str = r#"
query ProtectedData($where: ProtectedData_filter, $first: Int!, $skip: Int!) {
  protectedDatas(where: $where, first: $first, skip: $skip, orderBy: creationTimestamp, orderDirection: desc) {
    id
    name
    owner { id }
    schema { id }
    creationTimestamp
  }
}
"#;

pub const COLLECTIONS: &str = r#"
query Collections($where: Collection_filter, $first: Int!, $skip: Int!) {
  collections(where: $where, first: $first, skip: $skip, orderBy: creationTimestamp, orderDirection: asc) {
    id
    owner { id }
    creationTimestamp
    subscriptionParams { price duration }
    protectedDatas {
      id
      name
      creationTimestamp
      isRentable
      isIncludedInSubscription
      isForSale
    }
    subscriptions {
      subscriber { id }
      creationTimestamp
      endDate
    }
  }
}
"#;

pub const COLLECTION_SUBSCRIPTIONS: &str = r#"
query CollectionSubscriptions($where: CollectionSubscription_filter, $first: Int!, $skip: Int!) {
  collectionSubscriptions(where: $where, first: $first, skip: $skip, orderBy: creationTimestamp, orderDirection: desc) {
    id
    collection { id owner { id } }
    subscriber { id }
    creationTimestamp
    endDate
  }
}
"#;

pub const PROTECTED_DATA_RENTALS: &str = r#"
query ProtectedDataRentals($where: Rental_filter, $first: Int!, $skip: Int!) {
  rentals(where: $where, first: $first, skip: $skip, orderBy: creationTimestamp, orderDirection: desc) {
    id
    renter
    protectedData { id name }
    creationTimestamp
    endDate
    rentalParams { price duration }
  }
}
"#;

pub const PROTECTED_DATA_IN_COLLECTIONS: &str = r#"
query ProtectedDataInCollections($where: ProtectedData_filter, $first: Int!, $skip: Int!) {
  protectedDatas(where: $where, first: $first, skip: $skip, orderBy: creationTimestamp, orderDirection: desc) {
    id
    name
    owner { id }
    schema { id }
    creationTimestamp
    isRentable
    isIncludedInSubscription
    isForSale
    collection { id owner { id } subscriptionParams { price duration } }
    rentalParams { price duration }
    saleParams { price }
    rentals { renter creationTimestamp endDate rentalParams { price duration } }
  }
}
"#;

pub const COLLECTION_PROTECTED_DATA: &str = r#"
query CollectionProtectedData($where: ProtectedData_filter, $first: Int!, $skip: Int!) {
  protectedDatas(where: $where, first: $first, skip: $skip) {
    id
  }
}
"#;

/// Subgraph id of a collection token.
pub fn collection_key(collection_id: u64) -> String {
    format!("{collection_id:#x}")
}

/// Subgraph id of an account or contract (lower-case hex).
pub fn address_key(address: Address) -> String {
    format!("{address:#x}")
}

/// Incrementally built `where` object.
#[derive(Debug, Default)]
pub struct Where(Map<String, Value>);

impl Where {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    /// Insert `field: value` only when `value` is present.
    pub fn opt<T: Into<Value>>(self, field: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.eq(field, value),
            None => self,
        }
    }

    /// Nested filter on a related entity (`field_: { .. }`).
    pub fn nested(mut self, field: &str, inner: Where) -> Self {
        if !inner.0.is_empty() {
            self.0.insert(format!("{field}_"), Value::Object(inner.0));
        }
        self
    }

    pub fn build(self) -> Value {
        Value::Object(self.0)
    }
}

/// Variables for a paginated query.
pub fn variables(filter: Where, first: u32, skip: u32) -> Value {
    json!({
        "where": filter.build(),
        "first": first,
        "skip": skip,
    })
}
