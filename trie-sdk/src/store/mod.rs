//! Collections and types used when interacting with storage.
//!
//! Every collection is a view over a range of storage keys sharing the collection's prefix.
//! Nothing is kept in memory besides the prefix and, where it exists, the length; every
//! operation goes straight to storage. No two live collections may share a prefix.
mod error;
pub use self::error::StoreError;

pub mod vec;
pub use self::vec::Vector;

pub mod lookup_map;
pub use self::lookup_map::LookupMap;

pub mod unordered_map;
pub use self::unordered_map::UnorderedMap;

pub mod unordered_set;
pub use self::unordered_set::UnorderedSet;

use borsh::{BorshDeserialize, BorshSerialize};

pub(crate) const ERR_INCONSISTENT_STATE: &str = "The collection is an inconsistent state. Did previous smart contract execution terminate unexpectedly?";
const ERR_ELEMENT_SERIALIZATION: &str = "Cannot serialize element";
const ERR_ELEMENT_DESERIALIZATION: &str = "Cannot deserialize element";

/// Aborts on a broken structural invariant, logging the storage key it was detected at.
pub(crate) fn inconsistent_state(key: &[u8]) -> ! {
    crate::msg(&format!(
        "Inconsistent collection entry at storage key 0x{}",
        hex::encode(key)
    ));
    crate::panic(ERR_INCONSISTENT_STATE)
}

pub(crate) fn serialize_element<T: BorshSerialize + ?Sized>(element: &T) -> Vec<u8> {
    element
        .try_to_vec()
        .unwrap_or_else(|_| crate::panic(ERR_ELEMENT_SERIALIZATION))
}

pub(crate) fn deserialize_element<T: BorshDeserialize>(raw_element: &[u8]) -> T {
    T::try_from_slice(raw_element).unwrap_or_else(|_| crate::panic(ERR_ELEMENT_DESERIALIZATION))
}

/// Appends `suffix` to `prefix`, producing the prefix of a nested collection.
pub(crate) fn nested_prefix(prefix: &[u8], suffix: u8) -> Vec<u8> {
    let mut nested = Vec::with_capacity(prefix.len() + 1);
    nested.extend_from_slice(prefix);
    nested.push(suffix);
    nested
}
