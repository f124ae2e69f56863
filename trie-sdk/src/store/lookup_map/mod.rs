//! An implementation of a map that stores its content directly on the persistent storage.
mod impls;

use std::borrow::Borrow;
use std::marker::PhantomData;

use super::{deserialize_element, serialize_element};
use borsh::{BorshDeserialize, BorshSerialize};

/// An implementation of a map that stores its content directly on the persistent storage.
///
/// The value for key `k` lives under `prefix ++ borsh(k)`. The map keeps no length and
/// cannot be iterated; see [`crate::store::UnorderedMap`] for that.
pub struct LookupMap<K, V>
where
    K: BorshSerialize,
    V: BorshSerialize + BorshDeserialize,
{
    prefix: Box<[u8]>,
    marker: PhantomData<fn() -> (K, V)>,
}

pub(crate) fn to_key<Q: ?Sized>(prefix: &[u8], key: &Q) -> Vec<u8>
where
    Q: BorshSerialize,
{
    let mut buffer = prefix.to_vec();
    key.serialize(&mut buffer).unwrap_or_else(|_| crate::abort());
    buffer
}

impl<K, V> BorshSerialize for LookupMap<K, V>
where
    K: BorshSerialize,
    V: BorshSerialize + BorshDeserialize,
{
    fn serialize<W: borsh::maybestd::io::Write>(
        &self,
        writer: &mut W,
    ) -> Result<(), borsh::maybestd::io::Error> {
        BorshSerialize::serialize(&self.prefix, writer)
    }
}

impl<K, V> BorshDeserialize for LookupMap<K, V>
where
    K: BorshSerialize,
    V: BorshSerialize + BorshDeserialize,
{
    fn deserialize(buf: &mut &[u8]) -> Result<Self, borsh::maybestd::io::Error> {
        Ok(Self {
            prefix: BorshDeserialize::deserialize(buf)?,
            marker: PhantomData,
        })
    }
}

impl<K, V> LookupMap<K, V>
where
    K: BorshSerialize,
    V: BorshSerialize + BorshDeserialize,
{
    /// Creates a new map. Uses `prefix` as a unique prefix for keys.
    pub fn new(prefix: Vec<u8>) -> Self {
        Self {
            prefix: prefix.into_boxed_slice(),
            marker: PhantomData,
        }
    }

    /// Returns the unique byte prefix used for key generation.
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Returns the storage key of `k`.
    pub fn storage_key<Q: ?Sized>(&self, k: &Q) -> Vec<u8>
    where
        K: Borrow<Q>,
        Q: BorshSerialize,
    {
        to_key(&self.prefix, k)
    }

    /// Returns the storage key of a key that is already Borsh-serialized.
    pub(crate) fn raw_storage_key(&self, serialized_key: &[u8]) -> Vec<u8> {
        [&self.prefix[..], serialized_key].concat()
    }

    /// Returns true if the map contains a value for the specified key.
    pub fn contains_key<Q: ?Sized>(&self, k: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: BorshSerialize,
    {
        crate::storage_has_key(&self.storage_key(k))
    }

    /// Returns the value corresponding to the key.
    ///
    /// If the map doesn't have the key present, returns `None`
    pub fn get<Q: ?Sized>(&self, k: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: BorshSerialize,
    {
        crate::storage_read(&self.storage_key(k)).map(|raw| deserialize_element(&raw))
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map did not have this key present, None is returned.
    ///
    /// If the map did have this key present, the value is updated, and the old value is returned.
    pub fn insert(&mut self, k: K, v: V) -> Option<V> {
        self.insert_by_ref(&k, &v)
    }

    pub(crate) fn insert_by_ref<Q: ?Sized>(&mut self, k: &Q, v: &V) -> Option<V>
    where
        K: Borrow<Q>,
        Q: BorshSerialize,
    {
        crate::storage_write(&self.storage_key(k), &serialize_element(v))
            .map(|evicted| deserialize_element(&evicted))
    }

    /// Removes a key from the map, returning the value at the key if the key was previously in the map.
    pub fn remove<Q: ?Sized>(&mut self, k: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: BorshSerialize,
    {
        crate::storage_remove(&self.storage_key(k)).map(|evicted| deserialize_element(&evicted))
    }

    /// Inserts or removes a key-value to the map.
    ///
    /// * If `value` is `None` then the specified key is removed.
    /// * If `value` is `Some(v)` then `v` is inserted by the specified key
    ///
    /// Unlike [`Self::insert`] and [`Self::remove`] the previous value is never decoded.
    pub fn set(&mut self, key: K, value: Option<V>) {
        self.set_by_ref(&key, value.as_ref())
    }

    pub(crate) fn set_by_ref<Q: ?Sized>(&mut self, key: &Q, value: Option<&V>)
    where
        K: Borrow<Q>,
        Q: BorshSerialize,
    {
        let key = self.storage_key(key);
        match value {
            Some(value) => {
                crate::storage_write_raw(&key, &serialize_element(value));
            }
            None => {
                crate::storage_remove_raw(&key);
            }
        }
    }
}

//====================================================== TESTS =================================================================
