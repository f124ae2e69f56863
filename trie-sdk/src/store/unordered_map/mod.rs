//! An iterable implementation of a map that stores its content directly on the persistent storage.
mod impls;
mod iter;

pub use self::iter::Iter;

use std::borrow::Borrow;

use super::{inconsistent_state, nested_prefix, LookupMap, Vector};
use borsh::{BorshDeserialize, BorshSerialize};

const KEYS_SUFFIX: u8 = b'u';
const VALUES_SUFFIX: u8 = b'm';
const INDEX_LEN: usize = std::mem::size_of::<u32>();

/// Value stored next to the position of its key in the keys vector.
type ValueAndIndex<V> = (V, u32);

/// An iterable implementation of a map that stores its content directly on the persistent storage.
///
/// Keys are kept in a [`Vector`] under `prefix ++ "u"` and values in a [`LookupMap`] under
/// `prefix ++ "m"`. Every value is stored together with the index of its key, which lets
/// [`Self::remove`] swap-remove the key in O(1) and fix up the one key that moved.
pub struct UnorderedMap<K, V>
where
    K: BorshSerialize + BorshDeserialize,
    V: BorshSerialize + BorshDeserialize,
{
    prefix: Box<[u8]>,
    keys: Vector<K>,
    values: LookupMap<K, ValueAndIndex<V>>,
}

impl<K, V> BorshSerialize for UnorderedMap<K, V>
where
    K: BorshSerialize + BorshDeserialize,
    V: BorshSerialize + BorshDeserialize,
{
    fn serialize<W: borsh::maybestd::io::Write>(
        &self,
        writer: &mut W,
    ) -> Result<(), borsh::maybestd::io::Error> {
        BorshSerialize::serialize(&self.prefix, writer)?;
        BorshSerialize::serialize(&self.keys.len(), writer)?;
        Ok(())
    }
}

impl<K, V> BorshDeserialize for UnorderedMap<K, V>
where
    K: BorshSerialize + BorshDeserialize,
    V: BorshSerialize + BorshDeserialize,
{
    fn deserialize(buf: &mut &[u8]) -> Result<Self, borsh::maybestd::io::Error> {
        let prefix: Vec<u8> = BorshDeserialize::deserialize(buf)?;
        let len: u32 = BorshDeserialize::deserialize(buf)?;
        Ok(Self::from_raw_parts(prefix, len))
    }
}

impl<K, V> UnorderedMap<K, V>
where
    K: BorshSerialize + BorshDeserialize,
    V: BorshSerialize + BorshDeserialize,
{
    /// Creates a new map. Uses `prefix` as a unique prefix for keys.
    pub fn new(prefix: Vec<u8>) -> Self {
        Self::from_raw_parts(prefix, 0)
    }

    fn from_raw_parts(prefix: Vec<u8>, len: u32) -> Self {
        Self {
            keys: Vector::from_raw_parts(nested_prefix(&prefix, KEYS_SUFFIX), len),
            values: LookupMap::new(nested_prefix(&prefix, VALUES_SUFFIX)),
            prefix: prefix.into_boxed_slice(),
        }
    }

    /// Returns the unique byte prefix the map was created with.
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> u32 {
        self.keys.len()
    }

    /// Returns `true` if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the value corresponding to the key.
    ///
    /// If the map doesn't have the key present, returns `None`
    pub fn get<Q: ?Sized>(&self, k: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: BorshSerialize,
    {
        self.values.get(k).map(|(value, _)| value)
    }

    /// Returns true if the map contains a value for the specified key.
    pub fn contains_key<Q: ?Sized>(&self, k: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: BorshSerialize,
    {
        self.values.contains_key(k)
    }

    /// Inserts a key-value pair into the map.
    ///
    /// An existing key keeps its position and only its value is replaced; the old value is
    /// returned. A new key is appended and `None` is returned.
    pub fn insert(&mut self, k: K, v: V) -> Option<V> {
        match self.values.get(&k) {
            Some((old_value, index)) => {
                self.values.set_by_ref(&k, Some(&(v, index)));
                Some(old_value)
            }
            None => {
                let index = self.keys.len();
                self.values.set_by_ref(&k, Some(&(v, index)));
                self.keys.push(k);
                None
            }
        }
    }

    /// Removes a key from the map, returning the value at the key if the key was previously in the map.
    ///
    /// The last key takes the place of the removed one, so iteration order changes.
    pub fn remove<Q: ?Sized>(&mut self, k: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: BorshSerialize,
    {
        let (old_value, index) = self.values.remove(k)?;
        if self.keys.swap_remove(index).is_err() {
            inconsistent_state(&self.values.storage_key(k));
        }

        if index < self.keys.len() {
            // The former last key now sits at `index`. Both the key and the stored value are
            // handled as raw bytes; only the trailing index of the value is rewritten.
            let moved_key = self.keys.get_raw(index).unwrap_or_else(|| crate::abort());
            let moved_key = self.values.raw_storage_key(&moved_key);
            let mut moved_entry = crate::storage_read(&moved_key)
                .filter(|entry| entry.len() >= INDEX_LEN)
                .unwrap_or_else(|| inconsistent_state(&moved_key));
            let index_at = moved_entry.len() - INDEX_LEN;
            moved_entry[index_at..].copy_from_slice(&index.to_le_bytes());
            crate::storage_write_raw(&moved_key, &moved_entry);
        }

        Some(old_value)
    }

    /// Removes every entry. Values are deleted without being loaded.
    pub fn clear(&mut self) {
        for index in 0..self.keys.len() {
            let key = self.keys.get_raw(index).unwrap_or_else(|| crate::abort());
            crate::storage_remove_raw(&self.values.raw_storage_key(&key));
        }
        self.keys.clear();
    }

    /// Returns an iterator over the entries, in key insertion order as altered by removals.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.keys, &self.values)
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> super::vec::Iter<'_, K> {
        self.keys.iter()
    }

    /// Returns an iterator over the values.
    pub fn values(&self) -> impl Iterator<Item = V> + '_ {
        self.iter().map(|(_, value)| value)
    }

    /// Loads every entry into a [`std::vec::Vec`].
    pub fn to_vec(&self) -> Vec<(K, V)> {
        self.iter().collect()
    }
}

//====================================================== TESTS =================================================================
