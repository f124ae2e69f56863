//! An iterable implementation of a set that stores its content directly on the persistent storage.
mod impls;

use std::borrow::Borrow;

use super::lookup_map::to_key;
use super::{inconsistent_state, nested_prefix, vec, Vector};
use borsh::{BorshDeserialize, BorshSerialize};

const ELEMENTS_SUFFIX: u8 = b'e';
const INDEX_SUFFIX: u8 = b'i';

/// An iterable implementation of a set that stores its content directly on the persistent storage.
///
/// Elements are kept in a [`Vector`] under `prefix ++ "e"`. For every element the raw
/// little-endian `u32` of its position is stored under `prefix ++ "i" ++ borsh(element)`,
/// which serves both membership checks and O(1) removal.
pub struct UnorderedSet<T>
where
    T: BorshSerialize + BorshDeserialize,
{
    prefix: Box<[u8]>,
    element_index_prefix: Box<[u8]>,
    elements: Vector<T>,
}

impl<T> BorshSerialize for UnorderedSet<T>
where
    T: BorshSerialize + BorshDeserialize,
{
    fn serialize<W: borsh::maybestd::io::Write>(
        &self,
        writer: &mut W,
    ) -> Result<(), borsh::maybestd::io::Error> {
        BorshSerialize::serialize(&self.prefix, writer)?;
        BorshSerialize::serialize(&self.elements.len(), writer)?;
        Ok(())
    }
}

impl<T> BorshDeserialize for UnorderedSet<T>
where
    T: BorshSerialize + BorshDeserialize,
{
    fn deserialize(buf: &mut &[u8]) -> Result<Self, borsh::maybestd::io::Error> {
        let prefix: Vec<u8> = BorshDeserialize::deserialize(buf)?;
        let len: u32 = BorshDeserialize::deserialize(buf)?;
        Ok(Self::from_raw_parts(prefix, len))
    }
}

impl<T> UnorderedSet<T>
where
    T: BorshSerialize + BorshDeserialize,
{
    /// Creates a new set. Uses `prefix` as a unique prefix for keys.
    pub fn new(prefix: Vec<u8>) -> Self {
        Self::from_raw_parts(prefix, 0)
    }

    fn from_raw_parts(prefix: Vec<u8>, len: u32) -> Self {
        Self {
            element_index_prefix: nested_prefix(&prefix, INDEX_SUFFIX).into_boxed_slice(),
            elements: Vector::from_raw_parts(nested_prefix(&prefix, ELEMENTS_SUFFIX), len),
            prefix: prefix.into_boxed_slice(),
        }
    }

    /// Returns the unique byte prefix the set was created with.
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Returns the number of elements in the set.
    pub fn len(&self) -> u32 {
        self.elements.len()
    }

    /// Returns `true` if the set contains no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn index_lookup_key<Q: ?Sized>(&self, element: &Q) -> Vec<u8>
    where
        Q: BorshSerialize,
    {
        to_key(&self.element_index_prefix, element)
    }

    fn raw_index_lookup_key(&self, serialized_element: &[u8]) -> Vec<u8> {
        [&self.element_index_prefix[..], serialized_element].concat()
    }

    /// Returns true if the set contains a value.
    pub fn contains<Q: ?Sized>(&self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: BorshSerialize,
    {
        crate::storage_has_key(&self.index_lookup_key(element))
    }

    /// Adds a value to the set.
    ///
    /// Returns whether the value was newly inserted. That is:
    ///
    /// * If the set did not previously contain this value, true is returned.
    /// * If the set already contained this value, false is returned.
    pub fn insert(&mut self, element: T) -> bool {
        let index_lookup = self.index_lookup_key(&element);
        if crate::storage_has_key(&index_lookup) {
            return false;
        }

        crate::storage_write_raw(&index_lookup, &self.elements.len().to_le_bytes());
        self.elements.push(element);
        true
    }

    /// Removes a value from the set. Returns whether the value was present in the set.
    ///
    /// The last element takes the place of the removed one, so iteration order changes.
    pub fn remove<Q: ?Sized>(&mut self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: BorshSerialize,
    {
        let index_lookup = self.index_lookup_key(element);
        let index_raw = match crate::storage_read(&index_lookup) {
            Some(index_raw) => index_raw,
            None => return false,
        };
        let index = match <[u8; 4]>::try_from(index_raw.as_slice()) {
            Ok(bytes) => u32::from_le_bytes(bytes),
            Err(_) => inconsistent_state(&index_lookup),
        };

        if self.len() == 1 {
            // A single element is removed without any swapping.
            crate::storage_remove_raw(&index_lookup);
        } else {
            let last_element = self
                .elements
                .get_raw(self.len() - 1)
                .unwrap_or_else(|| crate::abort());
            crate::storage_remove_raw(&index_lookup);

            // The last element moves into the freed slot unless it is the one being removed.
            let last_lookup = self.raw_index_lookup_key(&last_element);
            if last_lookup != index_lookup {
                crate::storage_write_raw(&last_lookup, &index_raw);
            }
        }

        if self.elements.swap_remove(index).is_err() {
            inconsistent_state(&index_lookup);
        }
        true
    }

    /// Removes every element together with its index entry.
    pub fn clear(&mut self) {
        for index in 0..self.elements.len() {
            let element = self.elements.get_raw(index).unwrap_or_else(|| crate::abort());
            crate::storage_remove_raw(&self.raw_index_lookup_key(&element));
        }
        self.elements.clear();
    }

    /// Returns an iterator over the elements, in insertion order as altered by removals.
    pub fn iter(&self) -> vec::Iter<'_, T> {
        self.elements.iter()
    }

    /// Loads every element into a [`std::vec::Vec`].
    pub fn to_vec(&self) -> Vec<T> {
        self.elements.to_vec()
    }
}

//====================================================== TESTS =================================================================
