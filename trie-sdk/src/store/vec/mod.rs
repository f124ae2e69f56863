//! An iterable implementation of vector that stores its content to the persistent storage.
mod impls;
mod iter;

pub use self::iter::Iter;

use std::marker::PhantomData;

use super::{deserialize_element, inconsistent_state, serialize_element, StoreError};
use borsh::{BorshDeserialize, BorshSerialize};

const ERR_INDEX_OUT_OF_BOUNDS: &str = "Index out of bounds";

/// An iterable implementation of vector that stores its content to the persistent storage.
/// Uses the following map: index -> element.
///
/// The element at index `i` lives under `prefix ++ le32(i)`. The length is cached in the
/// structure and is authoritative, so the vector has to be stored back (for instance as a
/// field of the contract state) after it changed.
pub struct Vector<T>
where
    T: BorshSerialize + BorshDeserialize,
{
    pub(crate) len: u32,
    pub(crate) prefix: Box<[u8]>,
    marker: PhantomData<T>,
}

impl<T> BorshSerialize for Vector<T>
where
    T: BorshSerialize + BorshDeserialize,
{
    fn serialize<W: borsh::maybestd::io::Write>(
        &self,
        writer: &mut W,
    ) -> Result<(), borsh::maybestd::io::Error> {
        BorshSerialize::serialize(&self.len, writer)?;
        BorshSerialize::serialize(&self.prefix, writer)?;
        Ok(())
    }
}

impl<T> BorshDeserialize for Vector<T>
where
    T: BorshSerialize + BorshDeserialize,
{
    fn deserialize(buf: &mut &[u8]) -> Result<Self, borsh::maybestd::io::Error> {
        Ok(Self {
            len: BorshDeserialize::deserialize(buf)?,
            prefix: BorshDeserialize::deserialize(buf)?,
            marker: PhantomData,
        })
    }
}

impl<T> Vector<T>
where
    T: BorshSerialize + BorshDeserialize,
{
    /// Creates a new vector with zero length. Uses `prefix` as a unique prefix for indices.
    pub fn new(prefix: Vec<u8>) -> Self {
        Self {
            len: 0,
            prefix: prefix.into_boxed_slice(),
            marker: PhantomData,
        }
    }

    /// Restores a view over an existing vector from its prefix and length.
    pub(crate) fn from_raw_parts(prefix: Vec<u8>, len: u32) -> Self {
        Self {
            len,
            prefix: prefix.into_boxed_slice(),
            marker: PhantomData,
        }
    }

    /// Returns the number of elements in the vector, also referred to as its 'length'.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Returns `true` if the vector contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the unique byte prefix used for key generation.
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    fn index_to_lookup_key(&self, index: u32) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.prefix.len() + 4);
        buf.extend_from_slice(&self.prefix);
        buf.extend_from_slice(&index.to_le_bytes());
        buf
    }

    fn check_index(&self, index: u32) -> Result<(), StoreError> {
        if index >= self.len() {
            return Err(StoreError::IndexOutOfBounds {
                index,
                len: self.len(),
            });
        }
        Ok(())
    }

    /// Returns the element at `index` or `None` if out of bounds.
    pub fn get(&self, index: u32) -> Option<T> {
        self.get_raw(index).map(|raw| deserialize_element(&raw))
    }

    pub(crate) fn get_raw(&self, index: u32) -> Option<Vec<u8>> {
        if index >= self.len() {
            return None;
        }
        let key = self.index_to_lookup_key(index);
        match crate::storage_read(&key) {
            Some(raw) => Some(raw),
            None => inconsistent_state(&key),
        }
    }

    /// Appends an element to the back of a collection.
    ///
    /// # Panic
    ///
    /// Panics if the new length exceeds [`u32::MAX`].
    pub fn push(&mut self, element: T) {
        let key = self.index_to_lookup_key(self.len());
        self.len = self
            .len
            .checked_add(1)
            .unwrap_or_else(|| crate::panic(ERR_INDEX_OUT_OF_BOUNDS));
        crate::storage_write_raw(&key, &serialize_element(&element));
    }

    /// Overwrites the element at `index` and returns the element it replaced.
    pub fn replace(&mut self, index: u32, element: T) -> Result<T, StoreError> {
        self.check_index(index)?;

        let key = self.index_to_lookup_key(index);
        match crate::storage_write(&key, &serialize_element(&element)) {
            Some(evicted) => Ok(deserialize_element(&evicted)),
            None => inconsistent_state(&key),
        }
    }

    /// Removes the last element from a vector and returns it, or `None` if it is empty.
    pub fn pop(&mut self) -> Option<T> {
        self.pop_raw().map(|raw| deserialize_element(&raw))
    }

    fn pop_raw(&mut self) -> Option<Vec<u8>> {
        if self.is_empty() {
            return None;
        }

        let last_idx = self.len() - 1;
        let last_key = self.index_to_lookup_key(last_idx);
        self.len = last_idx;
        match crate::storage_remove(&last_key) {
            Some(evicted) => Some(evicted),
            None => inconsistent_state(&last_key),
        }
    }

    /// Removes an element from the vector and returns it.
    ///
    /// The removed element is replaced by the last element of the vector.
    ///
    /// This does not preserve ordering, but is O(1).
    pub fn swap_remove(&mut self, index: u32) -> Result<T, StoreError> {
        self.check_index(index)?;

        if index == self.len() - 1 {
            return Ok(self.pop().unwrap_or_else(|| crate::abort()));
        }

        // The last element is moved as raw bytes, it never has to be decoded.
        let last = self.pop_raw().unwrap_or_else(|| crate::abort());
        let key = self.index_to_lookup_key(index);
        match crate::storage_write(&key, &last) {
            Some(evicted) => Ok(deserialize_element(&evicted)),
            None => inconsistent_state(&key),
        }
    }

    /// Removes every element from storage, one slot at a time.
    pub fn clear(&mut self) {
        for index in 0..self.len() {
            crate::storage_remove_raw(&self.index_to_lookup_key(index));
        }
        self.len = 0;
    }

    /// Returns an iterator over the elements present at the moment of the call.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Loads every element into a [`std::vec::Vec`].
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}

//====================================================== TESTS =================================================================
