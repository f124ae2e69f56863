use core::iter::FusedIterator;

use borsh::{BorshDeserialize, BorshSerialize};

use super::ValueAndIndex;
use crate::store::{inconsistent_state, vec, LookupMap, Vector};

/// An iterator over the entries of an [`super::UnorderedMap`].
///
/// Driven by the keys vector; each value is looked up as its key comes by.
pub struct Iter<'a, K, V>
where
    K: BorshSerialize + BorshDeserialize,
    V: BorshSerialize + BorshDeserialize,
{
    keys: vec::Iter<'a, K>,
    values: &'a LookupMap<K, ValueAndIndex<V>>,
}

impl<'a, K, V> Iter<'a, K, V>
where
    K: BorshSerialize + BorshDeserialize,
    V: BorshSerialize + BorshDeserialize,
{
    pub(super) fn new(keys: &'a Vector<K>, values: &'a LookupMap<K, ValueAndIndex<V>>) -> Self {
        Self {
            keys: keys.iter(),
            values,
        }
    }

    fn entry(&self, key: K) -> (K, V) {
        match self.values.get(&key) {
            Some((value, _)) => (key, value),
            None => inconsistent_state(&self.values.storage_key(&key)),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V>
where
    K: BorshSerialize + BorshDeserialize,
    V: BorshSerialize + BorshDeserialize,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.keys.next()?;
        Some(self.entry(key))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        let key = self.keys.nth(n)?;
        Some(self.entry(key))
    }
}

impl<'a, K, V> DoubleEndedIterator for Iter<'a, K, V>
where
    K: BorshSerialize + BorshDeserialize,
    V: BorshSerialize + BorshDeserialize,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        let key = self.keys.next_back()?;
        Some(self.entry(key))
    }
}

impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V>
where
    K: BorshSerialize + BorshDeserialize,
    V: BorshSerialize + BorshDeserialize,
{
}

impl<'a, K, V> FusedIterator for Iter<'a, K, V>
where
    K: BorshSerialize + BorshDeserialize,
    V: BorshSerialize + BorshDeserialize,
{
}
