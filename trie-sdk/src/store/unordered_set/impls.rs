use borsh::{BorshDeserialize, BorshSerialize};

use super::UnorderedSet;
use crate::store::vec;

impl<T> Extend<T> for UnorderedSet<T>
where
    T: BorshSerialize + BorshDeserialize,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = T>,
    {
        iter.into_iter().for_each(move |elem| {
            self.insert(elem);
        });
    }
}

impl<'a, T> IntoIterator for &'a UnorderedSet<T>
where
    T: BorshSerialize + BorshDeserialize,
{
    type Item = T;
    type IntoIter = vec::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> core::fmt::Debug for UnorderedSet<T>
where
    T: BorshSerialize + BorshDeserialize,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UnorderedSet")
            .field("prefix", &self.prefix)
            .field("elements", &self.elements)
            .finish()
    }
}
