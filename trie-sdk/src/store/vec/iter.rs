use core::iter::FusedIterator;
use core::ops::Range;

use borsh::{BorshDeserialize, BorshSerialize};

use super::Vector;

/// An iterator over the elements of a [`Vector`], loading each one from storage on demand.
///
/// The range of indices is fixed when the iterator is created.
pub struct Iter<'a, T>
where
    T: BorshSerialize + BorshDeserialize,
{
    vec: &'a Vector<T>,
    range: Range<u32>,
}

impl<'a, T> Iter<'a, T>
where
    T: BorshSerialize + BorshDeserialize,
{
    pub(super) fn new(vec: &'a Vector<T>) -> Self {
        Self {
            vec,
            range: 0..vec.len(),
        }
    }

    fn load(&self, index: u32) -> T {
        self.vec.get(index).unwrap_or_else(|| crate::abort())
    }
}

impl<'a, T> Iterator for Iter<'a, T>
where
    T: BorshSerialize + BorshDeserialize,
{
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.range.next()?;
        Some(self.load(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        let index = self.range.nth(n)?;
        Some(self.load(index))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T>
where
    T: BorshSerialize + BorshDeserialize,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        let index = self.range.next_back()?;
        Some(self.load(index))
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> where T: BorshSerialize + BorshDeserialize {}
impl<'a, T> FusedIterator for Iter<'a, T> where T: BorshSerialize + BorshDeserialize {}
