//! Fixed-size grouping of an iterator.
//!
//! Used to keep `git fetch` argument lists under host command-length limits.
//! Groups are pulled lazily from the source; at most one group is held in
//! memory at a time.

use std::iter::FusedIterator;

/// Iterator adaptor returned by [`chunks`].
#[derive(Debug, Clone)]
pub struct Chunks<I> {
    iter: I,
    size: usize,
}

/// Split `iter` into groups of `size` elements; the last group holds the
/// remainder (`1..=size` elements). Empty input yields no groups.
///
/// # Panics
///
/// Panics if `size` is zero.
pub fn chunks<I: IntoIterator>(iter: I, size: usize) -> Chunks<I::IntoIter> {
    assert!(size > 0, "chunk size must be positive");
    Chunks {
        iter: iter.into_iter(),
        size,
    }
}

impl<I: Iterator> Iterator for Chunks<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.iter.next()?;
        let mut group = Vec::with_capacity(self.size);
        group.push(first);
        group.extend(self.iter.by_ref().take(self.size - 1));
        Some(group)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lo, hi) = self.iter.size_hint();
        (
            lo.div_ceil(self.size),
            hi.map(|hi| hi.div_ceil(self.size)),
        )
    }
}

impl<I: FusedIterator> FusedIterator for Chunks<I> {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 3)]
    #[case(1, 3)]
    #[case(3, 3)]
    #[case(7, 3)]
    #[case(100, 50)]
    #[case(101, 50)]
    #[case(5, 1)]
    fn groups_concatenate_to_input(#[case] len: usize, #[case] n: usize) {
        let input: Vec<usize> = (0..len).collect();
        let groups: Vec<Vec<usize>> = chunks(input.clone(), n).collect();

        let flat: Vec<usize> = groups.iter().flatten().copied().collect();
        assert_eq!(flat, input);

        for g in &groups {
            assert!(!g.is_empty() && g.len() <= n, "group size {} out of 1..={n}", g.len());
        }
        let full = groups.iter().filter(|g| g.len() == n).count();
        assert_eq!(full, len / n);
        if let Some((last, rest)) = groups.split_last() {
            assert!(rest.iter().all(|g| g.len() == n));
            assert!(!last.is_empty());
        }
    }

    #[test]
    fn empty_input_yields_nothing() {
        let mut it = chunks(Vec::<u8>::new(), 4);
        assert!(it.next().is_none());
    }

    #[test]
    fn pulls_lazily_from_unbounded_source() {
        let first: Vec<Vec<u64>> = chunks(0u64.., 50).take(2).collect();
        assert_eq!(first[0].len(), 50);
        assert_eq!(first[1][0], 50);
    }

    #[test]
    fn size_hint_rounds_up() {
        assert_eq!(chunks(0..7, 3).size_hint(), (3, Some(3)));
    }

    #[test]
    #[should_panic(expected = "chunk size must be positive")]
    fn zero_size_panics() {
        let _ = chunks(0..3, 0);
    }
}
