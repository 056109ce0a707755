use core::ops::Deref;

/// Two values stored smallest first, so `(a, b)` and `(b, a)` compare and hash equal.
///
/// Used as the key of undirected edges.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct SortedPair<T>([T; 2]);

impl<T: Ord> SortedPair<T> {
    /// The pair of `a` and `b`, in increasing order.
    pub fn new(a: T, b: T) -> Self {
        match a.cmp(&b) {
            core::cmp::Ordering::Greater => Self([b, a]),
            _ => Self([a, b]),
        }
    }
}

impl<T> Deref for SortedPair<T> {
    type Target = [T; 2];

    fn deref(&self) -> &[T; 2] {
        &self.0
    }
}
