//! # Set module
//!
//! This module provides order preserving set operations over slices

/// returns elements of `a` that are not present in `b`, in the order of `a`
pub fn difference<T>(a: &[T], b: &[T]) -> Vec<T>
where
    T: PartialEq + Clone,
{
    a.iter().filter(|v| !b.contains(v)).cloned().collect()
}

/// returns elements of `a` that are also present in `b`, in the order of `a`.
///
/// An element of `a` is emitted once per matching element of `b`, so
/// duplicates in `b` are reflected in the output.
pub fn intersection<T>(a: &[T], b: &[T]) -> Vec<T>
where
    T: PartialEq + Clone,
{
    a.iter()
        .flat_map(|v| b.iter().filter(move |w| *w == v).map(move |_| v.to_owned()))
        .collect()
}
