//! Batch partitioning for staged scanning.

/// Splits `items` into consecutive batches of `size` elements.
///
/// The last batch holds the remainder. Concatenating the batches in order
/// reproduces `items`. A `size` of zero yields no batches at all rather
/// than an error.
///
/// # Examples
///
/// ```
/// use tls_scrape::batch::chunk;
///
/// let batches = chunk(&["a", "b", "c"], 2);
/// assert_eq!(batches, vec![vec!["a", "b"], vec!["c"]]);
/// assert!(chunk(&["a"], 0).is_empty());
/// ```
pub fn chunk<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    if size == 0 {
        return Vec::new();
    }
    items.chunks(size).map(<[T]>::to_vec).collect()
}
