//! Fixed-capacity screenshot log.

/// Append `item`, then trim from the front so at most `capacity` entries
/// remain. Order is capture order, oldest first.
pub fn append_capped<T>(list: &mut Vec<T>, item: T, capacity: usize) {
    list.push(item);
    if list.len() > capacity {
        let excess = list.len() - capacity;
        list.drain(..excess);
    }
}
