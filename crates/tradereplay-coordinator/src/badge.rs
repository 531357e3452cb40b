//! Toolbar badge text.

/// Largest count shown verbatim.
const MAX_BADGE_COUNT: usize = 99;

/// Badge label for a trade count: the number, or `99+` above 99.
pub fn badge_text(count: usize) -> String {
    if count > MAX_BADGE_COUNT {
        format!("{}+", MAX_BADGE_COUNT)
    } else {
        count.to_string()
    }
}
