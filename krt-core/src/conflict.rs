//! Pre-flight ambiguity check for the unordered discipline.
//!
//! Substring matching against a set where one literal contains another is
//! ambiguous: a single line could satisfy both, or matching one could mask
//! the other. Such sets are rejected before the target is launched.
//!
//! Only literal/literal containment is checked. A literal contained in a
//! pattern-based entry of the ordered discipline is a known gap and is not
//! detected here; the ordered discipline does not need this check at all
//! because each entry is tied to a position and a full-line match.

/// Find the first conflicting pair, if any.
pub fn find_conflict(literals: &[String]) -> Option<(&str, &str)> {
    for (i, a) in literals.iter().enumerate() {
        for b in &literals[i + 1..] {
            if a.contains(b.as_str()) || b.contains(a.as_str()) {
                return Some((a, b));
            }
        }
    }
    None
}

/// True when any pair of distinct literals is in a containment relation.
pub fn has_conflicts(literals: &[String]) -> bool {
    find_conflict(literals).is_some()
}
