//! Credential naming: uniqueness and the replacement marker.
//!
//! The remote system requires credential and factor names to be unique
//! (case-insensitively) within their scope but does not enforce it, so this
//! layer generates collision-free names deterministically: the first free of
//! `base`, `base_2`, `base_3`, …
//!
//! "Replacement" credentials are distinguished purely by a marker substring
//! in the name — not a first-class attribute — and destructive workflows
//! must never delete them.

/// Marker substring identifying a replacement credential.
///
/// Matched case-insensitively anywhere in the credential name.
pub const REPLACEMENT_MARKER: &str = "Zastępcza";

/// Whether a credential name carries the replacement marker.
#[must_use]
pub fn is_replacement_name(name: &str) -> bool {
    name.to_lowercase().contains(&REPLACEMENT_MARKER.to_lowercase())
}

/// Generate a name that does not collide (case-insensitively) with any
/// existing name.
///
/// Deterministic: returns `base` if free, otherwise the first free
/// `base_2`, `base_3`, …
#[must_use]
pub fn unique_name(base: &str, existing: &[String]) -> String {
    let taken: Vec<String> = existing.iter().map(|name| name.to_lowercase()).collect();

    if !taken.contains(&base.to_lowercase()) {
        return base.to_owned();
    }

    let mut suffix = 2u64;
    loop {
        let candidate = format!("{base}_{suffix}");
        if !taken.contains(&candidate.to_lowercase()) {
            return candidate;
        }
        suffix += 1;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn base_returned_when_free() {
        assert_eq!(unique_name("Card EMP-1", &[]), "Card EMP-1");
        assert_eq!(unique_name("Card EMP-1", &names(&["Other"])), "Card EMP-1");
    }

    #[test]
    fn collision_appends_suffix() {
        let existing = names(&["Card EMP-1"]);
        assert_eq!(unique_name("Card EMP-1", &existing), "Card EMP-1_2");
    }

    #[test]
    fn collision_detection_is_case_insensitive() {
        let existing = names(&["card emp-1"]);
        assert_eq!(unique_name("Card EMP-1", &existing), "Card EMP-1_2");
    }

    #[test]
    fn suffix_increments_past_taken_candidates() {
        let existing = names(&["Card EMP-1", "Card EMP-1_2", "card emp-1_3"]);
        assert_eq!(unique_name("Card EMP-1", &existing), "Card EMP-1_4");
    }

    #[test]
    fn generated_name_never_collides() {
        let existing = names(&["A", "a_2", "A_3", "B"]);
        let name = unique_name("a", &existing);
        assert!(
            !existing
                .iter()
                .any(|n| n.to_lowercase() == name.to_lowercase())
        );
    }

    #[test]
    fn replacement_marker_detection() {
        assert!(is_replacement_name("Zastępcza-1"));
        assert!(is_replacement_name("zastępcza 2"));
        assert!(is_replacement_name("Karta Zastępcza"));
        assert!(!is_replacement_name("Card EMP-1"));
        assert!(!is_replacement_name(""));
    }
}
