//! Mass-assignment rules.

use crate::model::Model;

/// Whether every key not whitelisted is refused.
#[must_use]
pub fn is_totally_guarded<M: Model>() -> bool {
    M::FILLABLE.is_empty() && M::GUARDED == ["*"]
}

/// Whether `key` is on the guarded list.
#[must_use]
pub fn is_guarded<M: Model>(key: &str) -> bool {
    M::GUARDED == ["*"] || M::GUARDED.contains(&key)
}

/// Whether `key` may be mass assigned.
#[must_use]
pub fn is_fillable<M: Model>(key: &str) -> bool {
    if M::FILLABLE.contains(&key) {
        return true;
    }
    if is_guarded::<M>(key) {
        return false;
    }
    M::FILLABLE.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Whitelisted;
    impl Model for Whitelisted {
        const TABLE: &'static str = "posts";
        const FILLABLE: &'static [&'static str] = &["title"];
    }

    struct Blacklisted;
    impl Model for Blacklisted {
        const TABLE: &'static str = "posts";
        const GUARDED: &'static [&'static str] = &["is_admin"];
    }

    struct Locked;
    impl Model for Locked {
        const TABLE: &'static str = "posts";
    }

    struct Open;
    impl Model for Open {
        const TABLE: &'static str = "posts";
        const GUARDED: &'static [&'static str] = &[];
    }

    #[test]
    fn test_whitelist_wins() {
        assert!(is_fillable::<Whitelisted>("title"));
        assert!(!is_fillable::<Whitelisted>("secret"));
        assert!(!is_totally_guarded::<Whitelisted>());
    }

    #[test]
    fn test_guarded_list_without_whitelist() {
        assert!(is_fillable::<Blacklisted>("title"));
        assert!(!is_fillable::<Blacklisted>("is_admin"));
    }

    #[test]
    fn test_totally_guarded_and_unguarded() {
        assert!(is_totally_guarded::<Locked>());
        assert!(!is_fillable::<Locked>("title"));
        assert!(is_fillable::<Open>("anything"));
    }
}
