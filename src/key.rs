use std::borrow::Cow;

/// Canonicalizes the given header key for storage into [`Headers`].
///
/// Canonical keys are the lower-cased form of the key. Keys which
/// are already canonical are returned as-is, without allocating.
///
/// No validation takes place: keys which would not make a valid
/// http header name are accepted and canonicalized all the same.
///
/// [`Headers`]: crate::Headers
#[must_use]
pub fn canonicalize_header_key(key: &str) -> Cow<'_, str> {
    if key.is_ascii() {
        if key.bytes().any(|b| b.is_ascii_uppercase()) {
            Cow::Owned(key.to_ascii_lowercase())
        } else {
            Cow::Borrowed(key)
        }
    } else {
        let lower = key.to_lowercase();
        if lower == key {
            Cow::Borrowed(key)
        } else {
            Cow::Owned(lower)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_header_key() {
        for (input, expected) in [
            ("", ""),
            ("foo", "foo"),
            ("Foo", "foo"),
            ("FOO", "foo"),
            ("X-Request-Id", "x-request-id"),
            ("rpc-caller", "rpc-caller"),
            ("Ünïcode-Key", "ünïcode-key"),
        ] {
            assert_eq!(
                expected,
                canonicalize_header_key(input),
                "input: {input:?}"
            );
        }
    }

    #[test]
    fn test_canonicalize_header_key_borrows_canonical_input() {
        assert!(matches!(
            canonicalize_header_key("x-forwarded-for"),
            Cow::Borrowed("x-forwarded-for")
        ));
        assert!(matches!(
            canonicalize_header_key("ünïcode"),
            Cow::Borrowed("ünïcode")
        ));
        assert!(matches!(canonicalize_header_key("X-Foo"), Cow::Owned(_)));
    }

    #[test]
    fn test_canonicalize_header_key_accepts_invalid_names() {
        assert_eq!("not a header:name", canonicalize_header_key("Not A Header:Name"));
        assert_eq!("\t\n", canonicalize_header_key("\t\n"));
    }

    quickcheck::quickcheck! {
        fn canonicalize_leaves_no_ascii_uppercase(key: String) -> bool {
            !canonicalize_header_key(&key).bytes().any(|b| b.is_ascii_uppercase())
        }

        fn canonicalize_matches_to_lowercase(key: String) -> bool {
            canonicalize_header_key(&key) == key.to_lowercase()
        }
    }
}
