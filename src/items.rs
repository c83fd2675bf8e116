use serde::{Serialize, Serializer};
use smol_str::SmolStr;
use std::{collections::HashMap, fmt};

pub(crate) type HeaderStore = HashMap<SmolStr, SmolStr>;

/// Read-only view over one of the stores of a [`Headers`] carrier.
///
/// Created by [`Headers::items`], [`Headers::raw_items`],
/// [`Headers::all_items`] and [`Headers::original_items`].
///
/// The view borrows the live storage of the carrier,
/// no copies are made to create it.
///
/// [`Headers`]: crate::Headers
/// [`Headers::items`]: crate::Headers::items
/// [`Headers::raw_items`]: crate::Headers::raw_items
/// [`Headers::all_items`]: crate::Headers::all_items
/// [`Headers::original_items`]: crate::Headers::original_items
#[derive(Clone, Copy)]
pub struct HeaderItems<'a> {
    store: Option<&'a HeaderStore>,
}

impl<'a> HeaderItems<'a> {
    pub(crate) fn new(store: Option<&'a HeaderStore>) -> Self {
        Self { store }
    }

    /// Returns the value stored for the exact `key`, if any.
    ///
    /// Keys are matched as-is, no canonicalization happens here.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.store?.get(key).map(SmolStr::as_str)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.store.is_some_and(|store| store.contains_key(key))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.store.map(HashMap::len).unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over all key-value pairs, in arbitrary order.
    #[must_use]
    pub fn iter(&self) -> HeaderItemsIter<'a> {
        HeaderItemsIter {
            inner: self.store.map(|store| store.iter()),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        self.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        self.iter().map(|(_, value)| value)
    }
}

impl fmt::Debug for HeaderItems<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl PartialEq for HeaderItems<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl Eq for HeaderItems<'_> {}

impl<'a> IntoIterator for HeaderItems<'a> {
    type Item = (&'a str, &'a str);
    type IntoIter = HeaderItemsIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for HeaderItems<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.iter())
    }
}

/// Iterator over the key-value pairs of [`HeaderItems`].
#[derive(Debug, Clone)]
pub struct HeaderItemsIter<'a> {
    inner: Option<std::collections::hash_map::Iter<'a, SmolStr, SmolStr>>,
}

impl<'a> Iterator for HeaderItemsIter<'a> {
    type Item = (&'a str, &'a str);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .as_mut()?
            .next()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner
            .as_ref()
            .map(Iterator::size_hint)
            .unwrap_or((0, Some(0)))
    }
}

impl ExactSizeIterator for HeaderItemsIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(pairs: &[(&str, &str)]) -> HeaderStore {
        pairs
            .iter()
            .map(|(key, value)| (SmolStr::new(key), SmolStr::new(value)))
            .collect()
    }

    #[test]
    fn test_unset_store_is_empty_view() {
        let items = HeaderItems::new(None);
        assert!(items.is_empty());
        assert_eq!(0, items.len());
        assert_eq!(None, items.get("foo"));
        assert!(!items.contains_key("foo"));
        assert_eq!(0, items.iter().count());
        assert_eq!((0, Some(0)), items.iter().size_hint());
        assert_eq!("{}", format!("{items:?}"));
    }

    #[test]
    fn test_view_lookup_is_exact() {
        let store = store(&[("Foo", "bar"), ("baz", "qux")]);
        let items = HeaderItems::new(Some(&store));

        assert_eq!(2, items.len());
        assert_eq!(Some("bar"), items.get("Foo"));
        assert_eq!(None, items.get("foo"));
        assert!(items.contains_key("baz"));
        assert!(!items.contains_key("BAZ"));

        let mut keys: Vec<_> = items.keys().collect();
        keys.sort_unstable();
        assert_eq!(vec!["Foo", "baz"], keys);

        let mut values: Vec<_> = items.values().collect();
        values.sort_unstable();
        assert_eq!(vec!["bar", "qux"], values);
    }

    #[test]
    fn test_view_eq_ignores_allocation() {
        let empty = HeaderStore::new();
        assert_eq!(HeaderItems::new(None), HeaderItems::new(Some(&empty)));

        let a = store(&[("a", "1"), ("b", "2")]);
        let b = store(&[("b", "2"), ("a", "1")]);
        let c = store(&[("a", "1"), ("b", "3")]);
        assert_eq!(HeaderItems::new(Some(&a)), HeaderItems::new(Some(&b)));
        assert_ne!(HeaderItems::new(Some(&a)), HeaderItems::new(Some(&c)));
        assert_ne!(HeaderItems::new(Some(&a)), HeaderItems::new(None));
    }

    #[test]
    fn test_view_serializes_as_map() {
        let store = store(&[("Foo", "bar")]);
        let value = serde_json::to_value(HeaderItems::new(Some(&store))).unwrap();
        assert_eq!(serde_json::json!({"Foo": "bar"}), value);

        let value = serde_json::to_value(HeaderItems::new(None)).unwrap();
        assert_eq!(serde_json::json!({}), value);
    }
}
