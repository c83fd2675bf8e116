use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smol_str::SmolStr;
use std::{borrow::Cow, collections::HashMap, hash::BuildHasher, sync::Arc};

use crate::{
    canonicalize_header_key,
    items::{HeaderItems, HeaderStore},
};

/// Transport-level representation of application headers.
///
/// Two kinds of headers can be stored:
///
/// - canonical headers ([`Headers::with`]): keys are canonicalized using
///   [`canonicalize_header_key`] and looked up case-insensitively;
/// - raw headers ([`Headers::with_raw`]): keys are stored and matched
///   exactly as given, for transports that have to preserve casing.
///
/// When a key is known as both, the canonical header takes precedence.
///
/// ```
/// use rama_transport_headers::Headers;
///
/// let headers = Headers::new()
///     .with("Foo", "bar")
///     .with_raw("foo", "baz")
///     .with_raw("X-Signed", "sig");
///
/// assert_eq!(Some("bar"), headers.get("FOO"));
/// assert_eq!(Some("sig"), headers.get("X-Signed"));
/// assert_eq!(None, headers.get("x-signed"));
/// assert_eq!(1, headers.len());
/// ```
///
/// The default value is an empty carrier that is ready for use,
/// storage is only allocated on the first insert.
///
/// Cloning is cheap: storage is shared between clones
/// and copied on the first write to a shared store,
/// so mutating one carrier never affects another.
#[derive(Clone, Default)]
pub struct Headers {
    /// canonicalized headers
    items: Option<Arc<HeaderStore>>,
    /// headers that are neither canonicalized nor mutated by the transport
    raw_items: Option<Arc<HeaderStore>>,
    /// union of items and raw items, items taking precedence on collisions
    all_items: Option<Arc<HeaderStore>>,
    /// canonical headers keyed by the casing they were last inserted with
    original_items: Option<Arc<HeaderStore>>,
}

fn store_mut(store: &mut Option<Arc<HeaderStore>>) -> &mut HeaderStore {
    Arc::make_mut(store.get_or_insert_with(Default::default))
}

fn store_remove(store: &mut Option<Arc<HeaderStore>>, key: &str) {
    // only copy a shared store when there is something to remove
    if let Some(arc) = store
        && arc.contains_key(key)
    {
        Arc::make_mut(arc).remove(key);
    }
}

// holds at most both the canonical and the raw headers
fn merged_store_capacity(capacity: usize) -> usize {
    capacity.saturating_mul(2)
}

fn canonical_smol_str(key: &SmolStr) -> SmolStr {
    match canonicalize_header_key(key) {
        Cow::Borrowed(_) => key.clone(),
        Cow::Owned(canonical) => SmolStr::from(canonical),
    }
}

impl Headers {
    /// Create a new empty [`Headers`] carrier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new [`Headers`] carrier with room for `capacity` headers.
    ///
    /// A capacity of zero is the same as [`Headers::new`].
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        if capacity == 0 {
            return Self::default();
        }
        Self {
            items: Some(Arc::new(HeaderStore::with_capacity(capacity))),
            raw_items: Some(Arc::new(HeaderStore::with_capacity(capacity))),
            all_items: Some(Arc::new(HeaderStore::with_capacity(
                merged_store_capacity(capacity),
            ))),
            original_items: Some(Arc::new(HeaderStore::with_capacity(capacity))),
        }
    }

    /// Create a [`Headers`] carrier from the given key-value pairs,
    /// inserting each pair as a canonical header.
    ///
    /// Pairs whose keys only differ in casing collapse into a single header,
    /// the last one in iteration order wins.
    pub fn from_map<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<SmolStr>,
        V: Into<SmolStr>,
    {
        let pairs = pairs.into_iter();
        let mut headers = Self::with_capacity(pairs.size_hint().0);
        for (key, value) in pairs {
            headers.set(key, value);
        }
        headers
    }

    /// Add a canonical header.
    ///
    /// The key is canonicalized using [`canonicalize_header_key`],
    /// replacing any canonical header with the same canonical key,
    /// and shadowing any raw header stored under that canonical key.
    #[must_use]
    pub fn with(mut self, key: impl Into<SmolStr>, value: impl Into<SmolStr>) -> Self {
        self.set(key, value);
        self
    }

    /// Add a canonical header.
    ///
    /// See [`Headers::with`] for more information.
    pub fn set(&mut self, key: impl Into<SmolStr>, value: impl Into<SmolStr>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        let canonical_key = canonical_smol_str(&key);

        let items = store_mut(&mut self.items);
        let replaced = items
            .insert(canonical_key.clone(), value.clone())
            .is_some();

        let original_items = store_mut(&mut self.original_items);
        if replaced && !original_items.contains_key(key.as_str()) {
            // forget the casing of the canonical header we just replaced
            original_items.retain(|original_key, _| {
                canonicalize_header_key(original_key) != canonical_key.as_str()
            });
        }
        original_items.insert(key, value.clone());

        store_mut(&mut self.all_items).insert(canonical_key, value);
        self
    }

    /// Add a raw header.
    ///
    /// The key is stored exactly as given and can only be retrieved
    /// using that exact key. Transports promise to leave it untouched.
    ///
    /// The raw header is only part of [`Headers::all_items`] when no canonical
    /// header exists yet for the canonicalized form of `key`.
    #[must_use]
    pub fn with_raw(mut self, key: impl Into<SmolStr>, value: impl Into<SmolStr>) -> Self {
        self.set_raw(key, value);
        self
    }

    /// Add a raw header.
    ///
    /// See [`Headers::with_raw`] for more information.
    pub fn set_raw(&mut self, key: impl Into<SmolStr>, value: impl Into<SmolStr>) -> &mut Self {
        let key = key.into();
        let value = value.into();

        let shadowed = self
            .items
            .as_deref()
            .is_some_and(|items| items.contains_key(&*canonicalize_header_key(&key)));
        if shadowed {
            tracing::trace!(
                header.name = %key,
                "raw header shadowed by canonical header: not added to merged view"
            );
        } else {
            store_mut(&mut self.all_items).insert(key.clone(), value.clone());
        }

        store_mut(&mut self.raw_items).insert(key, value);
        self
    }

    /// Remove the header with the given key, canonical as well as raw.
    ///
    /// This is a no-op if the key does not exist.
    #[must_use]
    pub fn without(mut self, key: &str) -> Self {
        self.remove(key);
        self
    }

    /// Remove the header with the given key, canonical as well as raw.
    ///
    /// The canonical header is removed using the canonicalized `key`,
    /// the raw header only when `key` matches it exactly.
    ///
    /// This is a no-op if the key does not exist.
    pub fn remove(&mut self, key: &str) -> &mut Self {
        let canonical_key = canonicalize_header_key(key);

        if self
            .items
            .as_deref()
            .is_some_and(|items| items.contains_key(&*canonical_key))
        {
            store_remove(&mut self.items, &canonical_key);
            if let Some(original_items) = self.original_items.as_mut() {
                Arc::make_mut(original_items).retain(|original_key, _| {
                    canonicalize_header_key(original_key) != canonical_key
                });
            }
        }
        store_remove(&mut self.raw_items, key);

        // merged view holds canonical as well as raw keys
        store_remove(&mut self.all_items, key);
        store_remove(&mut self.all_items, &canonical_key);

        self
    }

    /// Retrieve the value associated with the given key.
    ///
    /// The canonicalized key is looked up first. Only when no canonical header
    /// exists, the raw headers are consulted, which requires an exact match.
    ///
    /// ```
    /// use rama_transport_headers::Headers;
    ///
    /// let headers = Headers::new().with("Foo", "bar").with_raw("foo", "baz");
    /// assert_eq!(Some("bar"), headers.get("foo"));
    ///
    /// let headers = Headers::new().with("foo", "bar").with_raw("FOO", "baz");
    /// assert_eq!(Some("bar"), headers.get("foo"));
    /// assert_eq!(Some("bar"), headers.get("FOO"));
    /// ```
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.items()
            .get(&canonicalize_header_key(key))
            .or_else(|| self.raw_items().get(key))
    }

    /// Returns true if [`Headers::get`] would find a value for this key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of canonical headers, raw headers are not counted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items().len()
    }

    /// Returns true if there are no canonical headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The canonical headers, keyed by their canonicalized key.
    #[must_use]
    pub fn items(&self) -> HeaderItems<'_> {
        HeaderItems::new(self.items.as_deref())
    }

    /// The raw headers, keyed exactly as they were inserted.
    #[must_use]
    pub fn raw_items(&self) -> HeaderItems<'_> {
        HeaderItems::new(self.raw_items.as_deref())
    }

    /// All headers: canonical headers keyed by their canonicalized key,
    /// and raw headers that were not shadowed by a canonical header
    /// at the time they were inserted, keyed exactly.
    #[must_use]
    pub fn all_items(&self) -> HeaderItems<'_> {
        HeaderItems::new(self.all_items.as_deref())
    }

    /// The canonical headers, keyed by the casing they were last inserted with.
    #[must_use]
    pub fn original_items(&self) -> HeaderItems<'_> {
        HeaderItems::new(self.original_items.as_deref())
    }
}

impl std::fmt::Debug for Headers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Headers")
            .field("items", &self.items())
            .field("raw_items", &self.raw_items())
            .field("all_items", &self.all_items())
            .field("original_items", &self.original_items())
            .finish()
    }
}

impl PartialEq for Headers {
    fn eq(&self, other: &Self) -> bool {
        self.items() == other.items()
            && self.raw_items() == other.raw_items()
            && self.all_items() == other.all_items()
            && self.original_items() == other.original_items()
    }
}

impl Eq for Headers {}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<SmolStr>,
    V: Into<SmolStr>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::from_map(iter)
    }
}

impl<K, V, S> From<HashMap<K, V, S>> for Headers
where
    K: Into<SmolStr>,
    V: Into<SmolStr>,
    S: BuildHasher,
{
    fn from(map: HashMap<K, V, S>) -> Self {
        Self::from_map(map)
    }
}

impl<K, V> Extend<(K, V)> for Headers
where
    K: Into<SmolStr>,
    V: Into<SmolStr>,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

#[derive(Serialize)]
struct HeadersRef<'a> {
    headers: HeaderItems<'a>,
    raw_headers: HeaderItems<'a>,
    all_headers: HeaderItems<'a>,
}

#[derive(Deserialize)]
struct HeadersOwned {
    #[serde(default)]
    headers: HashMap<SmolStr, SmolStr>,
    #[serde(default)]
    raw_headers: HashMap<SmolStr, SmolStr>,
    #[serde(default)]
    all_headers: Option<HashMap<SmolStr, SmolStr>>,
}

impl Serialize for Headers {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        HeadersRef {
            headers: self.original_items(),
            raw_headers: self.raw_items(),
            all_headers: self.all_items(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Headers {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let HeadersOwned {
            headers,
            raw_headers,
            all_headers,
        } = HeadersOwned::deserialize(deserializer)?;

        let mut carrier = Self::from_map(headers);

        let Some(all_headers) = all_headers else {
            for (key, value) in raw_headers {
                carrier.set_raw(key, value);
            }
            return Ok(carrier);
        };

        // merged entries which are not canonical must belong to a raw header,
        // the value can be older than the raw value it shadows
        for (key, value) in all_headers {
            if carrier.all_items().contains_key(&key) || !raw_headers.contains_key(&key) {
                continue;
            }
            store_mut(&mut carrier.all_items).insert(key, value);
        }
        if !raw_headers.is_empty() {
            carrier.raw_items = Some(Arc::new(raw_headers));
        }

        Ok(carrier)
    }
}
