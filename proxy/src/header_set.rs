use http::header::{HeaderMap, HeaderName, HeaderValue};
use indexmap::IndexMap;
use indexmap::map::Entry;

/// Ordered, case-insensitive, multi-valued header collection.
///
/// Names are ordered by their first insertion and every name keeps its values
/// in the order they were added. Lookups are case-insensitive because
/// `HeaderName` normalizes to lowercase.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: IndexMap<HeaderName, Vec<HeaderValue>>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of values across all names.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &HeaderName) -> bool {
        self.entries.contains_key(name)
    }

    /// First value stored for `name`.
    pub fn get(&self, name: &HeaderName) -> Option<&HeaderValue> {
        self.entries.get(name).and_then(|values| values.first())
    }

    pub fn get_all(&self, name: &HeaderName) -> &[HeaderValue] {
        self.entries.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Adds a value without touching the ones already stored under `name`.
    pub fn append(&mut self, name: HeaderName, value: HeaderValue) {
        self.entries.entry(name).or_default().push(value);
    }

    /// Replaces every value of `name`. An existing name keeps its position.
    pub fn insert(&mut self, name: HeaderName, value: HeaderValue) {
        match self.entries.entry(name) {
            Entry::Occupied(mut entry) => *entry.get_mut() = vec![value],
            Entry::Vacant(entry) => {
                entry.insert(vec![value]);
            }
        }
    }

    /// Removes every value of `name`, returning them.
    pub fn remove(&mut self, name: &HeaderName) -> Vec<HeaderValue> {
        self.entries.shift_remove(name).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.entries
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |value| (name, value)))
    }

    pub fn names(&self) -> impl Iterator<Item = &HeaderName> {
        self.entries.keys()
    }
}

impl From<&HeaderMap> for HeaderSet {
    fn from(map: &HeaderMap) -> Self {
        map.iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

impl From<HeaderSet> for HeaderMap {
    fn from(set: HeaderSet) -> Self {
        let mut map = HeaderMap::with_capacity(set.entries.len());
        for (name, values) in set.entries {
            for value in values {
                map.append(name.clone(), value);
            }
        }
        map
    }
}

impl FromIterator<(HeaderName, HeaderValue)> for HeaderSet {
    fn from_iter<I: IntoIterator<Item = (HeaderName, HeaderValue)>>(iter: I) -> Self {
        let mut set = HeaderSet::new();
        for (name, value) in iter {
            set.append(name, value);
        }
        set
    }
}

#[cfg(test)]
pub(crate) fn header_set(pairs: &[(&str, &str)]) -> HeaderSet {
    pairs
        .iter()
        .map(|(name, value)| {
            (
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{CONNECTION, CONTENT_TYPE, RANGE, VIA};

    #[test]
    fn test_case_insensitive_lookup() {
        let set = header_set(&[("Content-Type", "text/html"), ("X-CUSTOM", "a")]);

        assert_eq!(set.get(&CONTENT_TYPE).unwrap(), "text/html");
        assert!(set.contains(&HeaderName::from_static("x-custom")));
        assert!(set.get(&VIA).is_none());
        assert!(set.get_all(&VIA).is_empty());
    }

    #[test]
    fn test_multi_valued_order() {
        let mut set = header_set(&[("connection", "keep-alive"), ("hi", "hey")]);
        set.append(CONNECTION, HeaderValue::from_static("die"));

        let values: Vec<_> = set.get_all(&CONNECTION).iter().collect();
        assert_eq!(values, ["keep-alive", "die"]);
        assert_eq!(set.len(), 3);

        let names: Vec<_> = set.names().map(HeaderName::as_str).collect();
        assert_eq!(names, ["connection", "hi"]);
    }

    #[test]
    fn test_insert_keeps_position() {
        let mut set = header_set(&[("range", "bytes=0-1"), ("range", "bytes=2-3"), ("hi", "hey")]);
        set.insert(RANGE, HeaderValue::from_static("bytes=0-9"));
        set.insert(VIA, HeaderValue::from_static("1.1 asyncproxy"));

        let pairs: Vec<_> = set
            .iter()
            .map(|(name, value)| (name.as_str(), value.to_str().unwrap()))
            .collect();
        assert_eq!(
            pairs,
            [
                ("range", "bytes=0-9"),
                ("hi", "hey"),
                ("via", "1.1 asyncproxy")
            ]
        );
    }

    #[test]
    fn test_remove_all_values() {
        let mut set = header_set(&[("a", "1"), ("b", "2"), ("A", "3")]);

        let removed = set.remove(&HeaderName::from_static("a"));
        assert_eq!(removed.len(), 2);
        assert_eq!(set.len(), 1);
        assert!(set.remove(&HeaderName::from_static("a")).is_empty());
    }

    #[test]
    fn test_header_map_conversion() {
        let mut map = HeaderMap::new();
        map.append(CONNECTION, HeaderValue::from_static("a"));
        map.append(CONNECTION, HeaderValue::from_static("b"));
        map.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let set = HeaderSet::from(&map);
        assert_eq!(set.len(), 3);
        assert_eq!(set.get_all(&CONNECTION).len(), 2);

        let back = HeaderMap::from(set);
        assert_eq!(back, map);
    }
}
