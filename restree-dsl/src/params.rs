use std::collections::HashMap;

use indexmap::IndexMap;

/**
Ordered multimap of string keys to one or many string values, used for both
headers and query parameters. Keys keep their first insertion position so
the wire output is deterministic.

Entries with an empty key are dropped rather than stored.
*/
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: IndexMap<String, Vec<String>>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// append `value` to the values of `key`. Returns whether the entry was accepted.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if key.is_empty() {
            log::debug!("dropping entry with empty key");
            return false;
        }
        self.entries.entry(key).or_default().push(value.into());
        true
    }

    /// replace all values of `key` by `value`
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if key.is_empty() {
            log::debug!("dropping entry with empty key");
            return false;
        }
        self.entries.insert(key, vec![value.into()]);
        true
    }

    pub fn add_all<K, V>(&mut self, key: K, values: impl IntoIterator<Item = V>) -> bool
    where
        K: Into<String>,
        V: Into<String>,
    {
        let key = key.into();
        if key.is_empty() {
            log::debug!("dropping entries with empty key");
            return false;
        }
        self.entries
            .entry(key)
            .or_default()
            .extend(values.into_iter().map(Into::into));
        true
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// first value stored for `key`
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    /// Lookup ignoring ASCII case, as HTTP header names are case-insensitive.
    pub fn get_ignore_case(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_slice())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Every (key, value) pair, a key repeated once per value.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// Overlay `other` on top of `self`: keys present in `other` replace
    /// those in `self` (compared ignoring ASCII case), others are kept.
    pub fn merged_with(&self, other: &Params) -> Params {
        let mut merged = Params::new();
        for (k, vs) in self.iter() {
            if other.get_ignore_case(k).is_none() {
                merged.add_all(k, vs.iter().cloned());
            }
        }
        for (k, vs) in other.iter() {
            merged.add_all(k, vs.iter().cloned());
        }
        merged
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.add(k, v);
        }
        params
    }
}

/// Keys are sorted, since a `HashMap` has no order of its own.
impl From<HashMap<String, String>> for Params {
    fn from(map: HashMap<String, String>) -> Self {
        let mut entries: Vec<_> = map.into_iter().collect();
        entries.sort();
        entries.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_insertion_order_is_kept() {
        let mut params = Params::new();
        params.add("b", "1");
        params.add("a", "2");
        params.add("b", "3");

        let pairs: Vec<_> = params.pairs().collect();
        assert_eq!(vec![("b", "1"), ("b", "3"), ("a", "2")], pairs);
        assert_eq!(2, params.len());
    }

    #[test]
    fn test_empty_key_is_dropped() {
        let mut params = Params::new();
        assert!(!params.add("", "value"));
        assert!(!params.set("", "value"));
        assert!(!params.add_all("", ["a", "b"]));
        assert!(params.is_empty());
    }

    #[test]
    fn test_set_replaces_values() {
        let mut params = Params::new();
        params.add("Accept", "text/plain");
        params.add("Accept", "text/html");
        params.set("Accept", "application/json");
        assert_eq!(Some(&["application/json".to_string()][..]), params.get("Accept"));
    }

    #[test]
    fn test_merge_overrides_ignoring_case() {
        let defaults: Params = [("Accept", "text/plain"), ("X-Client", "restree")]
            .into_iter()
            .collect();
        let request: Params = [("accept", "application/json")].into_iter().collect();

        let merged = defaults.merged_with(&request);
        let pairs: Vec<_> = merged.pairs().collect();
        assert_eq!(
            vec![("X-Client", "restree"), ("accept", "application/json")],
            pairs
        );
    }
}
