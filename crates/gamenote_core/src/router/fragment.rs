//! Location fragment parsing: `#/editor?id=abc&x=1`.

use std::collections::BTreeMap;

/// Path used when the fragment is empty.
pub const ROOT_PATH: &str = "/";

/// Multi-valued query string mapping. Values keep their input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    values: BTreeMap<String, Vec<String>>,
}

impl QueryParams {
    /// Parses `a=1&b=2&a=3`. Keys without `=` map to an empty value; empty
    /// segments are skipped. Components are percent-decoded, `+` is a space.
    pub fn parse(query: &str) -> Self {
        let mut values: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode_component(key);
            if key.is_empty() {
                continue;
            }
            values.entry(key).or_default().push(decode_component(value));
        }
        Self { values }
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.values.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// Parsed location fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub path: String,
    pub query: QueryParams,
}

impl Fragment {
    /// Strips the leading `#`, splits at the first `?`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let without_marker = trimmed.strip_prefix('#').unwrap_or(trimmed);
        let (path, query) = match without_marker.split_once('?') {
            Some((path, query)) => (path, QueryParams::parse(query)),
            None => (without_marker, QueryParams::default()),
        };
        let path = if path.is_empty() { ROOT_PATH } else { path };
        Self {
            path: path.to_string(),
            query,
        }
    }
}

/// Fragment string for `path`, e.g. `/login` -> `#/login`.
pub fn fragment_for(path: &str) -> String {
    if path.starts_with('#') {
        path.to_string()
    } else {
        format!("#{path}")
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

#[cfg(test)]
mod tests {
    use super::{fragment_for, Fragment, QueryParams};

    #[test]
    fn path_is_truncated_at_first_question_mark() {
        let fragment = Fragment::parse("#/editor?id=abc&x=1");
        assert_eq!(fragment.path, "/editor");
        assert_eq!(fragment.query.get("id"), Some("abc"));
        assert_eq!(fragment.query.get("x"), Some("1"));
    }

    #[test]
    fn empty_fragment_is_root_with_no_params() {
        let fragment = Fragment::parse("");
        assert_eq!(fragment.path, "/");
        assert!(fragment.query.is_empty());
        assert_eq!(Fragment::parse("#").path, "/");
    }

    #[test]
    fn query_is_multi_valued_and_decoded() {
        let params = QueryParams::parse("tag=a&tag=b%20c&q=hello+world&flag&=x");
        assert_eq!(params.get_all("tag"), ["a".to_string(), "b c".to_string()]);
        assert_eq!(params.get("q"), Some("hello world"));
        assert_eq!(params.get("flag"), Some(""));
        assert_eq!(params.get("missing"), None);
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn fragment_for_adds_marker_once() {
        assert_eq!(fragment_for("/login"), "#/login");
        assert_eq!(fragment_for("#/login"), "#/login");
    }
}
