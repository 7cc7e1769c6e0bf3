use std::fmt;

/// Replaces every character outside `[A-Za-z0-9]` with `_`.
///
/// Not a hash: `"a b"` and `"a_b"` map to the same key. That is fine for
/// namespacing upstream requests, which is all the cache needs.
pub fn sanitize_key(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Escapes a query value so distinct values stay distinct after
/// sanitizing: every byte outside `[A-Za-z0-9]` becomes `_xx` (lowercase hex).
///
/// `"ナルト"` becomes `"_e3_83_8a_e3_83_ab_e3_83_88"`; `"_"` itself is escaped
/// to `"_5f"` so an escaped value can never be confused with a literal one.
pub fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() {
            escaped.push(byte as char);
        } else {
            escaped.push_str(&format!("_{:02x}", byte));
        }
    }
    escaped
}

/// A sanitized cache key, safe to use as a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(raw: &str) -> Self {
        Self(sanitize_key(raw))
    }

    /// Key for an upstream request: `{namespace}_{path}?{k=v&...}`, sanitized.
    ///
    /// Query pairs keep the order they were given in, so callers must build
    /// them the same way every time. Values go through [`escape_value`], so
    /// queries that differ only in non-alphanumeric characters get different keys.
    pub fn for_request(namespace: &str, path: &str, query: &[(String, String)]) -> Self {
        let mut raw = format!("{}_{}", namespace, path);
        if !query.is_empty() {
            let pairs: Vec<String> = query
                .iter()
                .map(|(k, v)| format!("{}={}", k, escape_value(v)))
                .collect();
            raw.push('?');
            raw.push_str(&pairs.join("&"));
        }
        Self::new(&raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_non_alphanumerics() {
        assert_eq!(
            sanitize_key("anime_ q=naruto&limit=10"),
            "anime__q_naruto_limit_10"
        );
        assert_eq!(sanitize_key("../../etc/passwd"), "______etc_passwd");
        assert_eq!(sanitize_key("Pokémon"), "Pok_mon");
    }

    #[test]
    fn test_key_is_deterministic() {
        let query = vec![
            ("q".to_string(), "naruto".to_string()),
            ("limit".to_string(), "10".to_string()),
        ];
        let a = CacheKey::for_request("anime", "/anime", &query);
        let b = CacheKey::for_request("anime", "/anime", &query);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "anime__anime_q_naruto_limit_10");
    }

    #[test]
    fn test_different_requests_get_different_keys() {
        let naruto = vec![("q".to_string(), "naruto".to_string())];
        let bleach = vec![("q".to_string(), "bleach".to_string())];
        assert_ne!(
            CacheKey::for_request("anime", "/anime", &naruto),
            CacheKey::for_request("anime", "/anime", &bleach)
        );
        assert_ne!(
            CacheKey::for_request("anime", "/anime", &naruto),
            CacheKey::for_request("book", "/anime", &naruto)
        );
    }

    #[test]
    fn test_non_ascii_queries_get_distinct_keys() {
        let key = |q: &str| CacheKey::for_request("anime", "/anime", &[("q".to_string(), q.to_string())]);

        assert_ne!(key("ナルト"), key("ワンピ"));
        assert_ne!(key("القاهرة"), key("الرياضى"));
        assert_eq!(key("ナルト").as_str(), "anime__anime_q__e3_83_8a_e3_83_ab_e3_83_88");

        // Punctuation no longer folds together either.
        assert_ne!(key("a b"), key("a_b"));
        assert_ne!(key("a b"), key("a-b"));
        assert!(key("ナルト").as_str().chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }

    #[test]
    fn test_escape_value() {
        assert_eq!(escape_value("naruto"), "naruto");
        assert_eq!(escape_value("the hobbit"), "the_20hobbit");
        assert_eq!(escape_value("a_b"), "a_5fb");
        assert_eq!(escape_value(""), "");
    }

    #[test]
    fn test_request_without_query_has_no_separator() {
        let key = CacheKey::for_request("steam", "/appdetails", &[]);
        assert_eq!(key.as_str(), "steam__appdetails");
        assert!(!key.is_empty());
        assert!(CacheKey::new("").is_empty());
    }
}
