//! Helpers for working with JSON payloads, strings and URLs.
//!
//! ```rust
//! use restline_client::utils::{dict, url};
//! use serde_json::json;
//!
//! let cleaned = dict::clean(&json!({"a": 1, "b": {"c": null}}));
//! assert_eq!(cleaned, json!({"a": 1}));
//!
//! assert!(url::validate("https://google.com", &[]));
//! ```

/// Utilities for JSON objects.
pub mod dict {
    use serde_json::{Map, Value};

    /// Recursively remove null values and empty objects.
    ///
    /// Lists are kept even when empty. Inside a list, objects are cleaned and
    /// dropped if nothing is left, while other items (nulls included) are kept.
    ///
    /// ```rust
    /// use restline_client::utils::dict;
    /// use serde_json::json;
    ///
    /// let dirty = json!({"a": 1, "b": {"c": 2, "d": null}, "e": null});
    /// assert_eq!(dict::clean(&dirty), json!({"a": 1, "b": {"c": 2}}));
    /// ```
    #[must_use]
    pub fn clean(value: &Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(clean_map(map)),
            Value::Array(items) => Value::Array(clean_list(items)),
            other => other.clone(),
        }
    }

    fn clean_map(map: &Map<String, Value>) -> Map<String, Value> {
        let mut cleaned = Map::new();
        for (key, value) in map {
            match value {
                Value::Null => {}
                Value::Object(inner) => {
                    let inner = clean_map(inner);
                    if !inner.is_empty() {
                        cleaned.insert(key.clone(), Value::Object(inner));
                    }
                }
                Value::Array(items) => {
                    cleaned.insert(key.clone(), Value::Array(clean_list(items)));
                }
                other => {
                    cleaned.insert(key.clone(), other.clone());
                }
            }
        }
        cleaned
    }

    fn clean_list(items: &[Value]) -> Vec<Value> {
        items
            .iter()
            .filter_map(|item| match item {
                Value::Object(inner) => {
                    let inner = clean_map(inner);
                    (!inner.is_empty()).then_some(Value::Object(inner))
                }
                other => Some(other.clone()),
            })
            .collect()
    }

    /// Flatten nested objects into a single level, joining keys with `sep`.
    ///
    /// Objects inside lists are flattened on their own, so the list itself
    /// stays under its key.
    #[must_use]
    pub fn flatten(value: &Map<String, Value>, sep: &str, lower_key: bool) -> Map<String, Value> {
        let mut flat = Map::new();
        flatten_into(&mut flat, value, None, sep, lower_key);
        flat
    }

    fn flatten_into(
        flat: &mut Map<String, Value>,
        value: &Map<String, Value>,
        parent: Option<&str>,
        sep: &str,
        lower_key: bool,
    ) {
        for (key, val) in value {
            let key = if lower_key {
                key.to_lowercase()
            } else {
                key.clone()
            };
            let new_key = match parent {
                Some(parent) => format!("{parent}{sep}{key}"),
                None => key,
            };
            match val {
                Value::Object(inner) => flatten_into(flat, inner, Some(&new_key), sep, lower_key),
                Value::Array(items) => {
                    let items = items
                        .iter()
                        .map(|item| match item {
                            Value::Object(inner) => Value::Object(flatten(inner, sep, lower_key)),
                            other => other.clone(),
                        })
                        .collect();
                    flat.insert(new_key, Value::Array(items));
                }
                other => {
                    flat.insert(new_key, other.clone());
                }
            }
        }
    }

    /// Deep-merge each update into `master`.
    ///
    /// Nested objects are merged key by key. Any other value in an update
    /// replaces the one in `master`.
    #[must_use]
    pub fn merge(mut master: Value, updates: impl IntoIterator<Item = Value>) -> Value {
        for update in updates {
            merge_into(&mut master, update);
        }
        master
    }

    fn merge_into(master: &mut Value, update: Value) {
        match (master, update) {
            (Value::Object(master), Value::Object(update)) => {
                for (key, value) in update {
                    let nested = value.is_object() && master.get(&key).is_some_and(Value::is_object);
                    match master.get_mut(&key) {
                        Some(existing) if nested => merge_into(existing, value),
                        _ => {
                            master.insert(key, value);
                        }
                    }
                }
            }
            (master, update) => *master = update,
        }
    }

    /// Replace the values of the named keys, recursing into nested objects.
    ///
    /// A key whose value is an object is recursed into rather than replaced.
    #[must_use]
    pub fn redact<S: AsRef<str>>(value: &Value, keys: &[S], replacement: &Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, val)| {
                        let val = if val.is_object() {
                            redact(val, keys, replacement)
                        } else if keys.iter().any(|k| k.as_ref() == key) {
                            replacement.clone()
                        } else {
                            val.clone()
                        };
                        (key.clone(), val)
                    })
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

/// String helpers.
pub mod text {
    use serde_json::Value;

    /// Letter case to force.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Case {
        Lower,
        Upper,
    }

    impl Case {
        /// Apply the case to a string.
        pub fn apply(&self, value: &str) -> String {
            match self {
                Case::Lower => value.to_lowercase(),
                Case::Upper => value.to_uppercase(),
            }
        }
    }

    /// Force the case of a string or a list of strings.
    ///
    /// Non-string items are dropped from lists. Values that are neither a
    /// string nor a list pass through.
    #[must_use]
    pub fn force_case(value: &Value, case: Case) -> Value {
        match value {
            Value::String(s) => Value::String(case.apply(s)),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(|s| Value::String(case.apply(s))))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Truncate `text` to `limit` characters.
    ///
    /// When truncating, the suffix is counted towards the limit.
    ///
    /// ```rust
    /// use restline_client::utils::text::trunc;
    ///
    /// assert_eq!(trunc("Too Small", 6, Some("...")), "Too...");
    /// assert_eq!(trunc("Too Small", 3, None), "Too");
    /// ```
    #[must_use]
    pub fn trunc(text: &str, limit: usize, suffix: Option<&str>) -> String {
        if text.chars().count() < limit {
            return text.to_string();
        }
        match suffix {
            Some(suffix) => {
                let keep = limit.saturating_sub(suffix.chars().count());
                let mut out: String = text.chars().take(keep).collect();
                out.push_str(suffix);
                out
            }
            None => text.chars().take(limit).collect(),
        }
    }
}

/// URL helpers.
pub mod url {
    /// A component of a URL.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum UrlPart {
        Scheme,
        Netloc,
        Path,
        Query,
        Fragment,
    }

    /// Check that every requested part of `url` is present and non-empty.
    ///
    /// With no parts given, the scheme and network location are checked. A
    /// bare `/` path counts as empty.
    #[must_use]
    pub fn validate(url: &str, parts: &[UrlPart]) -> bool {
        let Ok(parsed) = ::url::Url::parse(url) else {
            return false;
        };
        let parts = if parts.is_empty() {
            &[UrlPart::Scheme, UrlPart::Netloc][..]
        } else {
            parts
        };

        parts.iter().all(|part| match part {
            UrlPart::Scheme => !parsed.scheme().is_empty(),
            UrlPart::Netloc => parsed.host_str().is_some_and(|h| !h.is_empty()),
            UrlPart::Path => !matches!(parsed.path(), "" | "/"),
            UrlPart::Query => parsed.query().is_some_and(|q| !q.is_empty()),
            UrlPart::Fragment => parsed.fragment().is_some_and(|f| !f.is_empty()),
        })
    }

    /// Percent-encode a value for use as a single path segment.
    ///
    /// ```rust
    /// use restline_client::utils::url::encode_segment;
    ///
    /// assert_eq!(encode_segment("../../etc"), "..%2F..%2Fetc");
    /// ```
    #[must_use]
    pub fn encode_segment(value: &str) -> String {
        urlencoding::encode(value).into_owned()
    }
}
