//! Tagged key:value blocks embedded in the model's reply.
//!
//! The model is asked to append machine-readable blocks such as
//!
//! ```text
//! ---METRICS_START---
//! Price: $189.20
//! Sentiment: Bullish
//! ---METRICS_END---
//! ```
//!
//! Extraction is best effort: a missing or malformed block yields an empty map,
//! never an error.

/// Pair of literal delimiters around a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedBlock {
    pub start: &'static str,
    pub end: &'static str,
}

impl TaggedBlock {
    pub const METRICS: TaggedBlock = TaggedBlock {
        start: "---METRICS_START---",
        end: "---METRICS_END---",
    };

    pub const INCOME: TaggedBlock = TaggedBlock {
        start: "---INCOME_START---",
        end: "---INCOME_END---",
    };

    pub fn extract(&self, raw: &str) -> (FieldMap, String) {
        extract_block(raw, self.start, self.end)
    }
}

/// Insertion-ordered key/value pairs from one block.
///
/// Re-inserting an existing key replaces its value but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    entries: Vec<(String, String)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Pull the first `start_tag ... end_tag` region out of `raw`.
///
/// Returns the parsed fields and `raw` with exactly that region (tags included)
/// removed. The residual is not trimmed. When no complete region exists the map
/// is empty and the residual equals the input.
pub fn extract_block(raw: &str, start_tag: &str, end_tag: &str) -> (FieldMap, String) {
    let Some(start) = raw.find(start_tag) else {
        return (FieldMap::new(), raw.to_string());
    };
    let body_start = start + start_tag.len();
    let Some(end_offset) = raw[body_start..].find(end_tag) else {
        return (FieldMap::new(), raw.to_string());
    };
    let body_end = body_start + end_offset;
    let span_end = body_end + end_tag.len();

    let fields = parse_fields(&raw[body_start..body_end]);

    let mut residual = String::with_capacity(raw.len() - (span_end - start));
    residual.push_str(&raw[..start]);
    residual.push_str(&raw[span_end..]);

    (fields, residual)
}

/// Parse `Key: value` lines. Lines without a colon, or with an empty key or
/// value, are skipped.
pub fn parse_fields(body: &str) -> FieldMap {
    body.split('\n')
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            let (key, value) = (key.trim(), value.trim());
            (!key.is_empty() && !value.is_empty()).then_some((key, value))
        })
        .collect()
}
