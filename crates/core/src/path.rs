use std::fmt;

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static SEGMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<key>[^\[\]]+)(?P<indices>(?:\[\d+\])*)$").expect("valid regex")
});

static INDEX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(\d+)\]").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// A parsed field address such as `WS-CvCat[0].WP-ACTL-CV-ID`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Parses dotted/bracketed path text. Returns `None` for anything outside
    /// the grammar: empty segments, unbalanced brackets, non-numeric indices
    /// or a leading index with no key.
    pub fn parse(text: &str) -> Option<Self> {
        if text.is_empty() {
            return None;
        }
        let mut segments = Vec::new();
        for part in text.split('.') {
            let caps = SEGMENT_RE.captures(part)?;
            segments.push(PathSegment::Key(caps["key"].to_string()));
            for index in INDEX_RE.captures_iter(&caps["indices"]) {
                segments.push(PathSegment::Index(index[1].parse().ok()?));
            }
        }
        Some(Self { segments })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn key(&self, key: &str) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::Key(key.to_string()));
        next
    }

    pub fn index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::Index(index));
        next
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last key segment together with any indices that follow it, e.g.
    /// `b[1]` for `a.b[1]`.
    pub fn label(&self) -> String {
        let start = self
            .segments
            .iter()
            .rposition(|seg| matches!(seg, PathSegment::Key(_)))
            .unwrap_or(0);
        Self {
            segments: self.segments[start..].to_vec(),
        }
        .to_string()
    }

    /// True when `self` lies strictly beneath `ancestor`.
    pub fn is_descendant_of(&self, ancestor: &FieldPath) -> bool {
        self.segments.len() > ancestor.segments.len()
            && self.segments.starts_with(&ancestor.segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if idx == 0 => write!(f, "{key}")?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// Union of every field path present in `values`, in first-discovery order.
/// Only object roots contribute; arrays are descended with bracket indices.
/// A key containing `.` can render the same text as a nested path; each text
/// is listed once.
pub fn collect_paths(values: &[Option<&Value>]) -> Vec<String> {
    let mut seen = IndexSet::new();
    for value in values.iter().flatten() {
        if let Value::Object(_) = value {
            walk(value, &FieldPath::default(), &mut seen);
        }
    }
    unique_text(&seen)
}

pub(crate) fn unique_text<'a, I>(paths: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a FieldPath>,
{
    paths
        .into_iter()
        .map(ToString::to_string)
        .collect::<IndexSet<String>>()
        .into_iter()
        .collect()
}

fn walk(value: &Value, prefix: &FieldPath, seen: &mut IndexSet<FieldPath>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = prefix.key(key);
                seen.insert(path.clone());
                walk(child, &path, seen);
            }
        }
        Value::Array(items) => {
            if prefix.is_empty() {
                return;
            }
            for (idx, child) in items.iter().enumerate() {
                let path = prefix.index(idx);
                seen.insert(path.clone());
                walk(child, &path, seen);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_handles_keys_and_indices() {
        let path = FieldPath::parse("a.b[1][0].c").unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Key("a".into()),
                PathSegment::Key("b".into()),
                PathSegment::Index(1),
                PathSegment::Index(0),
                PathSegment::Key("c".into()),
            ]
        );
        assert_eq!(path.to_string(), "a.b[1][0].c");
        assert_eq!(path.label(), "c");
        assert_eq!(FieldPath::parse("a.b[2]").unwrap().label(), "b[2]");
    }

    #[test]
    fn parse_rejects_malformed_text() {
        for bad in ["", "a..b", "[0]", "a[x]", "a[1", "a]", ".a", "a.", "a[-1]"] {
            assert!(FieldPath::parse(bad).is_none(), "accepted {bad:?}");
        }
    }

    #[test]
    fn collects_union_in_discovery_order() {
        let prev = json!({"a": 1, "nested": {"x": true}});
        let curr = json!({"a": 2, "list": [{"k": 1}, 5], "z": null});
        let paths = collect_paths(&[None, Some(&prev), Some(&curr)]);
        assert_eq!(
            paths,
            vec!["a", "nested", "nested.x", "list", "list[0]", "list[0].k", "list[1]", "z"]
        );
    }

    #[test]
    fn dotted_key_and_nested_path_are_listed_once() {
        let record = json!({"a.b": 1, "a": {"b": 2}});
        let paths = collect_paths(&[Some(&record)]);
        assert_eq!(paths, vec!["a.b", "a"]);
    }

    #[test]
    fn non_object_roots_contribute_nothing() {
        let scalar = json!(3);
        let array = json!([{"a": 1}]);
        assert!(collect_paths(&[Some(&scalar), Some(&array), None]).is_empty());
    }

    #[test]
    fn descendant_check_respects_segment_boundaries() {
        let parent = FieldPath::parse("a.b").unwrap();
        assert!(FieldPath::parse("a.b[0]").unwrap().is_descendant_of(&parent));
        assert!(FieldPath::parse("a.b.c").unwrap().is_descendant_of(&parent));
        assert!(!FieldPath::parse("a.bc").unwrap().is_descendant_of(&parent));
        assert!(!parent.is_descendant_of(&parent));
    }
}
