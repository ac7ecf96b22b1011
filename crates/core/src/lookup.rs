use serde_json::Value;

use crate::path::{FieldPath, PathSegment};
use crate::record::Record;

/// Result of resolving a path. `Missing` means some segment was absent and is
/// never conflated with a present `null`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    Found(&'a Value),
    Missing,
}

impl<'a> Lookup<'a> {
    pub fn value(self) -> Option<&'a Value> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Lookup::Missing)
    }
}

pub fn lookup<'a>(root: Option<&'a Value>, path: &str) -> Lookup<'a> {
    match FieldPath::parse(path) {
        Some(parsed) => lookup_path(root, &parsed),
        None => Lookup::Missing,
    }
}

pub fn lookup_path<'a>(root: Option<&'a Value>, path: &FieldPath) -> Lookup<'a> {
    match root {
        Some(value) if !path.is_empty() => walk(value, path.segments()),
        _ => Lookup::Missing,
    }
}

/// Resolves `path` directly against a record's top-level map.
pub fn lookup_record<'a>(record: &'a Record, path: &str) -> Lookup<'a> {
    let Some(parsed) = FieldPath::parse(path) else {
        return Lookup::Missing;
    };
    match parsed.segments().split_first() {
        Some((PathSegment::Key(key), rest)) => match record.get(key) {
            Some(value) => walk(value, rest),
            None => Lookup::Missing,
        },
        _ => Lookup::Missing,
    }
}

fn walk<'a>(mut current: &'a Value, segments: &[PathSegment]) -> Lookup<'a> {
    for segment in segments {
        let next = match (segment, current) {
            (PathSegment::Key(key), Value::Object(map)) => map.get(key),
            (PathSegment::Index(index), Value::Array(items)) => items.get(*index),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return Lookup::Missing,
        }
    }
    Lookup::Found(current)
}
