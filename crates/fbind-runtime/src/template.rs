#![forbid(unsafe_code)]

//! Interpolated text: `Hello {{ user.name }}!`.
//!
//! Markers are matched non-greedily, so `{{a}} and {{b}}` holds two markers.
//! Rendering always re-evaluates every marker and rebuilds the whole string.

use std::ops::Range;
use std::sync::LazyLock;

use fbind_core::{Object, Path, Result};
use regex_lite::Regex;

static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(.+?)\}\}").expect("marker pattern is valid"));

#[derive(Clone, Debug)]
struct Marker {
    span: Range<usize>,
    path: Path,
}

/// A string with one or more `{{expr}}` markers.
#[derive(Clone, Debug)]
pub struct Template {
    source: String,
    markers: Vec<Marker>,
}

impl Template {
    /// Parse `source`. `Ok(None)` when it contains no marker.
    pub fn parse(source: &str) -> Result<Option<Self>> {
        let markers = MARKER
            .captures_iter(source)
            .map(|caps| {
                let whole = caps.get(0).map_or(0..0, |m| m.range());
                let expr = caps.get(1).map_or("", |m| m.as_str());
                Ok(Marker {
                    span: whole,
                    path: Path::parse(expr)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        if markers.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self {
            source: source.to_owned(),
            markers,
        }))
    }

    /// Whether `text` contains at least one marker.
    #[must_use]
    pub fn has_markers(text: &str) -> bool {
        MARKER.is_match(text)
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Marker paths, in order of appearance (duplicates kept).
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.markers.iter().map(|m| &m.path)
    }

    /// Evaluate every marker (untracked) against `root`.
    pub fn render(&self, root: &Object) -> Result<String> {
        let mut out = String::with_capacity(self.source.len());
        let mut cursor = 0;
        for marker in &self.markers {
            out.push_str(&self.source[cursor..marker.span.start]);
            out.push_str(&root.resolve(&marker.path, None)?.to_string());
            cursor = marker.span.end;
        }
        out.push_str(&self.source[cursor..]);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fbind_core::BindError;
    use serde_json::json;

    fn data() -> Object {
        Object::from_json(&json!({ "user": { "name": "Ann" }, "n": 3 }))
    }

    #[test]
    fn no_markers_is_none() {
        assert!(Template::parse("plain text").unwrap().is_none());
        assert!(Template::parse("{{}}").unwrap().is_none());
        assert!(!Template::has_markers("{ {x} }"));
    }

    #[test]
    fn renders_every_marker() {
        let t = Template::parse("Hello {{ user.name }}, you have {{n}} items").unwrap().unwrap();
        assert_eq!(t.paths().count(), 2);
        assert_eq!(t.render(&data()).unwrap(), "Hello Ann, you have 3 items");
    }

    #[test]
    fn adjacent_markers_are_non_greedy() {
        let t = Template::parse("{{n}}{{n}}").unwrap().unwrap();
        assert_eq!(t.render(&data()).unwrap(), "33");
    }

    #[test]
    fn invalid_marker_expression_fails_parse() {
        let err = Template::parse("{{ user. }}").unwrap_err();
        assert!(matches!(err, BindError::InvalidPath { .. }));
    }

    #[test]
    fn missing_path_fails_render() {
        let t = Template::parse("{{ user.age }}").unwrap().unwrap();
        assert!(matches!(t.render(&data()), Err(BindError::MissingPath { .. })));
    }
}
