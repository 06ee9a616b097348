//! Path templates with `{name}` placeholders resolved against owner attributes.
//!
//! `{{` and `}}` produce literal braces. Parsing happens once, when a cache is
//! built; resolution happens on every call against a fresh attribute snapshot.

use std::fmt;
use std::path::PathBuf;

use crate::attributes::AttributeMap;
use crate::error::{CacheError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed path template such as `cache/{exchange_name}/{market_type}/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse a template, rejecting unbalanced braces and empty placeholders.
    pub fn parse(template: &str) -> Result<Self> {
        let malformed = |position: usize, reason: &'static str| CacheError::MalformedTemplate {
            template: template.to_string(),
            position,
            reason,
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' => {
                    if matches!(chars.peek(), Some((_, '{'))) {
                        chars.next();
                        literal.push('{');
                        continue;
                    }
                    let mut name = String::new();
                    let mut closed = false;
                    for (inner_pos, inner) in chars.by_ref() {
                        match inner {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => return Err(malformed(inner_pos, "nested `{` in placeholder")),
                            _ => name.push(inner),
                        }
                    }
                    if !closed {
                        return Err(malformed(pos, "unclosed placeholder"));
                    }
                    if name.trim().is_empty() {
                        return Err(malformed(pos, "empty placeholder"));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name));
                }
                '}' => {
                    if matches!(chars.peek(), Some((_, '}'))) {
                        chars.next();
                        literal.push('}');
                    } else {
                        return Err(malformed(pos, "unmatched `}`"));
                    }
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// The template text as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Placeholder names in order of appearance (duplicates included).
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute every placeholder, failing on the first missing attribute.
    pub fn render(&self, attributes: &AttributeMap) -> Result<String> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value =
                        attributes
                            .get(name)
                            .ok_or_else(|| CacheError::MissingAttribute {
                                name: name.clone(),
                                template: self.source.clone(),
                            })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }

    /// Resolve the template into a directory path. Does not touch the filesystem.
    pub fn resolve(&self, attributes: &AttributeMap) -> Result<PathBuf> {
        self.render(attributes).map(PathBuf::from)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for PathTemplate {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Parse and resolve `template` in one step.
pub fn resolve(template: &str, attributes: &AttributeMap) -> Result<PathBuf> {
    PathTemplate::parse(template)?.resolve(attributes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::attribute_map;

    #[test]
    fn test_resolve_nested_template() {
        let attrs = attribute_map([("exchange_name", "binance"), ("market_type", "spot")]);
        let path = resolve("cache/{exchange_name}/{market_type}/", &attrs).unwrap();
        assert_eq!(path, PathBuf::from("cache/binance/spot/"));
    }

    #[test]
    fn test_template_without_placeholders() {
        let template = PathTemplate::parse("/tmp/static").unwrap();
        assert_eq!(template.placeholders().count(), 0);
        assert_eq!(
            template.resolve(&AttributeMap::new()).unwrap(),
            PathBuf::from("/tmp/static")
        );
    }

    #[test]
    fn test_escaped_braces_are_literal() {
        let attrs = attribute_map([("name", "x")]);
        let rendered = PathTemplate::parse("a/{{raw}}/{name}").unwrap().render(&attrs).unwrap();
        assert_eq!(rendered, "a/{raw}/x");
    }

    #[test]
    fn test_missing_attribute() {
        let attrs = attribute_map([("exchange_name", "kraken")]);
        let err = resolve("{exchange_name}/{market_type}", &attrs).unwrap_err();
        match err {
            CacheError::MissingAttribute { name, template } => {
                assert_eq!(name, "market_type");
                assert_eq!(template, "{exchange_name}/{market_type}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_templates() {
        for bad in ["cache/{exchange", "cache/}", "cache/{}/x", "{a{b}}"] {
            let err = PathTemplate::parse(bad).unwrap_err();
            assert!(
                matches!(err, CacheError::MalformedTemplate { .. }),
                "{bad} should be rejected, got {err}"
            );
        }
    }

    #[test]
    fn test_placeholder_names_are_not_trimmed() {
        let attrs = attribute_map([("exchange_name", "binance")]);
        let err = resolve("{ exchange_name }/", &attrs).unwrap_err();
        match err {
            CacheError::MissingAttribute { name, .. } => assert_eq!(name, " exchange_name "),
            other => panic!("unexpected error: {other}"),
        }
        assert!(PathTemplate::parse("{  }").is_err());
    }

    #[test]
    fn test_placeholders_in_order() {
        let template = PathTemplate::parse("{b}/{a}/{b}").unwrap();
        let names: Vec<_> = template.placeholders().collect();
        assert_eq!(names, vec!["b", "a", "b"]);
    }
}
