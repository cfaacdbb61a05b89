//! Selector matching for the subset of CSS selectors page markup uses:
//! tag, `#id`, `.class`, `[attr]`, `[attr=value]`, compounds of those, and
//! comma-separated groups.

use crate::{DomError, Node};

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeTest {
    name: String,
    value: Option<String>,
}

/// One compound selector, e.g. `input.answer[type="text"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeTest>,
}

impl CompoundSelector {
    fn parse(text: &str) -> Result<Self, DomError> {
        let invalid = || DomError::InvalidSelector(text.to_string());
        let mut selector = CompoundSelector::default();
        let mut rest = text.trim();
        if rest.is_empty() {
            return Err(invalid());
        }

        let tag_len = rest
            .find(['#', '.', '['])
            .unwrap_or(rest.len());
        if tag_len > 0 {
            let tag = &rest[..tag_len];
            if tag.contains(char::is_whitespace) {
                return Err(invalid());
            }
            if tag != "*" {
                selector.tag = Some(tag.to_ascii_lowercase());
            }
            rest = &rest[tag_len..];
        }

        while let Some(first) = rest.chars().next() {
            match first {
                '#' | '.' => {
                    let body = &rest[1..];
                    let end = body.find(['#', '.', '[']).unwrap_or(body.len());
                    let name = &body[..end];
                    if name.is_empty() || name.contains(char::is_whitespace) {
                        return Err(invalid());
                    }
                    if first == '#' {
                        selector.id = Some(name.to_string());
                    } else {
                        selector.classes.push(name.to_string());
                    }
                    rest = &body[end..];
                }
                '[' => {
                    let end = rest.find(']').ok_or_else(invalid)?;
                    let inner = rest[1..end].trim();
                    let test = match inner.split_once('=') {
                        Some((name, value)) => AttributeTest {
                            name: name.trim().to_ascii_lowercase(),
                            value: Some(value.trim().trim_matches(['"', '\'']).to_string()),
                        },
                        None => AttributeTest {
                            name: inner.to_ascii_lowercase(),
                            value: None,
                        },
                    };
                    if test.name.is_empty() {
                        return Err(invalid());
                    }
                    selector.attributes.push(test);
                    rest = &rest[end + 1..];
                }
                _ => return Err(invalid()),
            }
        }

        Ok(selector)
    }

    fn matches(&self, node: &Node) -> bool {
        let Some(tag_name) = node.tag_name() else {
            return false;
        };
        if self.tag.as_deref().is_some_and(|tag| !tag_name.eq_ignore_ascii_case(tag)) {
            return false;
        }
        if let Some(ref id) = self.id {
            if node.get_attribute("id").as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|class| node.has_class(class)) {
            return false;
        }
        self.attributes.iter().all(|test| match (node.get_attribute(&test.name), &test.value) {
            (None, _) => false,
            (Some(_), None) => true,
            // `type` is an enumerated attribute and compares case-insensitively.
            (Some(actual), Some(expected)) if test.name == "type" => {
                actual.eq_ignore_ascii_case(expected)
            }
            (Some(actual), Some(expected)) => actual == *expected,
        })
    }
}

/// A comma-separated selector group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<CompoundSelector>,
}

impl Selector {
    pub fn parse(text: &str) -> Result<Self, DomError> {
        let alternatives = text
            .split(',')
            .map(CompoundSelector::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { alternatives })
    }

    pub fn matches(&self, node: &Node) -> bool {
        self.alternatives.iter().any(|alt| alt.matches(node))
    }
}
