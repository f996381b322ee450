//! Codec for the job description language.
//!
//! A description is an ordered attribute map written as `&(name=values)...`;
//! a `+`-prefixed form carries several descriptions in one source text. The
//! codec parses text into attribute maps and serializes them back,
//! preserving attribute order and the distinction between flat value lists
//! and parenthesized value groups.

mod parser;
mod unparse;

pub use parser::{parse, ParseError};
pub use unparse::{unparse, unparse_batch};

/// Value of a single attribute.
///
/// The wrapping syntax decides the form at parse time: a run of quoted or
/// bare tokens yields `Plain`, a run of parenthesized quoted tuples yields
/// `Groups`. The two forms never mix within one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// Flat ordered sequence of strings.
    Plain(Vec<String>),
    /// Ordered sequence of value groups, each an ordered sequence of strings.
    Groups(Vec<Vec<String>>),
}

impl AttrValue {
    /// The flat value list, if this attribute is plain-valued.
    pub fn as_plain(&self) -> Option<&[String]> {
        match self {
            AttrValue::Plain(values) => Some(values),
            AttrValue::Groups(_) => None,
        }
    }

    /// The value groups, if this attribute is group-valued.
    pub fn as_groups(&self) -> Option<&[Vec<String>]> {
        match self {
            AttrValue::Plain(_) => None,
            AttrValue::Groups(groups) => Some(groups),
        }
    }
}

/// One job's attribute map.
///
/// Attribute names are case-folded to ASCII lowercase. Insertion order is
/// preserved; inserting an existing name replaces its value in place, so a
/// name appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Description {
    entries: Vec<(String, AttrValue)>,
}

impl Description {
    /// Create an empty description.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the description has no attributes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or replace an attribute. The name is lowercased; a replaced
    /// attribute keeps its original position.
    pub fn insert(&mut self, name: &str, value: AttrValue) {
        let name = name.to_ascii_lowercase();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Look up an attribute by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        let name = name.to_ascii_lowercase();
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Mutable lookup by name (case-insensitive).
    pub fn get_mut(&mut self, name: &str) -> Option<&mut AttrValue> {
        let name = name.to_ascii_lowercase();
        self.entries
            .iter_mut()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    /// Iterate attributes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}
