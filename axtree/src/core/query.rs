//! Structural search over a [`Tree`].
//!
//! A [`Query`] combines optional category/name matchers, an optional `nth`
//! and property filters. [`Tree::find`] escalates through progressively looser
//! interpretations of the query; the other searches apply it as given.

use crate::core::matcher::Matcher;
use crate::tree::{Node, NodeId, PropertyValue, Tree};

/// Criteria a node must satisfy to match.
#[derive(Debug, Clone, Default)]
pub struct Query {
    category: Option<Matcher>,
    name: Option<Matcher>,
    nth: Option<usize>,
    match_substrings: bool,
    filters: Vec<(String, PropertyValue)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, matcher: impl Into<Matcher>) -> Self {
        self.category = Some(matcher.into());
        self
    }

    pub fn name(mut self, matcher: impl Into<Matcher>) -> Self {
        self.name = Some(matcher.into());
        self
    }

    pub fn nth(mut self, nth: usize) -> Self {
        self.nth = Some(nth);
        self
    }

    /// Use contains semantics instead of whole-string matching.
    pub fn match_substrings(mut self, enabled: bool) -> Self {
        self.match_substrings = enabled;
        self
    }

    /// Require the node's resolved attribute `key` to equal `value`.
    pub fn with_property(mut self, key: &str, value: impl Into<PropertyValue>) -> Self {
        self.filters.push((key.to_string(), value.into()));
        self
    }

    pub fn has_name(&self) -> bool {
        self.name.is_some()
    }

    pub fn matches(&self, node: &Node) -> bool {
        if let Some(category) = &self.category {
            if !category.matches(&node.category, self.match_substrings) {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if !name.matches(&node.name, self.match_substrings) {
                return false;
            }
        }
        if let Some(nth) = self.nth {
            if node.nth != nth {
                return false;
            }
        }
        self.filters.iter().all(|(key, expected)| {
            node.attr(key)
                .is_ok_and(|actual| actual.loosely_eq(expected))
        })
    }

    fn map_matchers(&self, map: impl Fn(&Matcher) -> Matcher) -> Self {
        Self {
            category: self.category.as_ref().map(&map),
            name: self.name.as_ref().map(&map),
            ..self.clone()
        }
    }

    /// Same query with category/name taken as literal text.
    pub fn literal(&self) -> Self {
        self.map_matchers(Matcher::to_literal)
    }

    /// Same query with category/name taken as case-insensitive literal text.
    pub fn case_insensitive(&self) -> Self {
        self.map_matchers(Matcher::to_case_insensitive)
    }
}

impl Tree {
    /// First match under `from` (inclusive), loosening the query when needed.
    ///
    /// Passes: the query as given; then, if a name was supplied, the matchers as
    /// literal text; then the literal text ignoring case.
    pub fn find(&self, from: NodeId, query: &Query) -> Option<NodeId> {
        if let Some(found) = self.find_all(from, query).first() {
            return Some(*found);
        }
        if !query.has_name() {
            return None;
        }
        if let Some(found) = self.find_all(from, &query.literal()).first() {
            return Some(*found);
        }
        self.find_all(from, &query.case_insensitive())
            .first()
            .copied()
    }

    /// Every match under `from` (inclusive), in pre-order.
    pub fn find_all(&self, from: NodeId, query: &Query) -> Vec<NodeId> {
        self.descendants(from)
            .into_iter()
            .filter(|id| query.matches(self.get(*id)))
            .collect()
    }

    /// Matches after `from` in document order, excluding `from` and its subtree.
    pub fn search_forward(&self, from: NodeId, query: &Query) -> Vec<NodeId> {
        let mut results = Vec::new();
        let mut current = from;
        while let Some(parent) = self.parent(current) {
            let siblings = self.children(parent);
            let index = siblings
                .iter()
                .position(|sibling| *sibling == current)
                .unwrap_or(siblings.len());
            for sibling in siblings.iter().skip(index + 1) {
                results.extend(self.find_all(*sibling, query));
            }
            current = parent;
        }
        results
    }

    /// Matches before `from`, nearest first (reverse document order).
    ///
    /// Each ancestor level contributes its earlier siblings' subtrees in reverse
    /// pre-order, followed by the ancestor itself.
    pub fn search_backward(&self, from: NodeId, query: &Query) -> Vec<NodeId> {
        let mut results = Vec::new();
        let mut current = from;
        while let Some(parent) = self.parent(current) {
            let siblings = self.children(parent);
            let index = siblings
                .iter()
                .position(|sibling| *sibling == current)
                .unwrap_or(0);
            for sibling in siblings[..index].iter().rev() {
                let mut matches = self.find_all(*sibling, query);
                matches.reverse();
                results.extend(matches);
            }
            if query.matches(self.get(parent)) {
                results.push(parent);
            }
            current = parent;
        }
        results
    }

    /// Element with the given observation id, searching from the root.
    pub fn find_by_id(&self, element_id: i64) -> Option<NodeId> {
        self.all_nodes()
            .into_iter()
            .find(|id| self.get(*id).id == element_id)
    }
}
