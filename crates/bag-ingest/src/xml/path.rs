//! Element paths
//!
//! A small subset of XPath location paths, enough for the BAG extraction
//! specs: `//a/b/c` finds the first `a` at or below the context element and
//! follows child steps `b` and `c` from there. Without the leading `//` the
//! first step is a child of the context element.
//!
//! Steps containing a prefix (`Objecten:status`) match the qualified name as
//! written in the document; bare steps (`status`) match the local name.

use std::fmt;

use super::element::{local_part, Element};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Anchor {
    DescendantOrSelf,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementPath {
    anchor: Anchor,
    steps: Vec<String>,
}

impl ElementPath {
    pub fn new(path: &str) -> Self {
        let (anchor, rest) = match path.strip_prefix("//") {
            Some(rest) => (Anchor::DescendantOrSelf, rest),
            None => (Anchor::Child, path.trim_start_matches('/')),
        };

        let steps = rest
            .split('/')
            .map(str::trim)
            .filter(|step| !step.is_empty())
            .map(str::to_string)
            .collect();

        Self { anchor, steps }
    }

    /// First element matching this path, in document order
    pub fn find<'e>(&self, context: &'e Element) -> Option<&'e Element> {
        let (first, rest) = self.steps.split_first()?;

        match self.anchor {
            Anchor::DescendantOrSelf => context
                .descendants_or_self()
                .filter(|candidate| step_matches(first, candidate))
                .find_map(|candidate| follow(candidate, rest)),
            Anchor::Child => context
                .child_elements()
                .filter(|candidate| step_matches(first, candidate))
                .find_map(|candidate| follow(candidate, rest)),
        }
    }

    /// Trimmed text of the first match
    pub fn find_text(&self, context: &Element) -> Option<String> {
        self.find(context).map(Element::text)
    }

    pub fn exists(&self, context: &Element) -> bool {
        self.find(context).is_some()
    }
}

impl From<&str> for ElementPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.anchor == Anchor::DescendantOrSelf {
            f.write_str("//")?;
        }
        f.write_str(&self.steps.join("/"))
    }
}

fn follow<'e>(element: &'e Element, steps: &[String]) -> Option<&'e Element> {
    let Some((step, rest)) = steps.split_first() else {
        return Some(element);
    };

    element
        .child_elements()
        .filter(|child| step_matches(step, child))
        .find_map(|child| follow(child, rest))
}

fn step_matches(step: &str, element: &Element) -> bool {
    if step.contains(':') {
        element.name == step
    } else {
        local_part(&element.name) == step
    }
}
