//! Evaluation-time nodes.

use crate::document::Document;
use crate::location::JsonLocation;
use std::ops::Deref;
use std::rc::Rc;

/// A matched value: either borrowed from the document (or from a literal in
/// the compiled query) or synthesized during the evaluation call.
#[derive(Debug)]
pub(crate) enum ValueRef<'a, D> {
    Borrowed(&'a D),
    Synthesized(Rc<D>),
}

impl<D> Clone for ValueRef<'_, D> {
    fn clone(&self) -> Self {
        match self {
            ValueRef::Borrowed(value) => ValueRef::Borrowed(value),
            ValueRef::Synthesized(value) => ValueRef::Synthesized(Rc::clone(value)),
        }
    }
}

impl<D> Deref for ValueRef<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        match self {
            ValueRef::Borrowed(value) => value,
            ValueRef::Synthesized(value) => value,
        }
    }
}

impl<'a, D: Document> ValueRef<'a, D> {
    pub(crate) fn is_synthesized(&self) -> bool {
        matches!(self, ValueRef::Synthesized(_))
    }

    /// Children of a synthesized value are copied out, since they cannot
    /// borrow for `'a`.
    pub(crate) fn member(&self, name: &str) -> Option<ValueRef<'a, D>> {
        match self {
            ValueRef::Borrowed(value) => value.member(name).map(ValueRef::Borrowed),
            ValueRef::Synthesized(value) => value
                .member(name)
                .map(|child| ValueRef::Synthesized(Rc::new(child.clone()))),
        }
    }

    pub(crate) fn element(&self, index: usize) -> Option<ValueRef<'a, D>> {
        match self {
            ValueRef::Borrowed(value) => value.element(index).map(ValueRef::Borrowed),
            ValueRef::Synthesized(value) => value
                .element(index)
                .map(|child| ValueRef::Synthesized(Rc::new(child.clone()))),
        }
    }

    /// Member names and values, in insertion order.
    pub(crate) fn members(&self) -> Vec<(String, ValueRef<'a, D>)> {
        match self {
            ValueRef::Borrowed(value) => value
                .members()
                .map(|(name, child)| (name.to_string(), ValueRef::Borrowed(child)))
                .collect(),
            ValueRef::Synthesized(value) => value
                .members()
                .map(|(name, child)| {
                    (name.to_string(), ValueRef::Synthesized(Rc::new(child.clone())))
                })
                .collect(),
        }
    }

    pub(crate) fn elements(&self) -> Vec<ValueRef<'a, D>> {
        match self {
            ValueRef::Borrowed(value) => value.elements().map(ValueRef::Borrowed).collect(),
            ValueRef::Synthesized(value) => value
                .elements()
                .map(|child| ValueRef::Synthesized(Rc::new(child.clone())))
                .collect(),
        }
    }
}

/// Whether a selector chain can yield at most one node or possibly many.
/// Decides how a path is turned into a value inside operator expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Single,
    Multi,
}

impl NodeKind {
    pub(crate) fn or(self, other: NodeKind) -> NodeKind {
        if self == NodeKind::Multi || other == NodeKind::Multi {
            NodeKind::Multi
        } else {
            NodeKind::Single
        }
    }
}

/// A location plus the value found there.
#[derive(Debug, Clone)]
pub(crate) struct PathNode<'a, D> {
    pub(crate) location: JsonLocation,
    pub(crate) value: ValueRef<'a, D>,
}

impl<'a, D> PathNode<'a, D> {
    pub(crate) fn new(location: JsonLocation, value: ValueRef<'a, D>) -> Self {
        Self { location, value }
    }
}
