//! The compiled selector tree and its evaluation.
//!
//! Every selector may own a tail: the rest of the path. A selector routes
//! each of its matches through the tail, and only the end of a chain pushes a
//! result node.

use crate::document::Document;
use crate::error::EvalError;
use crate::expression::Expression;
use crate::functions::Function;
use crate::location::{JsonLocation, PathElement};
use crate::node::{NodeKind, PathNode, ValueRef};
use crate::operators::is_false;
use crate::resources::DynamicResources;
use std::sync::Arc;

/// `[start:stop:step]`. The step is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Slice {
    pub(crate) start: Option<i64>,
    pub(crate) stop: Option<i64>,
    pub(crate) step: i64,
}

impl Slice {
    pub(crate) fn get_start(&self, size: usize) -> i64 {
        let len = size as i64;
        match self.start {
            Some(start) => {
                let start = if start < 0 { len + start } else { start };
                start.min(len)
            }
            None if self.step >= 0 => 0,
            None => len,
        }
    }

    pub(crate) fn get_stop(&self, size: usize) -> i64 {
        let len = size as i64;
        match self.stop {
            Some(stop) => {
                let stop = if stop < 0 { len + stop } else { stop };
                stop.min(len)
            }
            None if self.step >= 0 => len,
            None => -1,
        }
    }

    /// The indices this slice selects from an array of `size` elements.
    pub(crate) fn indices(&self, size: usize) -> Vec<usize> {
        let len = size as i64;
        let mut start = self.get_start(size);
        let mut stop = self.get_stop(size);
        let mut out = Vec::new();
        if self.step > 0 {
            start = start.max(0);
            let mut i = start;
            while i < stop {
                out.push(i as usize);
                let Some(next) = i.checked_add(self.step) else {
                    break;
                };
                i = next;
            }
        } else if self.step < 0 {
            if start >= len {
                start = len - 1;
            }
            if stop < -1 {
                stop = -1;
            }
            let mut i = start;
            while i > stop {
                if i >= 0 {
                    out.push(i as usize);
                }
                let Some(next) = i.checked_add(self.step) else {
                    break;
                };
                i = next;
            }
        }
        out
    }
}

/// Resolve a possibly negative index against an array length.
pub(crate) fn resolve_index(index: i64, size: usize) -> Option<usize> {
    let len = size as i64;
    let resolved = if index < 0 { len + index } else { index };
    (0..len).contains(&resolved).then_some(resolved as usize)
}

#[derive(Debug)]
pub(crate) enum SelectorKind<D> {
    /// The whole document. `id` keys the per-call cache.
    Root { id: usize },
    Current,
    Identifier(String),
    Index(i64),
    Wildcard,
    RecursiveDescent,
    Slice(Slice),
    Union(Vec<Expression<D>>),
    Filter(Expression<D>),
    /// `[(expr)]`: an integer indexes an array, a string keys an object.
    Expression(Expression<D>),
    Function {
        function: Arc<Function<D>>,
        args: Vec<Expression<D>>,
    },
}

#[derive(Debug)]
pub(crate) struct Selector<D> {
    kind: SelectorKind<D>,
    tail: Option<Box<Selector<D>>>,
}

impl<D: Document> Selector<D> {
    pub(crate) fn new(kind: SelectorKind<D>) -> Self {
        Self { kind, tail: None }
    }

    /// Attach `next` at the end of this chain.
    pub(crate) fn append(&mut self, next: Selector<D>) {
        match self.tail {
            Some(ref mut tail) => tail.append(next),
            None => self.tail = Some(Box::new(next)),
        }
    }

    /// Whether the rest of the chain can yield several nodes. Used when this
    /// selector matched nothing, so the tail never ran.
    fn tail_kind(&self) -> NodeKind {
        let mut kind = NodeKind::Single;
        let mut next = self.tail.as_deref();
        while let Some(selector) = next {
            let own = match selector.kind {
                SelectorKind::Wildcard
                | SelectorKind::RecursiveDescent
                | SelectorKind::Slice(_)
                | SelectorKind::Union(_)
                | SelectorKind::Filter(_) => NodeKind::Multi,
                _ => NodeKind::Single,
            };
            kind = kind.or(own);
            next = selector.tail.as_deref();
        }
        kind
    }

    fn evaluate_tail<'a>(
        &'a self,
        resources: &mut DynamicResources<'a, D>,
        location: JsonLocation,
        value: ValueRef<'a, D>,
        nodes: &mut Vec<PathNode<'a, D>>,
    ) -> Result<NodeKind, EvalError> {
        match &self.tail {
            Some(tail) => tail.select(resources, &location, &value, nodes),
            None => {
                nodes.push(PathNode::new(location, value));
                Ok(NodeKind::Single)
            }
        }
    }

    pub(crate) fn select<'a>(
        &'a self,
        resources: &mut DynamicResources<'a, D>,
        location: &JsonLocation,
        current: &ValueRef<'a, D>,
        nodes: &mut Vec<PathNode<'a, D>>,
    ) -> Result<NodeKind, EvalError> {
        match &self.kind {
            SelectorKind::Root { id } => {
                if let Some((cached, kind)) = resources.cached(*id) {
                    nodes.extend(cached);
                    return Ok(kind);
                }
                let mut found = Vec::new();
                let root = ValueRef::Borrowed(resources.root());
                let kind = self.evaluate_tail(resources, JsonLocation::root(), root, &mut found)?;
                resources.store(*id, found.clone(), kind);
                nodes.extend(found);
                Ok(kind)
            }
            SelectorKind::Current => {
                self.evaluate_tail(resources, location.clone(), current.clone(), nodes)
            }
            SelectorKind::Identifier(name) => self.select_identifier(resources, name, location, current, nodes),
            SelectorKind::Index(index) => {
                if !current.is_array() {
                    return Ok(self.tail_kind());
                }
                let Some(i) = resolve_index(*index, current.size()) else {
                    return Ok(self.tail_kind());
                };
                match current.element(i) {
                    Some(child) => {
                        let location = resources.child_location(location, PathElement::Index(i));
                        self.evaluate_tail(resources, location, child, nodes)
                    }
                    None => Ok(self.tail_kind()),
                }
            }
            SelectorKind::Wildcard => {
                self.each_child(resources, location, current, nodes)?;
                Ok(NodeKind::Multi)
            }
            SelectorKind::RecursiveDescent => {
                self.descend(resources, location, current, nodes)?;
                Ok(NodeKind::Multi)
            }
            SelectorKind::Slice(slice) => {
                if current.is_array() {
                    let elements = current.elements();
                    for i in slice.indices(elements.len()) {
                        let location = resources.child_location(location, PathElement::Index(i));
                        self.evaluate_tail(resources, location, elements[i].clone(), nodes)?;
                    }
                }
                Ok(NodeKind::Multi)
            }
            SelectorKind::Union(branches) => {
                for branch in branches {
                    let (found, _) = branch.evaluate(resources, location, current)?;
                    for node in found {
                        self.evaluate_tail(resources, node.location, node.value, nodes)?;
                    }
                }
                Ok(NodeKind::Multi)
            }
            SelectorKind::Filter(predicate) => {
                if current.is_array() {
                    for (i, element) in current.elements().into_iter().enumerate() {
                        let location = resources.child_location(location, PathElement::Index(i));
                        let (found, _) = predicate.evaluate(resources, &location, &element)?;
                        if is_true(&found) {
                            self.evaluate_tail(resources, location, element, nodes)?;
                        }
                    }
                } else if current.is_object() {
                    let (found, _) = predicate.evaluate(resources, location, current)?;
                    if is_true(&found) {
                        self.evaluate_tail(resources, location.clone(), current.clone(), nodes)?;
                    }
                }
                Ok(NodeKind::Multi)
            }
            SelectorKind::Expression(expr) => {
                let (found, _) = expr.evaluate(resources, location, current)?;
                // Only a single value can name a child.
                let [key] = found.as_slice() else {
                    return Ok(self.tail_kind());
                };
                if current.is_array() {
                    if let Some(i) = key.value.as_i64().and_then(|n| resolve_index(n, current.size())) {
                        if let Some(child) = current.element(i) {
                            let location = resources.child_location(location, PathElement::Index(i));
                            return self.evaluate_tail(resources, location, child, nodes);
                        }
                    }
                } else if current.is_object() {
                    if let Some(name) = key.value.as_str() {
                        if let Some(child) = current.member(name) {
                            let location = resources.child_location(location, PathElement::Name(name.to_string()));
                            return self.evaluate_tail(resources, location, child, nodes);
                        }
                    }
                }
                Ok(self.tail_kind())
            }
            SelectorKind::Function { function, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    let (found, kind) = arg.evaluate(resources, location, current)?;
                    values.push(crate::expression::to_value(resources, found, kind));
                }
                let refs: Vec<&D> = values.iter().map(|v| &**v).collect();
                let result = function.call(&refs)?;
                let result = resources.synthesize(result);
                self.evaluate_tail(resources, location.clone(), result, nodes)
            }
        }
    }

    fn select_identifier<'a>(
        &'a self,
        resources: &mut DynamicResources<'a, D>,
        name: &str,
        location: &JsonLocation,
        current: &ValueRef<'a, D>,
        nodes: &mut Vec<PathNode<'a, D>>,
    ) -> Result<NodeKind, EvalError> {
        if current.is_object() {
            if let Some(child) = current.member(name) {
                let location = resources.child_location(location, PathElement::Name(name.to_string()));
                return self.evaluate_tail(resources, location, child, nodes);
            }
        } else if current.is_array() {
            if let Ok(index) = name.parse::<i64>() {
                if let Some(i) = resolve_index(index, current.size()) {
                    if let Some(child) = current.element(i) {
                        let location = resources.child_location(location, PathElement::Index(i));
                        return self.evaluate_tail(resources, location, child, nodes);
                    }
                }
            } else if name == "length" {
                let length = resources.synthesize(D::from_u64(current.size() as u64));
                let location = resources.child_location(location, PathElement::Name(name.to_string()));
                return self.evaluate_tail(resources, location, length, nodes);
            }
        } else if let (Some(text), "length") = (current.as_str(), name) {
            let length = resources.synthesize(D::from_u64(text.chars().count() as u64));
            let location = resources.child_location(location, PathElement::Name(name.to_string()));
            return self.evaluate_tail(resources, location, length, nodes);
        }
        Ok(self.tail_kind())
    }

    fn each_child<'a>(
        &'a self,
        resources: &mut DynamicResources<'a, D>,
        location: &JsonLocation,
        current: &ValueRef<'a, D>,
        nodes: &mut Vec<PathNode<'a, D>>,
    ) -> Result<(), EvalError> {
        if current.is_array() {
            for (i, element) in current.elements().into_iter().enumerate() {
                let location = resources.child_location(location, PathElement::Index(i));
                self.evaluate_tail(resources, location, element, nodes)?;
            }
        } else if current.is_object() {
            for (name, member) in current.members() {
                let location = resources.child_location(location, PathElement::Name(name));
                self.evaluate_tail(resources, location, member, nodes)?;
            }
        }
        Ok(())
    }

    /// The current container itself, then every descendant, pre-order.
    fn descend<'a>(
        &'a self,
        resources: &mut DynamicResources<'a, D>,
        location: &JsonLocation,
        current: &ValueRef<'a, D>,
        nodes: &mut Vec<PathNode<'a, D>>,
    ) -> Result<(), EvalError> {
        if current.is_array() {
            self.evaluate_tail(resources, location.clone(), current.clone(), nodes)?;
            for (i, element) in current.elements().into_iter().enumerate() {
                let location = resources.child_location(location, PathElement::Index(i));
                self.descend(resources, &location, &element, nodes)?;
            }
        } else if current.is_object() {
            self.evaluate_tail(resources, location.clone(), current.clone(), nodes)?;
            for (name, member) in current.members() {
                let location = resources.child_location(location, PathElement::Name(name));
                self.descend(resources, &location, &member, nodes)?;
            }
        }
        Ok(())
    }
}

/// Filter truthiness: a non-empty result set whose only value, if it has
/// exactly one, is not falsy.
pub(crate) fn is_true<D: Document>(nodes: &[PathNode<'_, D>]) -> bool {
    match nodes {
        [] => false,
        [single] => !is_false(&*single.value),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice(start: Option<i64>, stop: Option<i64>, step: i64) -> Slice {
        Slice { start, stop, step }
    }

    #[test]
    fn forward_slices() {
        assert_eq!(slice(Some(1), Some(3), 1).indices(5), vec![1, 2]);
        assert_eq!(slice(None, None, 2).indices(5), vec![0, 2, 4]);
        assert_eq!(slice(Some(-10), None, 1).indices(3), vec![0, 1, 2]);
        assert_eq!(slice(Some(-2), None, 1).indices(5), vec![3, 4]);
        assert_eq!(slice(Some(7), None, 1).indices(5), Vec::<usize>::new());
    }

    #[test]
    fn backward_slices() {
        assert_eq!(slice(None, None, -1).indices(4), vec![3, 2, 1, 0]);
        assert_eq!(slice(Some(5), Some(1), -2).indices(7), vec![5, 3]);
        assert_eq!(slice(Some(3), Some(-10), -1).indices(5), vec![3, 2, 1, 0]);
        assert_eq!(slice(Some(-10), None, -1).indices(5), Vec::<usize>::new());
        assert_eq!(slice(Some(10), None, -1).indices(3), vec![2, 1, 0]);
    }

    #[test]
    fn extreme_steps_stop_instead_of_overflowing() {
        assert_eq!(slice(Some(1), None, i64::MAX).indices(3), vec![1]);
        assert_eq!(slice(None, None, i64::MAX - 1).indices(5), vec![0]);
        assert_eq!(slice(None, None, i64::MIN).indices(3), vec![2]);
        assert_eq!(slice(Some(i64::MIN), Some(i64::MAX), 1).indices(2), vec![0, 1]);
        assert_eq!(slice(Some(i64::MAX), Some(i64::MIN), -1).indices(2), vec![1, 0]);
    }

    #[test]
    fn negative_indices_resolve_from_end() {
        assert_eq!(resolve_index(-1, 3), Some(2));
        assert_eq!(resolve_index(-3, 3), Some(0));
        assert_eq!(resolve_index(-4, 3), None);
        assert_eq!(resolve_index(3, 3), None);
        assert_eq!(resolve_index(0, 0), None);
    }
}
