//! Per-evaluation scratch state.

use crate::document::Document;
use crate::location::{JsonLocation, PathElement};
use crate::node::{NodeKind, PathNode, ValueRef};
use crate::options::ResultOptions;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::trace;

/// Created at the start of one evaluation call and dropped at its end.
///
/// Holds the root-selector cache (keyed by the id each `$` occurrence got at
/// compile time) and every value synthesized during the call.
pub(crate) struct DynamicResources<'a, D> {
    root: &'a D,
    options: ResultOptions,
    cache: HashMap<usize, (Vec<PathNode<'a, D>>, NodeKind)>,
    synthesized: Vec<Rc<D>>,
}

impl<'a, D: Document> DynamicResources<'a, D> {
    pub(crate) fn new(root: &'a D, options: ResultOptions) -> Self {
        Self {
            root,
            options,
            cache: HashMap::new(),
            synthesized: Vec::new(),
        }
    }

    pub(crate) fn root(&self) -> &'a D {
        self.root
    }

    /// Extend `location` by one step, or skip the work when nobody needs it.
    pub(crate) fn child_location(&self, location: &JsonLocation, element: PathElement) -> JsonLocation {
        if self.options.tracks_locations() {
            location.child(element)
        } else {
            JsonLocation::root()
        }
    }

    pub(crate) fn synthesize(&mut self, value: D) -> ValueRef<'a, D> {
        let value = Rc::new(value);
        self.synthesized.push(Rc::clone(&value));
        ValueRef::Synthesized(value)
    }

    pub(crate) fn cached(&self, id: usize) -> Option<(Vec<PathNode<'a, D>>, NodeKind)> {
        let (nodes, kind) = self.cache.get(&id)?;
        trace!(root_id = id, nodes = nodes.len(), "root cache hit");
        Some((nodes.clone(), *kind))
    }

    pub(crate) fn store(&mut self, id: usize, nodes: Vec<PathNode<'a, D>>, kind: NodeKind) {
        self.cache.insert(id, (nodes, kind));
    }

    pub(crate) fn cached_roots(&self) -> usize {
        self.cache.len()
    }

    pub(crate) fn synthesized_count(&self) -> usize {
        self.synthesized.len()
    }
}
