//! Ordering and de-duplication of matched nodes.

use crate::location::JsonLocation;
use crate::node::PathNode;
use crate::options::ResultOptions;
use std::collections::HashSet;

/// Apply the ordering flags of `options` to `nodes`.
///
/// Sorting is stable and by location. With `NODUPS` alone the first
/// occurrence of each location is kept in match order.
pub(crate) fn assemble<'a, D>(mut nodes: Vec<PathNode<'a, D>>, options: ResultOptions) -> Vec<PathNode<'a, D>> {
    if options.sorted() || options.descending() {
        nodes.sort_by(|a, b| a.location.cmp(&b.location));
        if options.nodups() {
            nodes.dedup_by(|a, b| a.location == b.location);
        }
        if options.descending() {
            nodes.reverse();
        }
    } else if options.nodups() {
        let mut seen: HashSet<JsonLocation> = HashSet::with_capacity(nodes.len());
        nodes.retain(|node| seen.insert(node.location.clone()));
    }
    nodes
}
