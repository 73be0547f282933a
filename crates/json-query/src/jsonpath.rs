//! Compiled queries.

use crate::document::Document;
use crate::error::{EvalError, JsonPathError};
use crate::expression::Expression;
use crate::functions::Functions;
use crate::location::JsonLocation;
use crate::node::{PathNode, ValueRef};
use crate::options::ResultOptions;
use crate::parser;
use crate::resources::DynamicResources;
use crate::results;
use serde_json::Value;
use tracing::debug;

/// A compiled query, reusable across documents and threads.
///
/// ```
/// use json_query::{JsonPath, ResultOptions};
/// use serde_json::json;
///
/// let path = JsonPath::compile("$.books[?(@.price < 10)].title").unwrap();
/// let doc = json!({"books": [
///     {"title": "Sayings of the Century", "price": 8.95},
///     {"title": "Sword of Honour", "price": 12.99}
/// ]});
/// assert_eq!(path.evaluate(&doc, ResultOptions::VALUE).unwrap(), json!(["Sayings of the Century"]));
/// assert_eq!(path.evaluate(&doc, ResultOptions::PATH).unwrap(), json!(["$['books'][0]['title']"]));
/// ```
#[derive(Debug)]
pub struct JsonPath<D = Value> {
    expression: Expression<D>,
}

impl<D: Document> JsonPath<D> {
    /// Compile with the built-in function library.
    pub fn compile(text: &str) -> Result<Self, JsonPathError> {
        Self::compile_with(text, &Functions::new())
    }

    /// Compile with user functions, which shadow built-ins of the same name.
    pub fn compile_with(text: &str, functions: &Functions<D>) -> Result<Self, JsonPathError> {
        let (expression, roots) = parser::compile(text, functions)?;
        debug!(query = text, roots, "compiled query");
        Ok(Self { expression })
    }

    /// All matches as an array: the values, or with [`ResultOptions::PATH`]
    /// their normalized paths as strings.
    pub fn evaluate(&self, root: &D, options: ResultOptions) -> Result<D, EvalError> {
        let nodes = self.select(root, options)?;
        let items = if options.wants_paths() {
            nodes
                .iter()
                .map(|node| D::from_string(node.location.to_string()))
                .collect()
        } else {
            nodes.into_iter().map(|node| (*node.value).clone()).collect()
        };
        Ok(D::from_array(items))
    }

    /// Call `callback` with the location and value of every match, in
    /// result order.
    pub fn evaluate_with<F>(&self, root: &D, options: ResultOptions, mut callback: F) -> Result<(), EvalError>
    where
        F: FnMut(&JsonLocation, &D),
    {
        for node in self.select(root, options.with_locations())? {
            callback(&node.location, &node.value);
        }
        Ok(())
    }

    /// Locations of the matches, sorted and without duplicates.
    pub fn select_paths(&self, root: &D) -> Result<Vec<JsonLocation>, EvalError> {
        let nodes = self.select(root, ResultOptions::NODUPS | ResultOptions::SORT)?;
        Ok(nodes.into_iter().map(|node| node.location).collect())
    }

    /// Rewrite every match in place; returns how many values were visited.
    ///
    /// Matches are visited once each, deepest and last first, so removing or
    /// replacing a match never shifts a location still to be visited. Values
    /// computed by the query (function results, arithmetic) have no place in
    /// the document and are skipped.
    pub fn update<F>(&self, root: &mut D, mut callback: F) -> Result<usize, EvalError>
    where
        F: FnMut(&JsonLocation, &mut D),
    {
        let locations = self.document_locations(root)?;
        let mut visited = 0;
        for location in &locations {
            if let Some(value) = location.get_mut(root) {
                callback(location, value);
                visited += 1;
            }
        }
        debug!(visited, "updated matches");
        Ok(visited)
    }

    /// Remove every match from its parent; returns how many were removed.
    /// A match on the root itself cannot be removed and is ignored.
    pub fn remove(&self, root: &mut D) -> Result<usize, EvalError> {
        let locations = self.document_locations(root)?;
        let removed = locations.iter().filter(|location| location.remove(root)).count();
        debug!(removed, "removed matches");
        Ok(removed)
    }

    fn document_locations(&self, root: &D) -> Result<Vec<JsonLocation>, EvalError> {
        let nodes = self.select(root, ResultOptions::NODUPS | ResultOptions::SORT_DESCENDING)?;
        Ok(nodes
            .into_iter()
            .filter(|node| !node.value.is_synthesized())
            .map(|node| node.location)
            .collect())
    }

    fn select<'a>(&'a self, root: &'a D, options: ResultOptions) -> Result<Vec<PathNode<'a, D>>, EvalError> {
        let mut resources = DynamicResources::new(root, options);
        let current = ValueRef::Borrowed(root);
        let (nodes, _) = self
            .expression
            .evaluate(&mut resources, &JsonLocation::root(), &current)?;
        debug!(
            matches = nodes.len(),
            cached_roots = resources.cached_roots(),
            synthesized = resources.synthesized_count(),
            "evaluated query"
        );
        Ok(results::assemble(nodes, options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn compiled_queries_are_shareable() {
        assert_send_sync::<JsonPath>();
    }

    #[test]
    fn compiled_query_is_reusable() {
        let path = JsonPath::compile("$.a").unwrap();
        assert_eq!(path.evaluate(&json!({"a": 1}), ResultOptions::VALUE).unwrap(), json!([1]));
        assert_eq!(path.evaluate(&json!({"a": "x"}), ResultOptions::VALUE).unwrap(), json!(["x"]));
        assert_eq!(path.evaluate(&json!([1]), ResultOptions::VALUE).unwrap(), json!([]));
    }

    #[test]
    fn callback_sees_locations_in_value_mode() {
        let path = JsonPath::compile("$[*]").unwrap();
        let mut seen = Vec::new();
        path.evaluate_with(&json!(["a", "b"]), ResultOptions::VALUE, |location, value| {
            seen.push((location.to_string(), value.clone()));
        })
        .unwrap();
        assert_eq!(seen, vec![("$[0]".to_string(), json!("a")), ("$[1]".to_string(), json!("b"))]);
    }

    #[test]
    fn update_skips_computed_values() {
        let path = JsonPath::compile("$[?(@ > 1)]").unwrap();
        let mut doc = json!([1, 2, 3]);
        let visited = path.update(&mut doc, |_, v| *v = json!(0)).unwrap();
        assert_eq!(visited, 2);
        assert_eq!(doc, json!([1, 0, 0]));

        let computed = JsonPath::compile("length($)").unwrap();
        assert_eq!(computed.update(&mut doc, |_, v| *v = json!(9)).unwrap(), 0);
        assert_eq!(doc, json!([1, 0, 0]));
    }

    #[test]
    fn remove_goes_deepest_and_last_first() {
        let path = JsonPath::compile("$[0,2,0]").unwrap();
        let mut doc = json!(["a", "b", "c", "d"]);
        assert_eq!(path.remove(&mut doc).unwrap(), 2);
        assert_eq!(doc, json!(["b", "d"]));
    }
}
