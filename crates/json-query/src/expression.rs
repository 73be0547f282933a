//! Compiled expressions: postfix instruction lists run on a value stack.

use crate::document::Document;
use crate::error::EvalError;
use crate::location::JsonLocation;
use crate::node::{NodeKind, PathNode, ValueRef};
use crate::operators::{BinaryOperator, LogicalResult, UnaryOperator};
use crate::resources::DynamicResources;
use crate::selector::Selector;

#[derive(Debug)]
pub(crate) enum Instruction<D> {
    /// Push the document root.
    RootNode,
    /// Push the value the expression is evaluated against.
    CurrentNode,
    Literal(D),
    /// Pop a context value and push whatever the selector chain matches.
    Path(Selector<D>),
    Unary(UnaryOperator),
    Binary(BinaryOperator),
}

impl<D> Instruction<D> {
    /// How many values the instruction pops and pushes.
    fn stack_effect(&self) -> (usize, usize) {
        match self {
            Instruction::RootNode | Instruction::CurrentNode | Instruction::Literal(_) => (0, 1),
            Instruction::Path(_) | Instruction::Unary(_) => (1, 1),
            Instruction::Binary(_) => (2, 1),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Expression<D> {
    instructions: Vec<Instruction<D>>,
}

enum Operand<'a, D> {
    Value(PathNode<'a, D>),
    Nodes(Vec<PathNode<'a, D>>, NodeKind),
}

impl<D: Document> Expression<D> {
    /// `None` if the instructions do not leave exactly one value behind.
    pub(crate) fn new(instructions: Vec<Instruction<D>>) -> Option<Self> {
        let mut depth = 0usize;
        for instruction in &instructions {
            let (pops, pushes) = instruction.stack_effect();
            depth = depth.checked_sub(pops)? + pushes;
        }
        (depth == 1).then_some(Self { instructions })
    }

    #[cfg(test)]
    pub(crate) fn instructions(&self) -> &[Instruction<D>] {
        &self.instructions
    }

    /// Run against `current`. A bare path yields its matches; anything else
    /// yields one node holding the computed value at `location`.
    pub(crate) fn evaluate<'a>(
        &'a self,
        resources: &mut DynamicResources<'a, D>,
        location: &JsonLocation,
        current: &ValueRef<'a, D>,
    ) -> Result<(Vec<PathNode<'a, D>>, NodeKind), EvalError> {
        let mut stack: Vec<Operand<'a, D>> = Vec::new();
        for instruction in &self.instructions {
            match instruction {
                Instruction::RootNode => {
                    let root = ValueRef::Borrowed(resources.root());
                    stack.push(Operand::Value(PathNode::new(JsonLocation::root(), root)));
                }
                Instruction::CurrentNode => {
                    stack.push(Operand::Value(PathNode::new(location.clone(), current.clone())));
                }
                Instruction::Literal(value) => {
                    stack.push(Operand::Value(PathNode::new(location.clone(), ValueRef::Borrowed(value))));
                }
                Instruction::Path(selector) => {
                    let context = match stack.pop() {
                        Some(Operand::Value(node)) => node,
                        Some(Operand::Nodes(nodes, kind)) => {
                            PathNode::new(location.clone(), to_value(resources, nodes, kind))
                        }
                        None => return Err(EvalError::MalformedExpression),
                    };
                    let mut found = Vec::new();
                    let kind = selector.select(resources, &context.location, &context.value, &mut found)?;
                    stack.push(Operand::Nodes(found, kind));
                }
                Instruction::Unary(op) => {
                    let value = pop_value(resources, &mut stack)?;
                    let result = resources.synthesize(op.apply(&*value));
                    stack.push(Operand::Value(PathNode::new(location.clone(), result)));
                }
                Instruction::Binary(op) => {
                    let rhs = pop_value(resources, &mut stack)?;
                    let lhs = pop_value(resources, &mut stack)?;
                    let result = match op.logical(&*lhs) {
                        Some(LogicalResult::Lhs) => lhs,
                        Some(LogicalResult::Rhs) => rhs,
                        None => resources.synthesize(op.apply(&*lhs, &*rhs)),
                    };
                    stack.push(Operand::Value(PathNode::new(location.clone(), result)));
                }
            }
        }
        match stack.pop() {
            Some(Operand::Nodes(nodes, kind)) => Ok((nodes, kind)),
            Some(Operand::Value(node)) => Ok((vec![node], NodeKind::Single)),
            None => Err(EvalError::MalformedExpression),
        }
    }
}

fn pop_value<'a, D: Document>(
    resources: &mut DynamicResources<'a, D>,
    stack: &mut Vec<Operand<'a, D>>,
) -> Result<ValueRef<'a, D>, EvalError> {
    match stack.pop() {
        Some(Operand::Value(node)) => Ok(node.value),
        Some(Operand::Nodes(nodes, kind)) => Ok(to_value(resources, nodes, kind)),
        None => Err(EvalError::MalformedExpression),
    }
}

/// Collapse a path's matches into one operand value: a single-valued path
/// gives its match (or `null` when nothing matched), a multi-valued path
/// gives an array of its matches.
pub(crate) fn to_value<'a, D: Document>(
    resources: &mut DynamicResources<'a, D>,
    mut nodes: Vec<PathNode<'a, D>>,
    kind: NodeKind,
) -> ValueRef<'a, D> {
    match (kind, nodes.len()) {
        (NodeKind::Single, 0) => resources.synthesize(D::null()),
        (NodeKind::Single, 1) => match nodes.pop() {
            Some(node) => node.value,
            None => resources.synthesize(D::null()),
        },
        _ => {
            let items = nodes.iter().map(|node| (*node.value).clone()).collect();
            resources.synthesize(D::from_array(items))
        }
    }
}
