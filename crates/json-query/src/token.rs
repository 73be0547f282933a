//! Parse-time tokens and the shunting-yard reducer that turns them into
//! compiled expressions.
//!
//! Selectors, literals and context markers go straight to the output stack;
//! operators wait on the operator stack until an operator of looser binding
//! or the end of their scope arrives. `end_*` tokens pop the output back to
//! the matching `begin_*` marker and package that run into a sub-expression.

use crate::document::Document;
use crate::error::ErrorKind;
use crate::expression::{Expression, Instruction};
use crate::functions::Function;
use crate::operators::{BinaryOperator, Operator, UnaryOperator};
use crate::selector::{Selector, SelectorKind};
use std::sync::Arc;

#[derive(Debug)]
pub(crate) enum Token<D> {
    RootNode,
    CurrentNode,
    Literal(D),
    Selector(Selector<D>),
    Unary(UnaryOperator),
    Binary(BinaryOperator),
    BeginUnion,
    EndUnion,
    Separator,
    BeginFilter,
    EndFilter,
    BeginExpression,
    EndExpression,
    BeginFunction(Arc<Function<D>>),
    EndFunction,
    Argument,
    LParen,
    RParen,
}

impl<D> From<Operator> for Token<D> {
    fn from(op: Operator) -> Self {
        match op {
            Operator::Unary(op) => Token::Unary(op),
            Operator::Binary(op) => Token::Binary(op),
        }
    }
}

enum Pending {
    Operator(Operator),
    /// `(` of a parenthesized sub-expression.
    Group,
    /// Start of a filter, computed expression or function call.
    Scope,
}

pub(crate) struct Reducer<D> {
    output: Vec<Token<D>>,
    operators: Vec<Pending>,
}

impl<D: Document> Reducer<D> {
    pub(crate) fn new() -> Self {
        Self {
            output: Vec::new(),
            operators: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, token: Token<D>) -> Result<(), ErrorKind> {
        match token {
            Token::Selector(selector) => self.push_selector(selector),
            Token::Unary(op) => self.push_operator(Operator::Unary(op)),
            Token::Binary(op) => self.push_operator(Operator::Binary(op)),
            Token::LParen => self.operators.push(Pending::Group),
            Token::RParen => self.close_group()?,
            Token::BeginFilter | Token::BeginExpression | Token::BeginFunction(_) => {
                self.output.push(token);
                self.operators.push(Pending::Scope);
            }
            Token::EndFilter => {
                self.unwind_scope(true)?;
                let (_, tokens) = self.drain_to(|t| matches!(t, Token::BeginFilter))?;
                let predicate = package(tokens)?;
                self.push_selector(Selector::new(SelectorKind::Filter(predicate)));
            }
            Token::EndExpression => {
                self.unwind_scope(true)?;
                let (_, tokens) = self.drain_to(|t| matches!(t, Token::BeginExpression))?;
                let expr = package(tokens)?;
                self.push_selector(Selector::new(SelectorKind::Expression(expr)));
            }
            Token::Argument => {
                self.unwind_scope(false)?;
                self.output.push(Token::Argument);
            }
            Token::EndFunction => self.end_function()?,
            Token::EndUnion => self.end_union()?,
            Token::BeginUnion | Token::Separator | Token::RootNode | Token::CurrentNode | Token::Literal(_) => {
                self.output.push(token);
            }
        }
        Ok(())
    }

    /// Whether a `(` is open in the innermost scope.
    pub(crate) fn has_open_group(&self) -> bool {
        for pending in self.operators.iter().rev() {
            match pending {
                Pending::Group => return true,
                Pending::Scope => return false,
                Pending::Operator(_) => {}
            }
        }
        false
    }

    /// Package everything left into the top-level expression.
    pub(crate) fn finish(mut self) -> Result<Expression<D>, ErrorKind> {
        while let Some(pending) = self.operators.pop() {
            match pending {
                Pending::Operator(op) => self.output.push(op.into()),
                Pending::Group | Pending::Scope => return Err(ErrorKind::UnbalancedParenthesis),
            }
        }
        package(self.output)
    }

    /// Selectors extend the chain they follow; anything else starts a new one.
    fn push_selector(&mut self, selector: Selector<D>) {
        match self.output.last_mut() {
            Some(Token::Selector(chain)) => chain.append(selector),
            _ => self.output.push(Token::Selector(selector)),
        }
    }

    fn push_operator(&mut self, op: Operator) {
        loop {
            let reduce = match self.operators.last() {
                Some(Pending::Operator(top)) => {
                    top.precedence() < op.precedence()
                        || (top.precedence() == op.precedence() && !op.is_right_associative())
                }
                _ => false,
            };
            if !reduce {
                break;
            }
            if let Some(Pending::Operator(top)) = self.operators.pop() {
                self.output.push(top.into());
            }
        }
        self.operators.push(Pending::Operator(op));
    }

    fn close_group(&mut self) -> Result<(), ErrorKind> {
        loop {
            match self.operators.pop() {
                Some(Pending::Operator(op)) => self.output.push(op.into()),
                Some(Pending::Group) => return Ok(()),
                Some(Pending::Scope) | None => return Err(ErrorKind::UnbalancedParenthesis),
            }
        }
    }

    /// Flush operators of the innermost scope, optionally closing it.
    fn unwind_scope(&mut self, close: bool) -> Result<(), ErrorKind> {
        loop {
            match self.operators.last() {
                Some(Pending::Operator(_)) => {
                    if let Some(Pending::Operator(op)) = self.operators.pop() {
                        self.output.push(op.into());
                    }
                }
                Some(Pending::Scope) => {
                    if close {
                        self.operators.pop();
                    }
                    return Ok(());
                }
                Some(Pending::Group) | None => return Err(ErrorKind::UnbalancedParenthesis),
            }
        }
    }

    /// Split off the output after the last marker matching `is_marker`.
    fn drain_to(&mut self, is_marker: fn(&Token<D>) -> bool) -> Result<(Token<D>, Vec<Token<D>>), ErrorKind> {
        let start = self
            .output
            .iter()
            .rposition(is_marker)
            .ok_or(ErrorKind::UnbalancedBraces)?;
        let mut tokens = self.output.split_off(start);
        let marker = tokens.remove(0);
        Ok((marker, tokens))
    }

    fn end_function(&mut self) -> Result<(), ErrorKind> {
        if !matches!(self.output.last(), Some(Token::BeginFunction(_)) | Some(Token::Argument)) {
            self.unwind_scope(false)?;
            self.output.push(Token::Argument);
        }
        self.unwind_scope(true)?;
        let (marker, tokens) = self.drain_to(|t| matches!(t, Token::BeginFunction(_)))?;
        let Token::BeginFunction(function) = marker else {
            return Err(ErrorKind::SyntaxError);
        };
        let mut args = Vec::new();
        let mut current = Vec::new();
        for token in tokens {
            match token {
                Token::Argument => args.push(package(std::mem::take(&mut current))?),
                token => current.push(token),
            }
        }
        if !current.is_empty() {
            args.push(package(current)?);
        }
        if function.arity().is_some_and(|arity| arity != args.len()) {
            return Err(ErrorKind::InvalidArity);
        }
        self.push_selector(Selector::new(SelectorKind::Function { function, args }));
        Ok(())
    }

    fn end_union(&mut self) -> Result<(), ErrorKind> {
        let (_, tokens) = self.drain_to(|t| matches!(t, Token::BeginUnion))?;
        let mut branches: Vec<Vec<Token<D>>> = vec![Vec::new()];
        for token in tokens {
            match token {
                Token::Separator => branches.push(Vec::new()),
                token => {
                    if let Some(branch) = branches.last_mut() {
                        branch.push(token);
                    }
                }
            }
        }
        // `[name]`, `[0]`, `[?..]`: a lone relative selector needs no union.
        if branches.len() == 1 && branches[0].len() == 1 {
            if let Some(Token::Selector(_)) = branches[0].first() {
                if let Some(Token::Selector(selector)) = branches.pop().and_then(|mut b| b.pop()) {
                    self.push_selector(selector);
                    return Ok(());
                }
            }
        }
        let mut expressions = Vec::with_capacity(branches.len());
        for mut branch in branches {
            if !matches!(
                branch.first(),
                Some(Token::RootNode) | Some(Token::CurrentNode) | Some(Token::Literal(_))
            ) {
                branch.insert(0, Token::CurrentNode);
            }
            expressions.push(package(branch)?);
        }
        self.push_selector(Selector::new(SelectorKind::Union(expressions)));
        Ok(())
    }
}

fn package<D: Document>(tokens: Vec<Token<D>>) -> Result<Expression<D>, ErrorKind> {
    let mut instructions = Vec::with_capacity(tokens.len());
    for token in tokens {
        instructions.push(match token {
            Token::RootNode => Instruction::RootNode,
            Token::CurrentNode => Instruction::CurrentNode,
            Token::Literal(value) => Instruction::Literal(value),
            Token::Selector(selector) => Instruction::Path(selector),
            Token::Unary(op) => Instruction::Unary(op),
            Token::Binary(op) => Instruction::Binary(op),
            _ => return Err(ErrorKind::UnbalancedBraces),
        });
    }
    Expression::new(instructions).ok_or(ErrorKind::SyntaxError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Instruction;
    use serde_json::{json, Value};

    fn current_path(name: &str) -> Vec<Token<Value>> {
        let mut selector = Selector::new(SelectorKind::Current);
        selector.append(Selector::new(SelectorKind::Identifier(name.to_string())));
        vec![Token::CurrentNode, Token::Selector(selector)]
    }

    fn shape(expr: &Expression<Value>) -> Vec<String> {
        expr.instructions()
            .iter()
            .map(|i| match i {
                Instruction::RootNode => "$".to_string(),
                Instruction::CurrentNode => "@".to_string(),
                Instruction::Literal(v) => v.to_string(),
                Instruction::Path(_) => "path".to_string(),
                Instruction::Unary(UnaryOperator::Not) => "!".to_string(),
                Instruction::Unary(UnaryOperator::Negate) => "neg".to_string(),
                Instruction::Unary(UnaryOperator::RegexMatch(_)) => "=~".to_string(),
                Instruction::Binary(op) => format!("{op:?}"),
            })
            .collect()
    }

    #[test]
    fn precedence_orders_postfix_output() {
        let mut reducer = Reducer::<Value>::new();
        // @.a + 1 * 2 < 10
        for token in current_path("a") {
            reducer.push(token).unwrap();
        }
        reducer.push(Token::Binary(BinaryOperator::Plus)).unwrap();
        reducer.push(Token::Literal(json!(1))).unwrap();
        reducer.push(Token::Binary(BinaryOperator::Mult)).unwrap();
        reducer.push(Token::Literal(json!(2))).unwrap();
        reducer.push(Token::Binary(BinaryOperator::Lt)).unwrap();
        reducer.push(Token::Literal(json!(10))).unwrap();
        let expr = reducer.finish().unwrap();
        assert_eq!(
            shape(&expr),
            vec!["@", "path", "1", "2", "Mult", "Plus", "10", "Lt"]
        );
    }

    #[test]
    fn equal_precedence_is_left_associative() {
        let mut reducer = Reducer::<Value>::new();
        // 8 - 4 - 2
        reducer.push(Token::Literal(json!(8))).unwrap();
        reducer.push(Token::Binary(BinaryOperator::Minus)).unwrap();
        reducer.push(Token::Literal(json!(4))).unwrap();
        reducer.push(Token::Binary(BinaryOperator::Minus)).unwrap();
        reducer.push(Token::Literal(json!(2))).unwrap();
        let expr = reducer.finish().unwrap();
        assert_eq!(shape(&expr), vec!["8", "4", "Minus", "2", "Minus"]);
    }

    #[test]
    fn groups_override_precedence() {
        let mut reducer = Reducer::<Value>::new();
        // (1 + 2) * 3
        reducer.push(Token::LParen).unwrap();
        reducer.push(Token::Literal(json!(1))).unwrap();
        reducer.push(Token::Binary(BinaryOperator::Plus)).unwrap();
        reducer.push(Token::Literal(json!(2))).unwrap();
        reducer.push(Token::RParen).unwrap();
        reducer.push(Token::Binary(BinaryOperator::Mult)).unwrap();
        reducer.push(Token::Literal(json!(3))).unwrap();
        let expr = reducer.finish().unwrap();
        assert_eq!(shape(&expr), vec!["1", "2", "Plus", "3", "Mult"]);
        assert!(!Reducer::<Value>::new().has_open_group());
    }

    #[test]
    fn unmatched_right_paren_is_rejected() {
        let mut reducer = Reducer::<Value>::new();
        reducer.push(Token::Literal(json!(1))).unwrap();
        assert_eq!(reducer.push(Token::RParen), Err(ErrorKind::UnbalancedParenthesis));
    }

    #[test]
    fn filter_scope_becomes_a_selector() {
        let mut reducer = Reducer::<Value>::new();
        reducer.push(Token::RootNode).unwrap();
        reducer.push(Token::Selector(Selector::new(SelectorKind::Root { id: 0 }))).unwrap();
        reducer.push(Token::BeginUnion).unwrap();
        reducer.push(Token::BeginFilter).unwrap();
        for token in current_path("a") {
            reducer.push(token).unwrap();
        }
        reducer.push(Token::EndFilter).unwrap();
        reducer.push(Token::EndUnion).unwrap();
        let expr = reducer.finish().unwrap();
        assert_eq!(shape(&expr), vec!["$", "path"]);
    }
}
