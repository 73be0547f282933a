//! Query compiler: a character-driven state machine feeding the reducer.
//!
//! The compiler keeps a stack of states. Each step looks at the next
//! character (or end of input) and either consumes it, replaces the top
//! state, or pushes/pops states. Tokens go to the [`Reducer`] as soon as
//! they are recognized, so there is no separate syntax tree.

use crate::document::Document;
use crate::error::{ErrorKind, JsonPathError};
use crate::expression::Expression;
use crate::functions::Functions;
use crate::operators::{BinaryOperator, UnaryOperator};
use crate::selector::{Selector, SelectorKind, Slice};
use crate::token::{Reducer, Token};
use regex::RegexBuilder;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    TopLevelFunction,
    PathRhs,
    DotSelector,
    RecursiveName,
    DotName,
    UnquotedName,
    IdentifierEnd,
    SingleQuoted,
    DoubleQuoted,
    EscapeChar,
    EscapeU1,
    EscapeU2,
    EscapeU3,
    EscapeU4,
    SurrogateBackslash,
    SurrogateU,
    EscapeU5,
    EscapeU6,
    EscapeU7,
    EscapeU8,
    BracketElement,
    BracketEnd,
    IndexOrSlice,
    Integer,
    Digits,
    SliceStop,
    SliceStep,
    FilterEnd,
    ExpressionEnd,
    Operand,
    ExpressionRhs,
    StringLiteral,
    NumberLiteral,
    JsonText,
    JsonTextString,
    JsonTextEscape,
    NameOrFunction,
    FunctionArgs,
    ArgumentOrRightParen,
    CmpLtOrLte,
    CmpGtOrGte,
    CmpNe,
    EqOrRegex,
    ExpectRegex,
    Regex,
    RegexEscape,
    RegexFlags,
    ExpectOr,
    ExpectAnd,
}

/// Compile `input`, resolving function names against `functions`. Also
/// returns how many `$` occurrences the query holds.
pub(crate) fn compile<D: Document>(
    input: &str,
    functions: &Functions<D>,
) -> Result<(Expression<D>, usize), JsonPathError> {
    Compiler::new(input, functions).run()
}

struct Compiler<'a, D> {
    input: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    states: Vec<State>,
    reducer: Reducer<D>,
    functions: &'a Functions<D>,
    buffer: String,
    slice_start: Option<i64>,
    slice_stop: Option<i64>,
    code_point: u32,
    low_surrogate: u32,
    json_depth: usize,
    next_root_id: usize,
}

impl<'a, D: Document> Compiler<'a, D> {
    fn new(input: &'a str, functions: &'a Functions<D>) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
            states: vec![State::Start],
            reducer: Reducer::new(),
            functions,
            buffer: String::new(),
            slice_start: None,
            slice_stop: None,
            code_point: 0,
            low_surrogate: 0,
            json_depth: 0,
            next_root_id: 0,
        }
    }

    fn run(mut self) -> Result<(Expression<D>, usize), JsonPathError> {
        loop {
            let Some(&state) = self.states.last() else {
                return Err(self.error(ErrorKind::SyntaxError));
            };
            let c = self.peek();
            if c.is_none() && state == State::PathRhs && self.states.len() == 1 {
                break;
            }
            self.step(state, c)?;
        }
        let (line, column, roots) = (self.line, self.column, self.next_root_id);
        let expression = self
            .reducer
            .finish()
            .map_err(|kind| JsonPathError::new(kind, line, column))?;
        Ok((expression, roots))
    }

    fn step(&mut self, state: State, c: Option<char>) -> Result<(), JsonPathError> {
        use State::*;
        match state {
            Start => match c {
                Some(c) if is_space(c) => self.advance(),
                Some('$') => {
                    self.advance();
                    self.root_path()?;
                    self.replace(PathRhs);
                }
                Some(c) if is_name_start(c) => {
                    self.buffer.clear();
                    self.replace(TopLevelFunction);
                    self.push_state(UnquotedName);
                }
                Some(_) => return Err(self.error(ErrorKind::ExpectedRootOrFunction)),
                None => return Err(self.error(ErrorKind::UnexpectedEof)),
            },
            TopLevelFunction => match c {
                Some(c) if is_space(c) => self.advance(),
                Some('(') => self.begin_function(Some(PathRhs))?,
                _ => return Err(self.error(ErrorKind::ExpectedRootOrFunction)),
            },
            PathRhs => match c {
                Some(c) if is_space(c) => self.advance(),
                Some('.') => {
                    self.advance();
                    self.push_state(DotSelector);
                }
                Some('[') => {
                    self.advance();
                    self.open_bracket()?;
                }
                Some(',') | Some(']') => self.pop_state(),
                Some(_) => return Err(self.error(ErrorKind::ExpectedSeparator)),
                None => return Err(self.error(ErrorKind::UnexpectedEof)),
            },
            DotSelector => match c {
                Some('.') => {
                    self.advance();
                    self.emit(Token::Selector(Selector::new(SelectorKind::RecursiveDescent)))?;
                    self.replace(RecursiveName);
                }
                _ => self.replace(DotName),
            },
            RecursiveName => match c {
                Some('[') => {
                    self.advance();
                    self.emit(Token::BeginUnion)?;
                    self.replace(BracketEnd);
                    self.push_state(BracketElement);
                }
                Some(_) => self.replace(DotName),
                None => return Err(self.error(ErrorKind::UnexpectedEof)),
            },
            DotName => match c {
                Some(c) if is_space(c) => self.advance(),
                Some('*') => {
                    self.advance();
                    self.emit(Token::Selector(Selector::new(SelectorKind::Wildcard)))?;
                    self.pop_state();
                }
                Some('\'') => self.quoted_name(SingleQuoted, None),
                Some('"') => self.quoted_name(DoubleQuoted, None),
                Some(c) if is_name_delimiter(c) => return Err(self.error(ErrorKind::ExpectedKey)),
                Some(_) => {
                    self.buffer.clear();
                    self.replace(IdentifierEnd);
                    self.push_state(UnquotedName);
                }
                None => return Err(self.error(ErrorKind::UnexpectedEof)),
            },
            UnquotedName => match c {
                Some(c) if !is_name_delimiter(c) => {
                    self.buffer.push(c);
                    self.advance();
                }
                _ => self.pop_state(),
            },
            IdentifierEnd => {
                let name = std::mem::take(&mut self.buffer);
                self.emit(Token::Selector(Selector::new(SelectorKind::Identifier(name))))?;
                self.pop_state();
            }
            SingleQuoted | DoubleQuoted => {
                let quote = if state == SingleQuoted { '\'' } else { '"' };
                match c {
                    Some(c) if c == quote => {
                        self.advance();
                        self.pop_state();
                    }
                    Some('\\') => {
                        self.advance();
                        self.push_state(EscapeChar);
                    }
                    Some(c) => {
                        self.buffer.push(c);
                        self.advance();
                    }
                    None => return Err(self.error(ErrorKind::UnexpectedEof)),
                }
            }
            EscapeChar => {
                let unescaped = match c {
                    Some(c @ ('"' | '\'' | '\\' | '/')) => c,
                    Some('b') => '\u{08}',
                    Some('f') => '\u{0c}',
                    Some('n') => '\n',
                    Some('r') => '\r',
                    Some('t') => '\t',
                    Some('u') => {
                        self.advance();
                        self.code_point = 0;
                        self.replace(EscapeU1);
                        return Ok(());
                    }
                    Some(_) => return Err(self.error(ErrorKind::IllegalEscapedCharacter)),
                    None => return Err(self.error(ErrorKind::UnexpectedEof)),
                };
                self.buffer.push(unescaped);
                self.advance();
                self.pop_state();
            }
            EscapeU1 | EscapeU2 | EscapeU3 => {
                self.code_point = self.code_point * 16 + self.hex_digit(c)?;
                self.advance();
                self.replace(match state {
                    EscapeU1 => EscapeU2,
                    EscapeU2 => EscapeU3,
                    _ => EscapeU4,
                });
            }
            EscapeU4 => {
                self.code_point = self.code_point * 16 + self.hex_digit(c)?;
                self.advance();
                if (0xD800..0xDC00).contains(&self.code_point) {
                    self.replace(SurrogateBackslash);
                } else {
                    let c = char::from_u32(self.code_point).ok_or_else(|| self.error(ErrorKind::InvalidCodepoint))?;
                    self.buffer.push(c);
                    self.pop_state();
                }
            }
            SurrogateBackslash => match c {
                Some('\\') => {
                    self.advance();
                    self.replace(SurrogateU);
                }
                _ => return Err(self.error(ErrorKind::InvalidCodepoint)),
            },
            SurrogateU => match c {
                Some('u') => {
                    self.advance();
                    self.low_surrogate = 0;
                    self.replace(EscapeU5);
                }
                _ => return Err(self.error(ErrorKind::InvalidCodepoint)),
            },
            EscapeU5 | EscapeU6 | EscapeU7 => {
                self.low_surrogate = self.low_surrogate * 16 + self.hex_digit(c)?;
                self.advance();
                self.replace(match state {
                    EscapeU5 => EscapeU6,
                    EscapeU6 => EscapeU7,
                    _ => EscapeU8,
                });
            }
            EscapeU8 => {
                self.low_surrogate = self.low_surrogate * 16 + self.hex_digit(c)?;
                if !(0xDC00..0xE000).contains(&self.low_surrogate) {
                    return Err(self.error(ErrorKind::InvalidCodepoint));
                }
                let combined = 0x10000 + ((self.code_point - 0xD800) << 10) + (self.low_surrogate - 0xDC00);
                let c = char::from_u32(combined).ok_or_else(|| self.error(ErrorKind::InvalidCodepoint))?;
                self.buffer.push(c);
                self.advance();
                self.pop_state();
            }
            BracketElement => match c {
                Some(c) if is_space(c) => self.advance(),
                Some('*') => {
                    self.advance();
                    self.emit(Token::Selector(Selector::new(SelectorKind::Wildcard)))?;
                    self.replace(PathRhs);
                }
                Some('\'') => self.quoted_name(SingleQuoted, Some(PathRhs)),
                Some('"') => self.quoted_name(DoubleQuoted, Some(PathRhs)),
                Some(c) if c == '-' || c.is_ascii_digit() => {
                    self.buffer.clear();
                    self.replace(IndexOrSlice);
                    self.push_state(Integer);
                }
                Some(':') => {
                    self.buffer.clear();
                    self.replace(IndexOrSlice);
                }
                Some('?') => {
                    self.advance();
                    self.emit(Token::BeginFilter)?;
                    self.replace(FilterEnd);
                    self.push_state(ExpressionRhs);
                    self.push_state(Operand);
                }
                Some('(') => {
                    self.emit(Token::BeginExpression)?;
                    self.replace(ExpressionEnd);
                    self.push_state(ExpressionRhs);
                    self.push_state(Operand);
                }
                Some('$') => {
                    self.advance();
                    self.root_path()?;
                    self.replace(PathRhs);
                }
                Some('@') => {
                    self.advance();
                    self.current_path()?;
                    self.replace(PathRhs);
                }
                Some(c) if is_name_delimiter(c) => return Err(self.error(ErrorKind::ExpectedKey)),
                Some(_) => {
                    self.buffer.clear();
                    self.replace(PathRhs);
                    self.push_state(IdentifierEnd);
                    self.push_state(UnquotedName);
                }
                None => return Err(self.error(ErrorKind::UnexpectedEof)),
            },
            BracketEnd => match c {
                Some(c) if is_space(c) => self.advance(),
                Some(',') => {
                    self.advance();
                    self.emit(Token::Separator)?;
                    self.push_state(BracketElement);
                }
                Some(']') => {
                    self.advance();
                    self.emit(Token::EndUnion)?;
                    self.pop_state();
                }
                Some(_) => return Err(self.error(ErrorKind::ExpectedRightBracket)),
                None => return Err(self.error(ErrorKind::UnexpectedEof)),
            },
            Integer => match c {
                Some(c) if is_space(c) => self.advance(),
                Some('-') => {
                    self.buffer.push('-');
                    self.advance();
                    self.replace(Digits);
                }
                _ => self.replace(Digits),
            },
            Digits => match c {
                Some(c) if c.is_ascii_digit() => {
                    self.buffer.push(c);
                    self.advance();
                }
                _ => self.pop_state(),
            },
            IndexOrSlice => match c {
                Some(c) if is_space(c) => self.advance(),
                Some(']') | Some(',') => {
                    let index = self
                        .take_integer()?
                        .ok_or_else(|| self.error(ErrorKind::InvalidNumber))?;
                    self.emit(Token::Selector(Selector::new(SelectorKind::Index(index))))?;
                    self.pop_state();
                }
                Some(':') => {
                    self.slice_start = self.take_integer()?;
                    self.advance();
                    self.replace(SliceStop);
                    self.push_state(Integer);
                }
                Some(_) => return Err(self.error(ErrorKind::ExpectedRightBracket)),
                None => return Err(self.error(ErrorKind::UnexpectedEof)),
            },
            SliceStop => match c {
                Some(c) if is_space(c) => self.advance(),
                Some(']') | Some(',') => {
                    let stop = self.take_integer()?;
                    self.emit_slice(stop, 1)?;
                    self.pop_state();
                }
                Some(':') => {
                    self.slice_stop = self.take_integer()?;
                    self.advance();
                    self.replace(SliceStep);
                    self.push_state(Integer);
                }
                Some(_) => return Err(self.error(ErrorKind::ExpectedRightBracket)),
                None => return Err(self.error(ErrorKind::UnexpectedEof)),
            },
            SliceStep => match c {
                Some(c) if is_space(c) => self.advance(),
                Some(']') | Some(',') => {
                    let step = self.take_integer()?.unwrap_or(1);
                    if step == 0 {
                        return Err(self.error(ErrorKind::StepCannotBeZero));
                    }
                    self.emit_slice(self.slice_stop, step)?;
                    self.pop_state();
                }
                Some(_) => return Err(self.error(ErrorKind::ExpectedRightBracket)),
                None => return Err(self.error(ErrorKind::UnexpectedEof)),
            },
            FilterEnd | ExpressionEnd => match c {
                Some(c) if is_space(c) => self.advance(),
                Some(']') | Some(',') => {
                    self.emit(if state == FilterEnd {
                        Token::EndFilter
                    } else {
                        Token::EndExpression
                    })?;
                    self.pop_state();
                }
                Some(_) => return Err(self.error(ErrorKind::ExpectedRightBracket)),
                None => return Err(self.error(ErrorKind::UnexpectedEof)),
            },
            Operand => match c {
                Some(c) if is_space(c) => self.advance(),
                Some('$') => {
                    self.advance();
                    self.root_path()?;
                    self.pop_state();
                }
                Some('@') => {
                    self.advance();
                    self.current_path()?;
                    self.pop_state();
                }
                Some('(') => {
                    self.advance();
                    self.emit(Token::LParen)?;
                }
                Some('\'') => self.quoted_name(SingleQuoted, Some(StringLiteral)),
                Some('"') => self.quoted_name(DoubleQuoted, Some(StringLiteral)),
                Some('!') => {
                    self.advance();
                    self.emit(Token::Unary(UnaryOperator::Not))?;
                }
                Some('-') => {
                    self.advance();
                    self.emit(Token::Unary(UnaryOperator::Negate))?;
                }
                Some(c) if c.is_ascii_digit() => {
                    self.buffer.clear();
                    self.replace(NumberLiteral);
                }
                Some('[') | Some('{') => {
                    self.buffer.clear();
                    self.json_depth = 0;
                    self.replace(JsonText);
                }
                Some(c) if is_name_start(c) => {
                    self.buffer.clear();
                    self.replace(NameOrFunction);
                    self.push_state(UnquotedName);
                }
                Some(_) => return Err(self.error(ErrorKind::SyntaxError)),
                None => return Err(self.error(ErrorKind::UnexpectedEof)),
            },
            StringLiteral => {
                let value = D::from_string(std::mem::take(&mut self.buffer));
                self.emit(Token::Literal(value))?;
                self.pop_state();
            }
            NumberLiteral => match c {
                Some(c) if c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E') => {
                    self.buffer.push(c);
                    self.advance();
                }
                Some(c @ ('+' | '-')) if self.buffer.ends_with(|e: char| matches!(e, 'e' | 'E')) => {
                    self.buffer.push(c);
                    self.advance();
                }
                _ => {
                    let number = match serde_json::from_str::<Value>(&self.buffer) {
                        Ok(value) if value.is_number() => value,
                        _ => return Err(self.error(ErrorKind::InvalidNumber)),
                    };
                    self.emit(Token::Literal(D::from_json(&number)))?;
                    self.pop_state();
                }
            },
            JsonText => match c {
                Some(c) => {
                    self.buffer.push(c);
                    self.advance();
                    match c {
                        '[' | '{' => self.json_depth += 1,
                        ']' | '}' => {
                            self.json_depth -= 1;
                            if self.json_depth == 0 {
                                let value = serde_json::from_str::<Value>(&self.buffer)
                                    .map_err(|_| self.error(ErrorKind::InvalidLiteral))?;
                                self.emit(Token::Literal(D::from_json(&value)))?;
                                self.pop_state();
                            }
                        }
                        '"' => self.push_state(JsonTextString),
                        _ => {}
                    }
                }
                None => return Err(self.error(ErrorKind::UnexpectedEof)),
            },
            JsonTextString => match c {
                Some(c) => {
                    self.buffer.push(c);
                    self.advance();
                    match c {
                        '\\' => self.push_state(JsonTextEscape),
                        '"' => self.pop_state(),
                        _ => {}
                    }
                }
                None => return Err(self.error(ErrorKind::UnexpectedEof)),
            },
            JsonTextEscape => match c {
                Some(c) => {
                    self.buffer.push(c);
                    self.advance();
                    self.pop_state();
                }
                None => return Err(self.error(ErrorKind::UnexpectedEof)),
            },
            NameOrFunction => match c {
                Some(c) if is_space(c) => self.advance(),
                Some('(') => self.begin_function(None)?,
                _ => {
                    let value = match self.buffer.as_str() {
                        "true" => D::from_bool(true),
                        "false" => D::from_bool(false),
                        "null" => D::null(),
                        _ => return Err(self.error(ErrorKind::ExpectedRootOrCurrentNode)),
                    };
                    self.emit(Token::Literal(value))?;
                    self.pop_state();
                }
            },
            FunctionArgs => match c {
                Some(c) if is_space(c) => self.advance(),
                Some(',') => {
                    self.advance();
                    self.emit(Token::Argument)?;
                    self.push_state(ExpressionRhs);
                    self.push_state(Operand);
                }
                Some(')') => {
                    self.advance();
                    self.emit(Token::EndFunction)?;
                    self.pop_state();
                }
                Some(_) => return Err(self.error(ErrorKind::UnbalancedParenthesis)),
                None => return Err(self.error(ErrorKind::UnexpectedEof)),
            },
            ArgumentOrRightParen => match c {
                Some(c) if is_space(c) => self.advance(),
                Some(')') => self.pop_state(),
                Some(_) => {
                    self.replace(ExpressionRhs);
                    self.push_state(Operand);
                }
                None => return Err(self.error(ErrorKind::UnexpectedEof)),
            },
            ExpressionRhs => match c {
                Some(c) if is_space(c) => self.advance(),
                Some('.') => {
                    self.advance();
                    self.push_state(DotSelector);
                }
                Some('[') => {
                    self.advance();
                    self.open_bracket()?;
                }
                Some(')') => {
                    if self.reducer.has_open_group() {
                        self.advance();
                        self.emit(Token::RParen)?;
                    } else if self.state_below() == Some(FunctionArgs) {
                        self.pop_state();
                    } else {
                        return Err(self.error(ErrorKind::UnbalancedParenthesis));
                    }
                }
                Some(',') | Some(']') => self.pop_state(),
                Some('|') => {
                    self.advance();
                    self.push_state(Operand);
                    self.push_state(ExpectOr);
                }
                Some('&') => {
                    self.advance();
                    self.push_state(Operand);
                    self.push_state(ExpectAnd);
                }
                Some('<') => {
                    self.advance();
                    self.push_state(CmpLtOrLte);
                }
                Some('>') => {
                    self.advance();
                    self.push_state(CmpGtOrGte);
                }
                Some('=') => {
                    self.advance();
                    self.push_state(EqOrRegex);
                }
                Some('!') => {
                    self.advance();
                    self.push_state(CmpNe);
                }
                Some(c @ ('+' | '-' | '*' | '/')) => {
                    self.advance();
                    let op = match c {
                        '+' => BinaryOperator::Plus,
                        '-' => BinaryOperator::Minus,
                        '*' => BinaryOperator::Mult,
                        _ => BinaryOperator::Div,
                    };
                    self.emit(Token::Binary(op))?;
                    self.push_state(Operand);
                }
                Some(_) => return Err(self.error(ErrorKind::ExpectedSeparator)),
                None => return Err(self.error(ErrorKind::UnexpectedEof)),
            },
            CmpLtOrLte | CmpGtOrGte => {
                let (strict, inclusive) = if state == CmpLtOrLte {
                    (BinaryOperator::Lt, BinaryOperator::Lte)
                } else {
                    (BinaryOperator::Gt, BinaryOperator::Gte)
                };
                let op = if c == Some('=') {
                    self.advance();
                    inclusive
                } else {
                    strict
                };
                self.emit(Token::Binary(op))?;
                self.replace(Operand);
            }
            EqOrRegex => match c {
                Some('=') => {
                    self.advance();
                    self.emit(Token::Binary(BinaryOperator::Eq))?;
                    self.replace(Operand);
                }
                Some('~') => {
                    self.advance();
                    self.replace(ExpectRegex);
                }
                Some(_) => return Err(self.error(ErrorKind::ExpectedComparator)),
                None => return Err(self.error(ErrorKind::UnexpectedEof)),
            },
            CmpNe => match c {
                Some('=') => {
                    self.advance();
                    self.emit(Token::Binary(BinaryOperator::Ne))?;
                    self.replace(Operand);
                }
                Some(_) => return Err(self.error(ErrorKind::ExpectedComparator)),
                None => return Err(self.error(ErrorKind::UnexpectedEof)),
            },
            ExpectOr | ExpectAnd => {
                let (expected, op, kind) = if state == ExpectOr {
                    ('|', BinaryOperator::Or, ErrorKind::ExpectedOr)
                } else {
                    ('&', BinaryOperator::And, ErrorKind::ExpectedAnd)
                };
                match c {
                    Some(c) if c == expected => {
                        self.advance();
                        self.emit(Token::Binary(op))?;
                        self.pop_state();
                    }
                    Some(_) => return Err(self.error(kind)),
                    None => return Err(self.error(ErrorKind::UnexpectedEof)),
                }
            }
            ExpectRegex => match c {
                Some(c) if is_space(c) => self.advance(),
                Some('/') => {
                    self.advance();
                    self.buffer.clear();
                    self.replace(Regex);
                }
                Some(_) => return Err(self.error(ErrorKind::ExpectedForwardSlash)),
                None => return Err(self.error(ErrorKind::UnexpectedEof)),
            },
            Regex => match c {
                Some('\\') => {
                    self.advance();
                    self.push_state(RegexEscape);
                }
                Some('/') => {
                    self.advance();
                    self.replace(RegexFlags);
                }
                Some(c) => {
                    self.buffer.push(c);
                    self.advance();
                }
                None => return Err(self.error(ErrorKind::UnexpectedEof)),
            },
            RegexEscape => match c {
                Some('/') => {
                    self.buffer.push('/');
                    self.advance();
                    self.pop_state();
                }
                Some(c) => {
                    self.buffer.push('\\');
                    self.buffer.push(c);
                    self.advance();
                    self.pop_state();
                }
                None => return Err(self.error(ErrorKind::UnexpectedEof)),
            },
            RegexFlags => {
                let case_insensitive = c == Some('i');
                if case_insensitive {
                    self.advance();
                }
                let pattern = std::mem::take(&mut self.buffer);
                let regex = RegexBuilder::new(&pattern)
                    .case_insensitive(case_insensitive)
                    .build()
                    .map_err(|_| self.error(ErrorKind::InvalidRegex))?;
                self.emit(Token::Unary(UnaryOperator::RegexMatch(regex)))?;
                self.pop_state();
            }
        }
        Ok(())
    }

    /// `$` in any position: push the root and a fresh root selector.
    fn root_path(&mut self) -> Result<(), JsonPathError> {
        let id = self.next_root_id;
        self.next_root_id += 1;
        self.emit(Token::RootNode)?;
        self.emit(Token::Selector(Selector::new(SelectorKind::Root { id })))
    }

    fn current_path(&mut self) -> Result<(), JsonPathError> {
        self.emit(Token::CurrentNode)?;
        self.emit(Token::Selector(Selector::new(SelectorKind::Current)))
    }

    /// After `[`: the element list returns to the current state when it closes.
    fn open_bracket(&mut self) -> Result<(), JsonPathError> {
        self.emit(Token::BeginUnion)?;
        self.push_state(State::BracketEnd);
        self.push_state(State::BracketElement);
        Ok(())
    }

    /// Consume an opening quote and read a quoted name into the buffer.
    /// With `then`, the top state is replaced by `then` and an identifier
    /// selector is emitted once the name ends, unless `then` is a literal.
    fn quoted_name(&mut self, quoted: State, then: Option<State>) {
        self.advance();
        self.buffer.clear();
        match then {
            None => self.replace(State::IdentifierEnd),
            Some(State::StringLiteral) => self.replace(State::StringLiteral),
            Some(next) => {
                self.replace(next);
                self.push_state(State::IdentifierEnd);
            }
        }
        self.push_state(quoted);
    }

    /// After a function name, on `(`. `continuation` replaces the current
    /// state at top level; inside expressions the call is itself the operand.
    fn begin_function(&mut self, continuation: Option<State>) -> Result<(), JsonPathError> {
        let name = std::mem::take(&mut self.buffer);
        let function = self
            .functions
            .resolve(&name)
            .ok_or_else(|| self.error(ErrorKind::UnknownFunction))?;
        self.advance();
        self.emit(Token::CurrentNode)?;
        self.emit(Token::BeginFunction(function))?;
        match continuation {
            Some(state) => {
                self.replace(state);
                self.push_state(State::FunctionArgs);
            }
            None => self.replace(State::FunctionArgs),
        }
        self.push_state(State::ArgumentOrRightParen);
        Ok(())
    }

    fn emit_slice(&mut self, stop: Option<i64>, step: i64) -> Result<(), JsonPathError> {
        let slice = Slice {
            start: self.slice_start.take(),
            stop,
            step,
        };
        self.slice_stop = None;
        self.emit(Token::Selector(Selector::new(SelectorKind::Slice(slice))))
    }

    fn take_integer(&mut self) -> Result<Option<i64>, JsonPathError> {
        let digits = std::mem::take(&mut self.buffer);
        if digits.is_empty() {
            return Ok(None);
        }
        digits
            .parse::<i64>()
            .map(Some)
            .map_err(|_| self.error(ErrorKind::InvalidNumber))
    }

    fn hex_digit(&self, c: Option<char>) -> Result<u32, JsonPathError> {
        c.and_then(|c| c.to_digit(16))
            .ok_or_else(|| self.error(ErrorKind::InvalidCodepoint))
    }

    fn emit(&mut self, token: Token<D>) -> Result<(), JsonPathError> {
        let (line, column) = (self.line, self.column);
        self.reducer
            .push(token)
            .map_err(|kind| JsonPathError::new(kind, line, column))
    }

    fn error(&self, kind: ErrorKind) -> JsonPathError {
        JsonPathError::new(kind, self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn push_state(&mut self, state: State) {
        self.states.push(state);
    }

    fn pop_state(&mut self) {
        self.states.pop();
    }

    fn replace(&mut self, state: State) {
        if let Some(top) = self.states.last_mut() {
            *top = state;
        }
    }

    fn state_below(&self) -> Option<State> {
        self.states.iter().rev().nth(1).copied()
    }
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Characters that end an unquoted name. `-` is allowed inside names.
fn is_name_delimiter(c: char) -> bool {
    is_space(c)
        || matches!(
            c,
            '.' | '[' | ']' | '(' | ')' | ',' | ':' | '\'' | '"' | '=' | '!' | '<' | '>' | '~' | '|' | '&' | '+' | '*'
                | '/' | '@' | '$' | '?' | '{' | '}'
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn parse(input: &str) -> Result<Expression<Value>, JsonPathError> {
        compile(input, &Functions::new()).map(|(expression, _)| expression)
    }

    fn kind_of(input: &str) -> ErrorKind {
        match parse(input) {
            Ok(_) => panic!("expected {input:?} to fail"),
            Err(err) => err.kind,
        }
    }

    #[test]
    fn accepts_common_shapes() {
        for input in [
            "$",
            "$.store.book[*].author",
            "$..author",
            "$..*",
            "$.store..price",
            "$..book[2]",
            "$..book[-1:]",
            "$..book[0,1]",
            "$..book[:2]",
            "$['store']['book'][0]['title']",
            "$[\"a\\\"b\"]",
            "$..book[?(@.isbn)]",
            "$..book[?(@.price<10)]",
            "$..book[?(@.author =~ /tolkien/i)]",
            "$..book[?(@.price > $.expensive)]",
            "$[?(@.a && (@.b || !@.c))]",
            "$[(@.length - 1)]",
            "$[1:10:2]",
            "$[::-1]",
            "$[ 0 , 1 ]",
            "$.a-b",
            "$[?(@.tags == [\"x\", \"y\"])]",
            "$[?(@.obj == {\"k\": 1})]",
            "$[?(@.n == 1.5e2)]",
            "$[?(@.x == true || @.y == null)]",
            "$[?(-@.n < -1)]",
            "$[?(length(@.tags) >= 2)]",
            "keys($.store)",
            "length($..book)",
            "$[?(sum(@.*) > 2)][0]",
            "$[\"\\ud83d\\ude00\"]",
        ] {
            assert!(parse(input).is_ok(), "{input:?}: {:?}", parse(input).err());
        }
    }

    #[test]
    fn reports_error_kinds() {
        assert_eq!(kind_of(""), ErrorKind::UnexpectedEof);
        assert_eq!(kind_of("store"), ErrorKind::ExpectedRootOrFunction);
        assert_eq!(kind_of("#"), ErrorKind::ExpectedRootOrFunction);
        assert_eq!(kind_of("$.store["), ErrorKind::UnexpectedEof);
        assert_eq!(kind_of("$[1:2:0]"), ErrorKind::StepCannotBeZero);
        assert_eq!(kind_of("$[?(@.a = 1)]"), ErrorKind::ExpectedComparator);
        assert_eq!(kind_of("$[?(@.a | @.b)]"), ErrorKind::ExpectedOr);
        assert_eq!(kind_of("$[?(@.a & @.b)]"), ErrorKind::ExpectedAnd);
        assert_eq!(kind_of("$[?(@.a =~ 'x')]"), ErrorKind::ExpectedForwardSlash);
        assert_eq!(kind_of("$[?(@.a =~ /(/)]"), ErrorKind::InvalidRegex);
        assert_eq!(kind_of("$['\\q']"), ErrorKind::IllegalEscapedCharacter);
        assert_eq!(kind_of("$['\\u12G4']"), ErrorKind::InvalidCodepoint);
        assert_eq!(kind_of("$['\\ud83d']"), ErrorKind::InvalidCodepoint);
        assert_eq!(kind_of("$[?(nope(@))]"), ErrorKind::UnknownFunction);
        assert_eq!(kind_of("$[?(abs(@, 1))]"), ErrorKind::InvalidArity);
        assert_eq!(kind_of("$[?(@.a))]"), ErrorKind::UnbalancedParenthesis);
        assert_eq!(kind_of("$[?(foo)]"), ErrorKind::ExpectedRootOrCurrentNode);
        assert_eq!(kind_of("$[0 1]"), ErrorKind::ExpectedRightBracket);
        assert_eq!(kind_of("$.store $"), ErrorKind::ExpectedSeparator);
        assert_eq!(kind_of("$[?(@.a == [1,)]"), ErrorKind::InvalidLiteral);
        assert_eq!(kind_of("$."), ErrorKind::UnexpectedEof);
        assert_eq!(kind_of("$.."), ErrorKind::UnexpectedEof);
        assert_eq!(kind_of("$]"), ErrorKind::SyntaxError);
    }

    #[test]
    fn errors_carry_positions() {
        let err = parse("$[1:2:0]").unwrap_err();
        assert_eq!((err.line, err.column), (1, 8));
        let err = parse("$.a\n  $").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExpectedSeparator);
        assert_eq!((err.line, err.column), (2, 3));
    }

    #[test]
    fn each_root_gets_its_own_id() {
        let functions = Functions::new();
        let mut compiler = Compiler::<Value>::new("$[?(@.a == $.b || @.c == $.d)]", &functions);
        while !(compiler.states == [State::PathRhs] && compiler.peek().is_none()) {
            let state = *compiler.states.last().unwrap();
            let c = compiler.peek();
            compiler.step(state, c).unwrap();
        }
        assert_eq!(compiler.next_root_id, 3);
    }
}
