//! Character-driven state machine parser for manifest documents.
//!
//! ```text
//! object         := '.' '{' (field (',' field)* ','?)? '}'
//! field          := '.' identifier '=' value
//! value          := object | string_literal
//! string_literal := '"' character* '"'
//! ```
//!
//! String literals have no escape mechanism: the first `"` after the opening
//! quote ends the literal and a backslash is an ordinary character. Existing
//! manifests rely on this unescaped form, so it is kept as a format limitation.

use crate::document::{Document, NewNode, NodeId};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(
        "line {line}, column {column}: unexpected end of input with {open} unclosed object(s), innermost '{scope}'"
    )]
    UnbalancedScope {
        open: usize,
        scope: String,
        line: usize,
        column: usize,
    },
    #[error("line {line}, column {column}: duplicate field '{name}' in '{scope}'")]
    DuplicateField {
        name: String,
        scope: String,
        line: usize,
        column: usize,
    },
}

/// A character that the grammar does not allow at the current position.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("line {line}, column {column}: expected {expected}, found {} (in '{scope}')", found_display(.found))]
pub struct SyntaxError {
    pub line: usize,
    pub column: usize,
    pub expected: Expected,
    /// `None` when the input ended.
    pub found: Option<char>,
    pub scope: String,
}

fn found_display(found: &Option<char>) -> String {
    match found {
        Some(c) => format!("{c:?}"),
        None => "end of input".to_owned(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    RootObject,
    OpenBrace,
    TagName,
    TagNameOrEquals,
    Equals,
    Value,
    FieldOrClose,
    CommaOrClose,
    NonEmptyString,
    EndOfInput,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Expected::RootObject => "'.' opening the root object",
            Expected::OpenBrace => "'{'",
            Expected::TagName => "a field name",
            Expected::TagNameOrEquals => "a field name character or '='",
            Expected::Equals => "'='",
            Expected::Value => "a value ('.{' or a string literal)",
            Expected::FieldOrClose => "'.' or '}'",
            Expected::CommaOrClose => "',' or '}'",
            Expected::NonEmptyString => "a non-empty string literal",
            Expected::EndOfInput => "end of input",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    ExpectObjectOrTagName,
    ReadingTagName,
    ExpectEquals,
    ExpectValue,
    ReadingStringLiteral,
    ExpectCommaOrClose,
    ExpectFieldOrClose,
    Done,
}

const ROOT_SCOPE: &str = "root";

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\n' | '\t' | '\r')
}

fn is_tag_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

struct Parser {
    doc: Document,
    state: State,
    /// Open objects, innermost last. Indexes into `doc`, so the arena may
    /// grow while scopes are open.
    scopes: Vec<NodeId>,
    /// Field name of each open scope, parallel to `scopes`.
    scope_names: Vec<String>,
    tag: String,
    literal: String,
    /// Field name waiting for its value; `None` outside value position.
    pending: Option<String>,
    line: usize,
    column: usize,
    /// Position of the token currently being accumulated.
    token_line: usize,
    token_column: usize,
}

/// Parse manifest text into a [`Document`].
pub fn parse(text: &str) -> Result<Document, ParseError> {
    let mut parser = Parser {
        doc: Document::new(),
        state: State::Start,
        scopes: Vec::new(),
        scope_names: Vec::new(),
        tag: String::new(),
        literal: String::new(),
        pending: None,
        line: 1,
        column: 1,
        token_line: 1,
        token_column: 1,
    };
    for c in text.chars() {
        parser.step(c)?;
        if c == '\n' {
            parser.line += 1;
            parser.column = 1;
        } else {
            parser.column += 1;
        }
    }
    parser.finish()
}

impl Parser {
    fn scope_path(&self) -> String {
        if self.scope_names.len() <= 1 {
            return ROOT_SCOPE.to_owned();
        }
        self.scope_names[1..].join(".")
    }

    fn error(&self, expected: Expected, found: Option<char>) -> ParseError {
        ParseError::Syntax(SyntaxError {
            line: self.line,
            column: self.column,
            expected,
            found,
            scope: self.scope_path(),
        })
    }

    fn step(&mut self, c: char) -> Result<(), ParseError> {
        match self.state {
            State::Start => match c {
                c if is_whitespace(c) => {}
                '.' => self.state = State::ExpectObjectOrTagName,
                c => return Err(self.error(Expected::RootObject, Some(c))),
            },
            State::ExpectObjectOrTagName => {
                let value_position = self.scopes.is_empty() || self.pending.is_some();
                match c {
                    c if is_whitespace(c) => {}
                    '{' if value_position => self.open_object()?,
                    c if !value_position && is_tag_start(c) => {
                        self.token_line = self.line;
                        self.token_column = self.column;
                        self.tag.clear();
                        self.tag.push(c);
                        self.state = State::ReadingTagName;
                    }
                    c if value_position => return Err(self.error(Expected::OpenBrace, Some(c))),
                    c => return Err(self.error(Expected::TagName, Some(c))),
                }
            }
            State::ReadingTagName => match c {
                c if is_tag_char(c) => self.tag.push(c),
                '=' => self.end_tag(State::ExpectValue),
                c if is_whitespace(c) => self.end_tag(State::ExpectEquals),
                c => return Err(self.error(Expected::TagNameOrEquals, Some(c))),
            },
            State::ExpectEquals => match c {
                c if is_whitespace(c) => {}
                '=' => self.state = State::ExpectValue,
                c => return Err(self.error(Expected::Equals, Some(c))),
            },
            State::ExpectValue => match c {
                c if is_whitespace(c) => {}
                '.' => self.state = State::ExpectObjectOrTagName,
                '"' => {
                    self.literal.clear();
                    self.state = State::ReadingStringLiteral;
                }
                c => return Err(self.error(Expected::Value, Some(c))),
            },
            State::ReadingStringLiteral => match c {
                '"' if self.literal.is_empty() => {
                    return Err(self.error(Expected::NonEmptyString, Some(c)));
                }
                '"' => {
                    let value = std::mem::take(&mut self.literal);
                    self.attach(NewNode::Leaf(&value))?;
                    self.state = State::ExpectCommaOrClose;
                }
                c => self.literal.push(c),
            },
            State::ExpectCommaOrClose => match c {
                c if is_whitespace(c) => {}
                ',' => self.state = State::ExpectFieldOrClose,
                '}' => self.close_object(),
                c => return Err(self.error(Expected::CommaOrClose, Some(c))),
            },
            State::ExpectFieldOrClose => match c {
                c if is_whitespace(c) => {}
                '.' => self.state = State::ExpectObjectOrTagName,
                '}' => self.close_object(),
                c => return Err(self.error(Expected::FieldOrClose, Some(c))),
            },
            State::Done => {
                if !is_whitespace(c) {
                    return Err(self.error(Expected::EndOfInput, Some(c)));
                }
            }
        }
        Ok(())
    }

    fn end_tag(&mut self, next: State) {
        self.pending = Some(std::mem::take(&mut self.tag));
        self.state = next;
    }

    fn open_object(&mut self) -> Result<(), ParseError> {
        if self.scopes.is_empty() {
            let root = self.doc.root();
            self.scopes.push(root);
            self.scope_names.push(ROOT_SCOPE.to_owned());
            self.state = State::ExpectFieldOrClose;
            return Ok(());
        }
        let name = self.pending.clone().unwrap_or_default();
        let id = self.attach(NewNode::Object)?;
        self.scopes.push(id);
        self.scope_names.push(name);
        self.state = State::ExpectFieldOrClose;
        Ok(())
    }

    /// Add the pending field to the innermost open object.
    fn attach(&mut self, node: NewNode<'_>) -> Result<NodeId, ParseError> {
        let name = self.pending.take().unwrap_or_default();
        let parent = *self
            .scopes
            .last()
            .ok_or_else(|| self.error(Expected::RootObject, None))?;
        if self.doc.field(parent, &name).is_some() {
            return Err(ParseError::DuplicateField {
                name,
                scope: self.scope_path(),
                line: self.token_line,
                column: self.token_column,
            });
        }
        self.doc
            .push_field(parent, &name, node)
            .map_err(|_| self.error(Expected::Value, None))
    }

    fn close_object(&mut self) {
        self.scopes.pop();
        self.scope_names.pop();
        self.state = if self.scopes.is_empty() {
            State::Done
        } else {
            State::ExpectCommaOrClose
        };
    }

    fn finish(self) -> Result<Document, ParseError> {
        if !self.scopes.is_empty() {
            return Err(ParseError::UnbalancedScope {
                open: self.scopes.len(),
                scope: self
                    .scope_names
                    .last()
                    .cloned()
                    .unwrap_or_else(|| ROOT_SCOPE.to_owned()),
                line: self.line,
                column: self.column,
            });
        }
        match self.state {
            State::Done => Ok(self.doc),
            State::Start => Err(self.error(Expected::RootObject, None)),
            _ => Err(self.error(Expected::OpenBrace, None)),
        }
    }
}
