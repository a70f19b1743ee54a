// lireta -- a textual notation language for composing audio
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Turns source text into a tree of blocks, lines and tokens.
//!
//! Whitespace separates words, `;` terminates a line, `{ ... }` nests a block,
//! `"..."` is a string literal, `#` starts a comment until the end of the line and
//! `/* ... */` is a block comment. A line starting with `config "path";` names the
//! instrument configuration of the program.

use std::fmt;
use std::rc::Rc;

use super::ast::{Block, Line};
use super::span::Span;
use super::value::Value;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct LexerError {
    location: Span,
    kind: LexerErrorKind,
}

impl LexerError {
    pub fn location(&self) -> Span {
        self.location
    }

    pub fn kind(&self) -> LexerErrorKind {
        self.kind
    }
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for LexerError {}

/// The types of lexer errors.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LexerErrorKind {
    /// A block or the input ended while a line was still missing its `;`.
    UnterminatedLine,
    /// A `{` without matching `}`.
    UnterminatedBlock,
    /// A `}` without matching `{`.
    UnmatchedBlockEnd,
    UnterminatedString,
    UnterminatedComment,
    /// `config` must be followed by a string literal and `;`.
    MalformedConfig,
}

impl fmt::Display for LexerErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexerErrorKind::UnterminatedLine => write!(f, "line is missing its terminating ';'"),
            LexerErrorKind::UnterminatedBlock => write!(f, "block is missing its closing '}}'"),
            LexerErrorKind::UnmatchedBlockEnd => write!(f, "'}}' without matching '{{'"),
            LexerErrorKind::UnterminatedString => write!(f, "unterminated string literal"),
            LexerErrorKind::UnterminatedComment => write!(f, "unterminated comment"),
            LexerErrorKind::MalformedConfig => {
                write!(f, "expected 'config \"path\";'")
            }
        }
    }
}

/// Lex a whole program into its root block and the path named by its `config` line.
pub fn lex(input: &str) -> Result<(Block, Option<String>), LexerError> {
    let mut lexer = Lexer::new(input);
    let lines = lexer.lex_lines(None)?;
    Ok((Block::opaque(lines), lexer.config))
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum State {
    Normal,
    LineComment,
    /// Inside `/* */`, remembering whether the previous character was a `*`.
    BlockComment { star: bool },
    Quoted { escaped: bool },
    ConfigStart,
    ConfigQuoted { escaped: bool },
    ConfigEnd,
}

pub struct Lexer<'a> {
    input: &'a str,
    stream: std::str::CharIndices<'a>,
    config: Option<String>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            stream: input.char_indices(),
            config: None,
        }
    }

    fn error(&self, offset: usize, kind: LexerErrorKind) -> LexerError {
        LexerError {
            location: Span {
                begin: offset,
                end: self.stream.clone().next().map_or(self.input.len(), |(pos, _)| pos),
            },
            kind,
        }
    }

    /// Lex lines until the end of the input, or until the `}` closing the block opened
    /// at offset `open`.
    pub fn lex_lines(&mut self, open: Option<usize>) -> Result<Vec<Line>, LexerError> {
        let mut lines = Vec::new();
        let mut line = Vec::new();
        let mut word = String::new();
        let mut state = State::Normal;
        // start of the string, comment or config line currently being read
        let mut token_start = 0;

        while let Some((pos, ch)) = self.stream.next() {
            state = match state {
                State::Normal => {
                    if ch.is_whitespace() || ch == '"' {
                        if word == "config" && line.is_empty() {
                            word.clear();
                            token_start = pos;
                            if ch == '"' {
                                State::ConfigQuoted { escaped: false }
                            } else {
                                State::ConfigStart
                            }
                        } else {
                            flush_word(&mut word, &mut line);
                            if ch == '"' {
                                token_start = pos;
                                State::Quoted { escaped: false }
                            } else {
                                State::Normal
                            }
                        }
                    } else {
                        match ch {
                            '#' if word.is_empty() => {
                                token_start = pos;
                                State::LineComment
                            }
                            '*' if word.ends_with('/') => {
                                // whatever precedes the `/` is still a word of its own
                                word.pop();
                                flush_word(&mut word, &mut line);
                                token_start = pos - 1;
                                State::BlockComment { star: false }
                            }
                            '{' => {
                                flush_word(&mut word, &mut line);
                                let inner = self.lex_lines(Some(pos))?;
                                if !inner.is_empty() {
                                    line.push(Value::Block(Rc::new(Block::new(inner))));
                                }
                                State::Normal
                            }
                            '}' => {
                                if !word.is_empty() || !line.is_empty() {
                                    return Err(self.error(pos, LexerErrorKind::UnterminatedLine));
                                }
                                return match open {
                                    Some(_) => Ok(lines),
                                    None => Err(self.error(pos, LexerErrorKind::UnmatchedBlockEnd)),
                                };
                            }
                            ';' => {
                                flush_word(&mut word, &mut line);
                                if !line.is_empty() {
                                    lines.push(Line::new(std::mem::take(&mut line)));
                                }
                                State::Normal
                            }
                            _ => {
                                word.push(ch);
                                State::Normal
                            }
                        }
                    }
                }
                State::LineComment => {
                    if ch == '\n' {
                        State::Normal
                    } else {
                        State::LineComment
                    }
                }
                State::BlockComment { star } => {
                    if star && ch == '/' {
                        State::Normal
                    } else {
                        State::BlockComment { star: ch == '*' }
                    }
                }
                State::Quoted { escaped } => match ch {
                    '"' if escaped => {
                        word.pop();
                        word.push('"');
                        State::Quoted { escaped: false }
                    }
                    '"' => {
                        line.push(Value::Str(std::mem::take(&mut word)));
                        State::Normal
                    }
                    _ => {
                        word.push(ch);
                        State::Quoted {
                            escaped: ch == '\\' && !escaped,
                        }
                    }
                },
                State::ConfigStart => match ch {
                    '"' => State::ConfigQuoted { escaped: false },
                    _ if ch.is_whitespace() => State::ConfigStart,
                    _ => return Err(self.error(token_start, LexerErrorKind::MalformedConfig)),
                },
                State::ConfigQuoted { escaped } => match ch {
                    '"' if escaped => {
                        word.pop();
                        word.push('"');
                        State::ConfigQuoted { escaped: false }
                    }
                    '"' => State::ConfigEnd,
                    _ => {
                        word.push(ch);
                        State::ConfigQuoted {
                            escaped: ch == '\\' && !escaped,
                        }
                    }
                },
                State::ConfigEnd => match ch {
                    ';' => {
                        self.config = Some(std::mem::take(&mut word));
                        State::Normal
                    }
                    _ if ch.is_whitespace() => State::ConfigEnd,
                    _ => return Err(self.error(token_start, LexerErrorKind::MalformedConfig)),
                },
            };
        }

        let end = self.input.len();
        match state {
            State::Normal => {}
            State::LineComment | State::BlockComment { .. } => {
                return Err(self.error(token_start, LexerErrorKind::UnterminatedComment))
            }
            State::Quoted { .. } => {
                return Err(self.error(token_start, LexerErrorKind::UnterminatedString))
            }
            State::ConfigStart | State::ConfigQuoted { .. } | State::ConfigEnd => {
                return Err(self.error(token_start, LexerErrorKind::MalformedConfig))
            }
        }
        if !word.is_empty() || !line.is_empty() {
            return Err(self.error(end, LexerErrorKind::UnterminatedLine));
        }
        if let Some(open) = open {
            return Err(self.error(open, LexerErrorKind::UnterminatedBlock));
        }
        Ok(lines)
    }
}

fn flush_word(word: &mut String, line: &mut Vec<Value>) {
    if !word.is_empty() {
        line.push(Value::Word(std::mem::take(word)));
    }
}
