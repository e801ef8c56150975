//! cursor.rs - Forward-only character reader used by the structural parser.
//!
//! The cursor holds exactly one character of state, the "current" character.
//! Every read goes through [`Cursor::advance`]; nothing is ever pushed back.
//! Callers that need to look at a character twice keep it themselves (the
//! parser's reconsume flag).
//!
//! License: MIT OR APACHE 2.0

use std::str::Chars;

use crate::errors::Position;

#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    chars: Chars<'a>,
    current: Option<char>,
    line: usize,
    column: usize,
    offset: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars(),
            current: None,
            line: 1,
            column: 0,
            offset: 0,
        }
    }

    /// Moves to the next character and returns it, or `None` at end of input.
    pub fn advance(&mut self) -> Option<char> {
        self.current = self.chars.next();
        if let Some(c) = self.current {
            self.offset += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
        }
        self.current
    }

    /// The character most recently returned by [`advance`](Self::advance).
    pub fn current(&self) -> Option<char> {
        self.current
    }

    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            offset: self.offset,
        }
    }

    /// Advances while the current character is whitespace and returns how many
    /// characters were skipped. Starts from the current character.
    pub fn skip_whitespace(&mut self) -> usize {
        let mut skipped = 0;
        while self.current.is_some_and(char::is_whitespace) {
            skipped += 1;
            self.advance();
        }
        skipped
    }

    /// Advances until the current character is `>` or input ends, returning the
    /// characters passed over (the starting character included, `>` excluded).
    pub fn skip_to_tag_end(&mut self) -> String {
        let mut skipped = String::new();
        while let Some(c) = self.current {
            if c == '>' {
                break;
            }
            skipped.push(c);
            self.advance();
        }
        skipped
    }

    /// Collects characters, lowercased, while `accept` holds for the lowercase form.
    /// Starts from the current character and stops on the first rejected one.
    pub fn take_lowercase_while(&mut self, accept: impl Fn(char) -> bool) -> String {
        let mut taken = String::new();
        while let Some(c) = self.current {
            let lower = c.to_ascii_lowercase();
            if !accept(lower) {
                break;
            }
            taken.push(lower);
            self.advance();
        }
        taken
    }
}
