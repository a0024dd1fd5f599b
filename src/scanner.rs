//! Lexical analyzer

use std::io::prelude::*;

use thiserror::Error;

use crate::char_reader::{CharReader, CharReaderError};
use crate::diag::{Diagnostics, SourceLocation};
use crate::token::{self, Token, TokenKind};

/// Turn sequence of bytes into sequence of tokens.
///
/// Malformed input is reported in the returned `Diagnostics` and scanning resumes with the next
/// character.  Only failures to read the input abort the scan.
#[derive(Debug)]
pub struct Scanner<R: BufRead> {
    input: CharReader<R>,
    file_name: String,
    tokens: Vec<Token>,
    diagnostics: Diagnostics,

    // Buffer used when scanning longer tokens.  Allocated here to reuse memory.
    buf: String,
}

impl<R: BufRead> Scanner<R> {
    /// Creates a new scanner operating on `input`.  `file_name` is only used in diagnostics.
    pub fn new(input: R, file_name: impl Into<String>) -> Scanner<R> {
        Scanner {
            input: CharReader::new(input),
            file_name: file_name.into(),
            tokens: vec![],
            diagnostics: Diagnostics::new(),
            buf: String::new(),
        }
    }

    /// Scan the whole input.  The returned tokens always end with exactly one `Eof` token.
    pub fn scan_tokens(self) -> Result<(Vec<Token>, Diagnostics), ScannerError> {
        let (tokens, diagnostics, _) = self.scan_with_lines()?;
        Ok((tokens, diagnostics))
    }

    /// Like `scan_tokens` but also hands back the source lines, so later stages can quote them
    /// in their own diagnostics.
    pub fn scan_with_lines(
        mut self,
    ) -> Result<(Vec<Token>, Diagnostics, Vec<String>), ScannerError> {
        while self.input.peek()?.is_some() {
            self.scan_token()?;
        }
        let (line, column) = self.input.position();
        self.tokens.push(Token::new(TokenKind::Eof, "", line, column));
        tracing::debug!(tokens = self.tokens.len(), file = %self.file_name, "scanned input");
        let lines = self.input.into_lines();
        self.diagnostics.attach_context(&lines);
        Ok((self.tokens, self.diagnostics, lines))
    }

    fn scan_token(&mut self) -> Result<(), ScannerError> {
        let (line, column) = self.input.position();
        let ch = match self.input.bump()? {
            Some(ch) => ch,
            None => return Ok(()),
        };
        let kind = match ch {
            ' ' | '\t' | '\r' | '\n' => return Ok(()),
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '%' => TokenKind::Percent,
            '!' => self.either('=', TokenKind::BangEqual, TokenKind::Bang)?,
            '=' => self.either('=', TokenKind::EqualEqual, TokenKind::Equal)?,
            '<' => self.either('=', TokenKind::LessEqual, TokenKind::Less)?,
            '>' => self.either('=', TokenKind::GreaterEqual, TokenKind::Greater)?,
            '&' | '|' => {
                if self.input.eat(ch)? {
                    let kind = if ch == '&' { TokenKind::And } else { TokenKind::Or };
                    let lexeme = format!("{}{}", ch, ch);
                    self.tokens.push(Token::new(kind, lexeme, line, column));
                } else {
                    self.report(line, column, format!("Unexpected character '{}'", ch));
                }
                return Ok(());
            }
            '/' => {
                if self.input.eat('/')? {
                    return self.skip_line_comment();
                } else if self.input.eat('*')? {
                    return self.skip_block_comment(line, column);
                }
                TokenKind::Slash
            }
            '"' => return self.scan_string(line, column),
            '0'..='9' => return self.scan_number(ch, line, column),
            'a'..='z' | 'A'..='Z' | '_' => return self.scan_identifier(ch, line, column),
            _ => {
                self.report(line, column, format!("Unexpected character '{}'", ch));
                return Ok(());
            }
        };
        self.tokens.push(Token::new(kind, kind.to_string(), line, column));
        Ok(())
    }

    /// Return `matched` and consume the next character if it is `next`, otherwise `single`.
    fn either(
        &mut self,
        next: char,
        matched: TokenKind,
        single: TokenKind,
    ) -> Result<TokenKind, ScannerError> {
        if self.input.eat(next)? {
            Ok(matched)
        } else {
            Ok(single)
        }
    }

    fn skip_line_comment(&mut self) -> Result<(), ScannerError> {
        while let Some(ch) = self.input.peek()? {
            if ch == '\n' {
                break;
            }
            self.input.bump()?;
        }
        Ok(())
    }

    /// Block comments nest.
    fn skip_block_comment(&mut self, line: u32, column: u32) -> Result<(), ScannerError> {
        let mut depth = 1;
        while depth > 0 {
            match self.input.bump()? {
                None => {
                    self.report(line, column, "Unterminated block comment");
                    return Ok(());
                }
                Some('/') if self.input.eat('*')? => depth += 1,
                Some('*') if self.input.eat('/')? => depth -= 1,
                Some(_) => (),
            }
        }
        Ok(())
    }

    fn scan_string(&mut self, line: u32, column: u32) -> Result<(), ScannerError> {
        self.buf.clear();
        loop {
            match self.input.bump()? {
                None => {
                    self.report(line, column, "Unterminated string");
                    return Ok(());
                }
                Some('"') => break,
                Some('\\') => {
                    let (esc_line, esc_column) = self.input.position();
                    match self.input.bump()? {
                        Some('n') => self.buf.push('\n'),
                        Some('t') => self.buf.push('\t'),
                        Some('r') => self.buf.push('\r'),
                        Some('\\') => self.buf.push('\\'),
                        Some('"') => self.buf.push('"'),
                        Some(other) => self.report(
                            esc_line,
                            esc_column,
                            format!("Invalid escape sequence '\\{}'", other),
                        ),
                        None => {
                            self.report(line, column, "Unterminated string");
                            return Ok(());
                        }
                    }
                }
                Some(ch) => self.buf.push(ch),
            }
        }
        self.push_buffered(TokenKind::String, line, column);
        Ok(())
    }

    fn scan_number(&mut self, first_digit: char, line: u32, column: u32) -> Result<(), ScannerError> {
        self.buf.clear();
        self.buf.push(first_digit);

        if first_digit == '0' {
            let radix = match self.input.peek()? {
                Some('x') => Some((16, "Invalid hexadecimal number")),
                Some('b') => Some((2, "Invalid binary number")),
                _ => None,
            };
            if let Some((radix, message)) = radix {
                self.bump_into_buf()?;
                if self.take_digits(radix)? == 0 {
                    self.report(line, column, message);
                } else {
                    self.push_buffered(TokenKind::Integer, line, column);
                }
                return Ok(());
            }
        }

        self.take_digits(10)?;

        let has_fraction = self.input.peek()? == Some('.')
            && matches!(self.input.peek_second()?, Some(ch) if ch.is_ascii_digit());
        if !has_fraction {
            self.push_buffered(TokenKind::Integer, line, column);
            return Ok(());
        }

        self.bump_into_buf()?;
        self.take_digits(10)?;

        if let Some('e' | 'E') = self.input.peek()? {
            self.bump_into_buf()?;
            if let Some('+' | '-') = self.input.peek()? {
                self.bump_into_buf()?;
            }
            if self.take_digits(10)? == 0 {
                self.report(line, column, "Invalid scientific notation");
                return Ok(());
            }
        }

        self.push_buffered(TokenKind::Float, line, column);
        Ok(())
    }

    fn scan_identifier(&mut self, first_char: char, line: u32, column: u32) -> Result<(), ScannerError> {
        self.buf.clear();
        self.buf.push(first_char);
        while let Some(ch) = self.input.peek()? {
            if !(ch.is_ascii_alphanumeric() || ch == '_') {
                break;
            }
            self.bump_into_buf()?;
        }

        let kind = token::keyword(&self.buf).unwrap_or(TokenKind::Identifier);
        self.push_buffered(kind, line, column);
        Ok(())
    }

    /// Append digits in `radix` to the buffer and return how many there were.
    fn take_digits(&mut self, radix: u32) -> Result<usize, ScannerError> {
        let mut count = 0;
        while let Some(ch) = self.input.peek()? {
            if !ch.is_digit(radix) {
                break;
            }
            self.bump_into_buf()?;
            count += 1;
        }
        Ok(count)
    }

    fn bump_into_buf(&mut self) -> Result<(), ScannerError> {
        if let Some(ch) = self.input.bump()? {
            self.buf.push(ch);
        }
        Ok(())
    }

    fn push_buffered(&mut self, kind: TokenKind, line: u32, column: u32) {
        self.tokens
            .push(Token::new(kind, self.buf.clone(), line, column));
    }

    fn report(&mut self, line: u32, column: u32, message: impl Into<String>) {
        self.diagnostics.error(
            message,
            SourceLocation::new(self.file_name.as_str(), line, column),
        );
    }
}

/// Failure to read the input at all.  Malformed input is reported as diagnostics instead.
#[derive(Debug, Error)]
pub enum ScannerError {
    #[error("read error: {0}")]
    CharReader(#[from] CharReaderError),
}
