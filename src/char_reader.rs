//! Convert byte reader to utf8 character stream with lookahead and source positions.
//!
//! For some reason there is no such facility in `std::*`.

use std::collections::VecDeque;
use std::io::prelude::*;
use std::io::{self, Bytes};
use std::iter::Peekable;
use std::str::{self, Utf8Error};

use thiserror::Error;

/// Reads characters out of a buffered reader and keeps track of where they are.
#[derive(Debug)]
pub struct CharReader<R: BufRead> {
    input: Peekable<Bytes<R>>,

    // Conversion buffer stored here to avoid reallocation.
    buf: Vec<u8>,

    // Decoded but not yet consumed characters.
    lookahead: VecDeque<char>,

    line: u32,
    column: u32,

    // Consumed text, split in lines.
    lines: Vec<String>,
    current_line: String,
}

impl<R: BufRead> CharReader<R> {
    pub fn new(input: R) -> CharReader<R> {
        CharReader {
            input: input.bytes().peekable(),
            buf: vec![],
            lookahead: VecDeque::new(),
            line: 1,
            column: 1,
            lines: vec![],
            current_line: String::new(),
        }
    }

    /// Line and column of the next character to be consumed.
    pub fn position(&self) -> (u32, u32) {
        (self.line, self.column)
    }

    /// Return the next character without consuming it.
    pub fn peek(&mut self) -> Result<Option<char>, CharReaderError> {
        self.fill(1)?;
        Ok(self.lookahead.front().copied())
    }

    /// Return the character following the next one without consuming anything.
    pub fn peek_second(&mut self) -> Result<Option<char>, CharReaderError> {
        self.fill(2)?;
        Ok(self.lookahead.get(1).copied())
    }

    /// Consume and return the next character.
    pub fn bump(&mut self) -> Result<Option<char>, CharReaderError> {
        self.fill(1)?;
        let ch = self.lookahead.pop_front();
        match ch {
            Some('\n') => {
                self.line += 1;
                self.column = 1;
                let line = self.current_line.trim_end_matches('\r').to_owned();
                self.lines.push(line);
                self.current_line.clear();
            }
            Some(c) => {
                self.column += 1;
                self.current_line.push(c);
            }
            None => (),
        }
        Ok(ch)
    }

    /// Lines consumed so far, without terminators.  The last one may be incomplete.
    pub fn into_lines(mut self) -> Vec<String> {
        if !self.current_line.is_empty() {
            self.lines.push(self.current_line);
        }
        self.lines
    }

    /// Consume the next character if it is `expected`.
    pub fn eat(&mut self, expected: char) -> Result<bool, CharReaderError> {
        if self.peek()? == Some(expected) {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn fill(&mut self, n: usize) -> Result<(), CharReaderError> {
        while self.lookahead.len() < n {
            match self.decode()? {
                Some(ch) => self.lookahead.push_back(ch),
                None => break,
            }
        }
        Ok(())
    }

    fn decode(&mut self) -> Result<Option<char>, CharReaderError> {
        match self.input.next() {
            Some(Ok(b)) => {
                if b.is_ascii() {
                    Ok(Some(b as char))
                } else if (b & 0b11000000) == 0b11000000 {
                    self.convert_multi_byte_char(b).map(Some)
                } else {
                    Err(CharReaderError::BadStartByte(b))
                }
            }
            Some(Err(e)) => Err(CharReaderError::from(e)),
            None => Ok(None),
        }
    }

    fn convert_multi_byte_char(&mut self, first_byte: u8) -> Result<char, CharReaderError> {
        self.buf.clear();
        self.buf.push(first_byte);
        // Stops at EOF, at a read error (reported by the next decode) or at the start of the
        // next char.
        while let Some(Ok(b)) = self
            .input
            .next_if(|b| matches!(b, Ok(byte) if (byte & 0b11000000) == 0b10000000))
        {
            self.buf.push(b);
        }
        let s = str::from_utf8(&self.buf)?;
        s.chars()
            .next()
            .ok_or(CharReaderError::BadStartByte(first_byte))
    }
}

/// Errors raised when reading and converting to UTF-8.
#[derive(Debug, Error)]
pub enum CharReaderError {
    #[error("failed to read bytes: {0}")]
    Io(#[from] io::Error),
    #[error("unexpected UTF-8 start byte: {0:b}")]
    BadStartByte(u8),
    #[error("failed to convert byte sequence to UTF-8: {0}")]
    Utf8(#[from] Utf8Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(input: &[u8]) -> Result<String, CharReaderError> {
        let mut reader = CharReader::new(input);
        let mut out = String::new();
        while let Some(ch) = reader.bump()? {
            out.push(ch);
        }
        Ok(out)
    }

    #[test]
    fn read_ascii() -> Result<(), CharReaderError> {
        assert_eq!(read(b"ABC")?, "ABC");
        Ok(())
    }

    #[test]
    fn read_mb_char_followed_by_eof() -> Result<(), CharReaderError> {
        assert_eq!(read("∏".as_bytes())?, "∏");
        Ok(())
    }

    #[test]
    fn read_mb_char_followed_by_another_one() -> Result<(), CharReaderError> {
        assert_eq!(read("∏X".as_bytes())?, "∏X");
        Ok(())
    }

    #[test]
    fn mb_with_invalid_starting_byte() {
        match read(&[0b10111111u8]) {
            Err(CharReaderError::BadStartByte(0b10111111u8)) => (),
            r => panic!("unexpected output: {:?}", r),
        };
    }

    #[test]
    fn mb_with_invalid_number_of_bytes() {
        match read(&[0b11100000u8, 0b10000000u8, 42u8]) {
            Err(CharReaderError::Utf8(_)) => (),
            r => panic!("unexpected output: {:?}", r),
        };
    }

    #[test]
    fn peeking_does_not_consume() -> Result<(), CharReaderError> {
        let mut reader = CharReader::new("ab".as_bytes());
        assert_eq!(reader.peek()?, Some('a'));
        assert_eq!(reader.peek_second()?, Some('b'));
        assert_eq!(reader.bump()?, Some('a'));
        assert_eq!(reader.peek_second()?, None);
        assert!(reader.eat('b')?);
        assert!(!reader.eat('b')?);
        assert_eq!(reader.bump()?, None);
        Ok(())
    }

    #[test]
    fn tracks_lines_and_columns() -> Result<(), CharReaderError> {
        let mut reader = CharReader::new("a∏\nb".as_bytes());
        assert_eq!(reader.position(), (1, 1));
        reader.bump()?;
        assert_eq!(reader.position(), (1, 2));
        reader.bump()?;
        assert_eq!(reader.position(), (1, 3));
        reader.bump()?;
        assert_eq!(reader.position(), (2, 1));
        reader.bump()?;
        assert_eq!(reader.position(), (2, 2));
        Ok(())
    }

    #[test]
    fn keeps_consumed_lines() -> Result<(), CharReaderError> {
        let mut reader = CharReader::new("one\r\ntwo\n\nlast".as_bytes());
        while reader.bump()?.is_some() {}
        assert_eq!(reader.into_lines(), vec!["one", "two", "", "last"]);
        Ok(())
    }
}
