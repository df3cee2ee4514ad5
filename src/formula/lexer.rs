//! Tokenizer for the restricted formula language.

use super::{FormulaError, Span};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    String(String),
    Cell(CellRef),
    Ident(String),
    LParen,
    RParen,
    Comma,
    Colon,
    Plus,
    Minus,
    Star,
    Slash,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// An A1-style reference. `col` is zero-based (`A` = 0); `row` is the
/// one-based sheet row where row 1 holds the headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub col: usize,
    pub row: usize,
}

impl CellRef {
    /// Parses `B2`-style text. Column letters must be upper case.
    pub fn parse(text: &str) -> Option<CellRef> {
        let split = text.find(|c: char| !c.is_ascii_uppercase())?;
        let (letters, digits) = text.split_at(split);
        if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let mut col = 0usize;
        for b in letters.bytes() {
            col = col.checked_mul(26)?.checked_add((b - b'A') as usize + 1)?;
        }
        Some(CellRef {
            col: col - 1,
            row: digits.parse().ok()?,
        })
    }

    /// Zero-based data row index, if the reference points below the header row.
    pub fn data_row(&self) -> Option<usize> {
        self.row.checked_sub(2)
    }
}

struct Lexer<'a> {
    src: &'a str,
    idx: usize,
    tokens: Vec<Token>,
}

pub fn tokenize(src: &str) -> Result<Vec<Token>, FormulaError> {
    Lexer {
        src,
        idx: 0,
        tokens: Vec::new(),
    }
    .lex()
}

impl<'a> Lexer<'a> {
    fn lex(mut self) -> Result<Vec<Token>, FormulaError> {
        while let Some(ch) = self.peek_char() {
            let start = self.idx;
            match ch {
                ' ' | '\t' | '\r' | '\n' => {
                    self.bump();
                }
                '"' | '\'' => {
                    let value = self.string_literal(ch)?;
                    self.push(TokenKind::String(value), start);
                }
                '0'..='9' | '.' => {
                    let raw = self.take_while(|c| c.is_ascii_digit() || c == '.');
                    let value = raw.parse::<f64>().map_err(|_| {
                        FormulaError::lex(format!("Invalid number '{raw}'"), start, self.idx)
                    })?;
                    self.push(TokenKind::Number(value), start);
                }
                c if c.is_ascii_alphabetic() => {
                    let raw = self.take_while(|c| c.is_ascii_alphanumeric());
                    let kind = if raw.bytes().all(|b| b.is_ascii_alphabetic()) {
                        TokenKind::Ident(raw)
                    } else if let Some(cell) = CellRef::parse(&raw) {
                        TokenKind::Cell(cell)
                    } else {
                        return Err(FormulaError::lex(
                            format!("Unknown name '{raw}'"),
                            start,
                            self.idx,
                        ));
                    };
                    self.push(kind, start);
                }
                _ => {
                    self.bump();
                    let kind = match ch {
                        '(' => TokenKind::LParen,
                        ')' => TokenKind::RParen,
                        ',' => TokenKind::Comma,
                        ':' => TokenKind::Colon,
                        '+' => TokenKind::Plus,
                        '-' => TokenKind::Minus,
                        '*' => TokenKind::Star,
                        '/' => TokenKind::Slash,
                        other => {
                            return Err(FormulaError::lex(
                                format!("Unexpected character '{other}'"),
                                start,
                                self.idx,
                            ));
                        }
                    };
                    self.push(kind, start);
                }
            }
        }
        Ok(self.tokens)
    }

    fn string_literal(&mut self, quote: char) -> Result<String, FormulaError> {
        let start = self.idx;
        self.bump();
        let mut value = String::new();
        loop {
            match self.peek_char() {
                Some(c) if c == quote => {
                    self.bump();
                    return Ok(value);
                }
                Some(c) => {
                    self.bump();
                    value.push(c);
                }
                None => {
                    return Err(FormulaError::lex(
                        "Unterminated string literal".to_string(),
                        start,
                        self.idx,
                    ));
                }
            }
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.src[self.idx..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.idx += ch.len_utf8();
        Some(ch)
    }

    fn take_while(&mut self, mut pred: impl FnMut(char) -> bool) -> String {
        let start = self.idx;
        while let Some(ch) = self.peek_char() {
            if !pred(ch) {
                break;
            }
            self.bump();
        }
        self.src[start..self.idx].to_string()
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token {
            kind,
            span: Span::new(start, self.idx),
        });
    }
}
