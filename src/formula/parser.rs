//! Recursive-descent parser producing the formula AST.
//!
//! Grammar:
//!
//! ```text
//! expr    := term (("+" | "-") term)*
//! term    := unary (("*" | "/") unary)*
//! unary   := ("-" | "+") unary | primary
//! primary := NUMBER | STRING | CELL | "(" expr ")"
//!          | SUM "(" CELL ":" CELL ")"
//!          | CONCAT "(" arg ("," arg)* ")"
//! ```
//!
//! `CONCAT` arguments are not expressions: each is a quoted literal, a single
//! cell reference, or any other token run taken as its source text.

use super::{
    FormulaError, Span,
    lexer::{CellRef, Token, TokenKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConcatArg {
    Literal(String),
    Cell { cell: CellRef, text: String },
    Bare(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Text(String),
    Cell(CellRef),
    Sum { start: CellRef, end: CellRef },
    Concat(Vec<ConcatArg>),
    Negate(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

pub fn parse(src: &str, tokens: Vec<Token>) -> Result<Expr, FormulaError> {
    let mut parser = Parser {
        src,
        tokens,
        pos: 0,
    };
    let expr = parser.expr()?;
    if let Some(token) = parser.tokens.get(parser.pos) {
        return Err(FormulaError::parse("Unexpected trailing input", token.span));
    }
    Ok(expr)
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn expr(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        match self.peek_kind() {
            Some(TokenKind::Minus) => {
                self.pos += 1;
                Ok(Expr::Negate(Box::new(self.unary()?)))
            }
            Some(TokenKind::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        let token = self.next_token()?;
        match token.kind {
            TokenKind::Number(n) => Ok(Expr::Number(n)),
            TokenKind::String(s) => Ok(Expr::Text(s)),
            TokenKind::Cell(cell) => Ok(Expr::Cell(cell)),
            TokenKind::LParen => {
                let inner = self.expr()?;
                self.expect(TokenKind::RParen, "Expected ')'")?;
                Ok(inner)
            }
            TokenKind::Ident(name) => {
                self.expect(TokenKind::LParen, "Expected '(' after function name")?;
                if name.eq_ignore_ascii_case("SUM") {
                    self.sum_range()
                } else if name.eq_ignore_ascii_case("CONCAT") {
                    self.concat_args()
                } else {
                    Err(FormulaError::UnknownFunction(name))
                }
            }
            _ => Err(FormulaError::parse("Unexpected token", token.span)),
        }
    }

    fn sum_range(&mut self) -> Result<Expr, FormulaError> {
        let start = self.cell("SUM expects a range such as B2:D2")?;
        self.expect(TokenKind::Colon, "SUM expects a range such as B2:D2")?;
        let end = self.cell("SUM expects a range such as B2:D2")?;
        self.expect(TokenKind::RParen, "Expected ')'")?;
        Ok(Expr::Sum { start, end })
    }

    fn concat_args(&mut self) -> Result<Expr, FormulaError> {
        let mut args = Vec::new();
        let mut current: Vec<Token> = Vec::new();
        let mut depth = 0usize;
        loop {
            let token = self.next_token()?;
            match token.kind {
                TokenKind::RParen if depth == 0 => {
                    args.push(self.concat_arg(current));
                    return Ok(Expr::Concat(args));
                }
                TokenKind::Comma if depth == 0 => {
                    args.push(self.concat_arg(std::mem::take(&mut current)));
                }
                TokenKind::LParen => {
                    depth += 1;
                    current.push(token);
                }
                TokenKind::RParen => {
                    depth -= 1;
                    current.push(token);
                }
                _ => current.push(token),
            }
        }
    }

    fn concat_arg(&self, tokens: Vec<Token>) -> ConcatArg {
        let text = match (tokens.first(), tokens.last()) {
            (Some(first), Some(last)) => self.src[first.span.start..last.span.end].to_string(),
            _ => String::new(),
        };
        match <[Token; 1]>::try_from(tokens) {
            Ok([Token {
                kind: TokenKind::String(s),
                ..
            }]) => ConcatArg::Literal(s),
            Ok([Token {
                kind: TokenKind::Cell(cell),
                ..
            }]) => ConcatArg::Cell { cell, text },
            _ => ConcatArg::Bare(text),
        }
    }

    fn cell(&mut self, message: &str) -> Result<CellRef, FormulaError> {
        let token = self.next_token()?;
        match token.kind {
            TokenKind::Cell(cell) => Ok(cell),
            _ => Err(FormulaError::parse(message, token.span)),
        }
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<(), FormulaError> {
        let token = self.next_token()?;
        if token.kind == kind {
            Ok(())
        } else {
            Err(FormulaError::parse(message, token.span))
        }
    }

    fn next_token(&mut self) -> Result<Token, FormulaError> {
        let token = self.tokens.get(self.pos).cloned().ok_or_else(|| {
            FormulaError::parse(
                "Unexpected end of formula",
                Span::new(self.src.len(), self.src.len()),
            )
        })?;
        self.pos += 1;
        Ok(token)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::lexer::tokenize;

    fn parse_src(src: &str) -> Result<Expr, FormulaError> {
        parse(src, tokenize(src)?)
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parse_src("1+2*3").unwrap();
        assert_eq!(
            expr,
            binary(
                BinaryOp::Add,
                Expr::Number(1.0),
                binary(BinaryOp::Mul, Expr::Number(2.0), Expr::Number(3.0)),
            )
        );
    }

    #[test]
    fn parses_sum_range() {
        assert_eq!(
            parse_src("sum(B2:D2)").unwrap(),
            Expr::Sum {
                start: CellRef { col: 1, row: 2 },
                end: CellRef { col: 3, row: 2 },
            }
        );
        assert!(parse_src("SUM(B2)").is_err());
    }

    #[test]
    fn classifies_concat_arguments() {
        assert_eq!(
            parse_src("CONCAT(B2, \"-\", size x)").unwrap(),
            Expr::Concat(vec![
                ConcatArg::Cell {
                    cell: CellRef { col: 1, row: 2 },
                    text: "B2".into(),
                },
                ConcatArg::Literal("-".into()),
                ConcatArg::Bare("size x".into()),
            ])
        );
    }

    #[test]
    fn rejects_unknown_functions_and_dangling_input() {
        assert_eq!(
            parse_src("AVG(B2:C2)"),
            Err(FormulaError::UnknownFunction("AVG".into()))
        );
        assert!(parse_src("1 +").is_err());
        assert!(parse_src("(1").is_err());
        assert!(parse_src("1 2").is_err());
        assert!(parse_src("CONCAT(B2").is_err());
    }
}
