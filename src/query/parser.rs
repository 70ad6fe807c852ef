//! Parser for the closed query grammar.
//!
//! The surface syntax is the pandas subset the synthesizer is instructed to
//! emit: `df` with postfix selection, filtering, sorting, grouping, and
//! aggregation. Anything outside the grammar is a parse error; nothing is
//! ever evaluated as code.

use crate::dataset::Value;
use crate::error::QueryError;

use super::ast::{Aggregate, CmpOp, Expr, Predicate};

/// Parse a query expression string into an [`Expr`].
pub fn parse(input: &str) -> Result<Expr, QueryError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        input_len: input.len(),
    };
    let expr = parser.parse_expr()?;
    parser.expect_end()?;
    Ok(expr)
}

// ============================================================================
// Tokenizer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
    LBracket,
    RBracket,
    LParen,
    RParen,
    Dot,
    Comma,
    Assign,
    Amp,
    Pipe,
    Cmp(CmpOp),
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    pos: usize,
}

fn tokenize(input: &str) -> Result<Vec<Token>, QueryError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        let pos = i;
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                i += 1;
            }
            '[' => {
                tokens.push(Token { kind: TokenKind::LBracket, pos });
                i += 1;
            }
            ']' => {
                tokens.push(Token { kind: TokenKind::RBracket, pos });
                i += 1;
            }
            '(' => {
                tokens.push(Token { kind: TokenKind::LParen, pos });
                i += 1;
            }
            ')' => {
                tokens.push(Token { kind: TokenKind::RParen, pos });
                i += 1;
            }
            '.' => {
                tokens.push(Token { kind: TokenKind::Dot, pos });
                i += 1;
            }
            ',' => {
                tokens.push(Token { kind: TokenKind::Comma, pos });
                i += 1;
            }
            '&' => {
                tokens.push(Token { kind: TokenKind::Amp, pos });
                i += 1;
            }
            '|' => {
                tokens.push(Token { kind: TokenKind::Pipe, pos });
                i += 1;
            }
            '=' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token { kind: TokenKind::Cmp(CmpOp::Eq), pos });
                    i += 2;
                } else {
                    tokens.push(Token { kind: TokenKind::Assign, pos });
                    i += 1;
                }
            }
            '!' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token { kind: TokenKind::Cmp(CmpOp::Ne), pos });
                    i += 2;
                } else {
                    return Err(QueryError::parse(pos, "unexpected '!'"));
                }
            }
            '>' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token { kind: TokenKind::Cmp(CmpOp::Ge), pos });
                    i += 2;
                } else {
                    tokens.push(Token { kind: TokenKind::Cmp(CmpOp::Gt), pos });
                    i += 1;
                }
            }
            '<' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token { kind: TokenKind::Cmp(CmpOp::Le), pos });
                    i += 2;
                } else {
                    tokens.push(Token { kind: TokenKind::Cmp(CmpOp::Lt), pos });
                    i += 1;
                }
            }
            '\'' | '"' => {
                let quote = c;
                let mut j = i + 1;
                while j < bytes.len() && bytes[j] as char != quote {
                    j += 1;
                }
                if j >= bytes.len() {
                    return Err(QueryError::parse(pos, "unterminated string literal"));
                }
                tokens.push(Token {
                    kind: TokenKind::Str(input[i + 1..j].to_string()),
                    pos,
                });
                i = j + 1;
            }
            '-' | '0'..='9' => {
                let mut j = i;
                if c == '-' {
                    j += 1;
                }
                let mut is_float = false;
                while j < bytes.len() {
                    let d = bytes[j] as char;
                    if d.is_ascii_digit() {
                        j += 1;
                    } else if d == '.' && !is_float && j + 1 < bytes.len()
                        && (bytes[j + 1] as char).is_ascii_digit()
                    {
                        is_float = true;
                        j += 1;
                    } else {
                        break;
                    }
                }
                let text = &input[i..j];
                if text == "-" {
                    return Err(QueryError::parse(pos, "unexpected '-'"));
                }
                let kind = if is_float {
                    TokenKind::Float(
                        text.parse()
                            .map_err(|_| QueryError::parse(pos, "invalid number"))?,
                    )
                } else {
                    TokenKind::Int(
                        text.parse()
                            .map_err(|_| QueryError::parse(pos, "invalid number"))?,
                    )
                };
                tokens.push(Token { kind, pos });
                i = j;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut j = i + 1;
                while j < bytes.len() {
                    let d = bytes[j] as char;
                    if d.is_ascii_alphanumeric() || d == '_' {
                        j += 1;
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Ident(input[i..j].to_string()),
                    pos,
                });
                i = j;
            }
            other => {
                return Err(QueryError::parse(pos, format!("unexpected character '{}'", other)));
            }
        }
    }

    Ok(tokens)
}

// ============================================================================
// Parser
// ============================================================================

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    input_len: usize,
}

impl Parser {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn current_pos(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.pos)
            .unwrap_or(self.input_len)
    }

    fn advance(&mut self) -> Option<TokenKind> {
        let kind = self.tokens.get(self.pos).map(|t| t.kind.clone());
        if kind.is_some() {
            self.pos += 1;
        }
        kind
    }

    fn expect(&mut self, expected: TokenKind, what: &str) -> Result<(), QueryError> {
        let pos = self.current_pos();
        match self.advance() {
            Some(kind) if kind == expected => Ok(()),
            _ => Err(QueryError::parse(pos, format!("expected {}", what))),
        }
    }

    fn expect_string(&mut self, what: &str) -> Result<String, QueryError> {
        let pos = self.current_pos();
        match self.advance() {
            Some(TokenKind::Str(s)) => Ok(s),
            _ => Err(QueryError::parse(pos, format!("expected {}", what))),
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<(String, usize), QueryError> {
        let pos = self.current_pos();
        match self.advance() {
            Some(TokenKind::Ident(name)) => Ok((name, pos)),
            _ => Err(QueryError::parse(pos, format!("expected {}", what))),
        }
    }

    fn expect_end(&mut self) -> Result<(), QueryError> {
        if self.pos < self.tokens.len() {
            return Err(QueryError::parse(
                self.current_pos(),
                "unexpected trailing input",
            ));
        }
        Ok(())
    }

    fn parse_expr(&mut self) -> Result<Expr, QueryError> {
        // len(<frame>)
        if let Some(TokenKind::Ident(name)) = self.peek() {
            if name == "len" {
                self.advance();
                self.expect(TokenKind::LParen, "'(' after len")?;
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                return Ok(Expr::Len(Box::new(inner)));
            }
        }

        self.parse_df()?;
        let mut expr = Expr::Table;
        loop {
            match self.peek() {
                Some(TokenKind::LBracket) => {
                    self.advance();
                    expr = self.parse_bracket(expr)?;
                }
                Some(TokenKind::Dot) => {
                    self.advance();
                    expr = self.parse_method(expr)?;
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_df(&mut self) -> Result<(), QueryError> {
        let (name, pos) = self.expect_ident("'df'")?;
        if name != "df" {
            return Err(QueryError::parse(pos, "expected 'df'"));
        }
        Ok(())
    }

    /// Parse the contents of `expr[...]`: a column, a column list, or a
    /// filter predicate. The opening bracket is already consumed.
    fn parse_bracket(&mut self, input: Expr) -> Result<Expr, QueryError> {
        match self.peek() {
            Some(TokenKind::Str(_)) => {
                let column = self.expect_string("a quoted column name")?;
                self.expect(TokenKind::RBracket, "']'")?;
                Ok(Expr::Select {
                    input: Box::new(input),
                    column,
                })
            }
            Some(TokenKind::LBracket) => {
                self.advance();
                let mut columns = vec![self.expect_string("a quoted column name")?];
                while self.peek() == Some(&TokenKind::Comma) {
                    self.advance();
                    columns.push(self.expect_string("a quoted column name")?);
                }
                self.expect(TokenKind::RBracket, "']'")?;
                self.expect(TokenKind::RBracket, "']'")?;
                Ok(Expr::Project {
                    input: Box::new(input),
                    columns,
                })
            }
            _ => {
                let predicate = self.parse_predicate()?;
                self.expect(TokenKind::RBracket, "']'")?;
                Ok(Expr::Filter {
                    input: Box::new(input),
                    predicate,
                })
            }
        }
    }

    fn parse_predicate(&mut self) -> Result<Predicate, QueryError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&TokenKind::Pipe) {
            self.advance();
            let right = self.parse_and()?;
            left = Predicate::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Predicate, QueryError> {
        let mut left = self.parse_predicate_term()?;
        while self.peek() == Some(&TokenKind::Amp) {
            self.advance();
            let right = self.parse_predicate_term()?;
            left = Predicate::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_predicate_term(&mut self) -> Result<Predicate, QueryError> {
        if self.peek() == Some(&TokenKind::LParen) {
            self.advance();
            let inner = self.parse_predicate()?;
            self.expect(TokenKind::RParen, "')'")?;
            return Ok(inner);
        }
        self.parse_comparison()
    }

    /// `df['col'] <op> <literal>`
    fn parse_comparison(&mut self) -> Result<Predicate, QueryError> {
        self.parse_df()?;
        self.expect(TokenKind::LBracket, "'['")?;
        let column = self.expect_string("a quoted column name")?;
        self.expect(TokenKind::RBracket, "']'")?;

        let pos = self.current_pos();
        let op = match self.advance() {
            Some(TokenKind::Cmp(op)) => op,
            _ => return Err(QueryError::parse(pos, "expected a comparison operator")),
        };

        let literal = self.parse_literal()?;
        Ok(Predicate::Compare {
            column,
            op,
            literal,
        })
    }

    fn parse_literal(&mut self) -> Result<Value, QueryError> {
        let pos = self.current_pos();
        match self.advance() {
            Some(TokenKind::Int(i)) => Ok(Value::Int(i)),
            Some(TokenKind::Float(f)) => Ok(Value::Float(f)),
            Some(TokenKind::Str(s)) => Ok(Value::Str(s)),
            Some(TokenKind::Ident(name)) => match name.as_str() {
                "True" => Ok(Value::Bool(true)),
                "False" => Ok(Value::Bool(false)),
                "None" => Ok(Value::Null),
                _ => Err(QueryError::parse(pos, "expected a literal")),
            },
            _ => Err(QueryError::parse(pos, "expected a literal")),
        }
    }

    /// Parse `.<method>(...)`. The dot is already consumed.
    fn parse_method(&mut self, input: Expr) -> Result<Expr, QueryError> {
        let (name, pos) = self.expect_ident("a method name")?;

        if let Some(agg) = Aggregate::from_name(&name) {
            self.expect(TokenKind::LParen, "'('")?;
            self.expect(TokenKind::RParen, "')'")?;
            return Ok(Expr::Agg {
                input: Box::new(input),
                agg,
            });
        }

        match name.as_str() {
            "unique" => {
                self.expect(TokenKind::LParen, "'('")?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(Expr::Unique(Box::new(input)))
            }
            "value_counts" => {
                self.expect(TokenKind::LParen, "'('")?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(Expr::ValueCounts(Box::new(input)))
            }
            "head" => {
                self.expect(TokenKind::LParen, "'('")?;
                let pos = self.current_pos();
                let n = match self.advance() {
                    Some(TokenKind::Int(n)) if n >= 0 => n as usize,
                    _ => return Err(QueryError::parse(pos, "expected a row count")),
                };
                self.expect(TokenKind::RParen, "')'")?;
                Ok(Expr::Head {
                    input: Box::new(input),
                    n,
                })
            }
            "sort_values" => {
                self.expect(TokenKind::LParen, "'('")?;
                let by = self.expect_string("a quoted column name")?;
                let mut ascending = true;
                if self.peek() == Some(&TokenKind::Comma) {
                    self.advance();
                    let (kwarg, kw_pos) = self.expect_ident("'ascending'")?;
                    if kwarg != "ascending" {
                        return Err(QueryError::parse(kw_pos, "expected 'ascending'"));
                    }
                    self.expect(TokenKind::Assign, "'='")?;
                    let (flag, flag_pos) = self.expect_ident("True or False")?;
                    ascending = match flag.as_str() {
                        "True" => true,
                        "False" => false,
                        _ => return Err(QueryError::parse(flag_pos, "expected True or False")),
                    };
                }
                self.expect(TokenKind::RParen, "')'")?;
                Ok(Expr::SortValues {
                    input: Box::new(input),
                    by,
                    ascending,
                })
            }
            "groupby" => {
                self.expect(TokenKind::LParen, "'('")?;
                let key = self.expect_string("a quoted column name")?;
                self.expect(TokenKind::RParen, "')'")?;
                self.expect(TokenKind::LBracket, "'[' selecting the aggregated column")?;
                let column = self.expect_string("a quoted column name")?;
                self.expect(TokenKind::RBracket, "']'")?;
                self.expect(TokenKind::Dot, "'.' before the aggregate")?;
                let (agg_name, agg_pos) = self.expect_ident("an aggregate")?;
                let agg = Aggregate::from_name(&agg_name)
                    .ok_or_else(|| QueryError::parse(agg_pos, "unknown aggregate"))?;
                self.expect(TokenKind::LParen, "'('")?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(Expr::GroupAgg {
                    input: Box::new(input),
                    key,
                    column,
                    agg,
                })
            }
            _ => Err(QueryError::parse(pos, format!("unknown method '{}'", name))),
        }
    }
}
