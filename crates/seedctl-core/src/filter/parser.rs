// ── Filter parser ──
//
// Recursive descent over the token stream:
//
//   expr    := and ( '|' and )*
//   and     := unary ( '&' unary )*
//   unary   := '!' unary | primary
//   primary := '(' expr ')' | WORD [ OP WORD ] | OP WORD

use super::ast::{CmpOp, Comparison, Operand, Pattern, Predicate};
use super::error::FilterError;
use super::lexer::{OpToken, Tok, Token, tokenize};
use crate::field::units::{
    parse_bool, parse_bytes, parse_duration, parse_float, parse_int, parse_timestamp,
};
use crate::field::{FieldRegistry, FieldSpec, Resolved, Value, ValueType};

/// Parse `input` against `registry`. `None` means "match everything".
pub(crate) fn parse<E>(
    registry: &FieldRegistry<E>,
    input: &str,
    now: i64,
) -> Result<Option<Predicate>, FilterError> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        registry,
        tokens,
        pos: 0,
        end: input.len(),
        now,
    };
    let expr = parser.expr()?;
    if let Some(tok) = parser.peek() {
        let message = match tok.tok {
            Tok::RParen => "Unbalanced ')'",
            _ => "Expected '&' or '|'",
        };
        return Err(syntax(message, tok));
    }
    Ok(Some(expr))
}

fn syntax(message: &str, tok: &Token) -> FilterError {
    FilterError::Syntax {
        message: message.to_owned(),
        token: tok.raw.clone(),
        offset: tok.offset,
    }
}

struct Parser<'r, E> {
    registry: &'r FieldRegistry<E>,
    tokens: Vec<Token>,
    pos: usize,
    end: usize,
    now: i64,
}

impl<'r, E> Parser<'r, E> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn error_at_end(&self, message: &str) -> FilterError {
        FilterError::Syntax {
            message: message.to_owned(),
            token: String::new(),
            offset: self.end,
        }
    }

    fn expr(&mut self) -> Result<Predicate, FilterError> {
        let mut left = self.and()?;
        while matches!(self.peek().map(|t| &t.tok), Some(Tok::Or)) {
            self.pos += 1;
            let right = self.and()?;
            left = left.or(right);
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Predicate, FilterError> {
        let mut left = self.unary()?;
        while matches!(self.peek().map(|t| &t.tok), Some(Tok::And)) {
            self.pos += 1;
            let right = self.unary()?;
            left = left.and(right);
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Predicate, FilterError> {
        if matches!(self.peek().map(|t| &t.tok), Some(Tok::Not)) {
            self.pos += 1;
            return Ok(self.unary()?.not());
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Predicate, FilterError> {
        let Some(tok) = self.bump() else {
            return Err(self.error_at_end("Expected an expression"));
        };
        match tok.tok {
            Tok::LParen => {
                if matches!(self.peek().map(|t| &t.tok), Some(Tok::RParen)) {
                    return Err(syntax("Empty group", &tok));
                }
                let inner = self.expr()?;
                match self.bump() {
                    Some(Token {
                        tok: Tok::RParen, ..
                    }) => Ok(inner),
                    Some(other) => Err(syntax("Expected ')'", &other)),
                    None => Err(syntax("Unclosed '('", &tok)),
                }
            }
            Tok::Word { ref text, quoted } => {
                if let Some(Tok::Op(op)) = self.peek().map(|t| t.tok.clone()) {
                    let op_tok = self.bump().unwrap_or_else(|| tok.clone());
                    let registry = self.registry;
                    let spec = match registry.resolve(text) {
                        Some(Resolved::Field(spec)) => spec,
                        Some(Resolved::Flag(flag)) => {
                            return Err(FilterError::InvalidOperator {
                                field: flag.name.to_owned(),
                                op: op.symbol().to_owned(),
                                ty: ValueType::Bool,
                                offset: op_tok.offset,
                            });
                        }
                        None => {
                            return Err(FilterError::UnknownField {
                                kind: self.registry.kind(),
                                name: text.clone(),
                                offset: tok.offset,
                            });
                        }
                    };
                    return self.comparison(spec, op, &op_tok);
                }
                if quoted {
                    return self.default_contains(text);
                }
                match self.registry.resolve(text) {
                    Some(Resolved::Flag(flag)) => Ok(Predicate::Flag(flag.name)),
                    Some(Resolved::Field(field)) => Ok(Predicate::Truthy(field.name)),
                    None => self.default_contains(text),
                }
            }
            Tok::Op(op) => {
                let spec = self.default_field()?;
                self.comparison(spec, op, &tok)
            }
            Tok::RParen => Err(syntax("Unbalanced ')'", &tok)),
            Tok::And | Tok::Or => Err(syntax("Expected an expression before operator", &tok)),
            Tok::Not => Err(syntax("Unexpected '!'", &tok)),
        }
    }

    fn default_field(&self) -> Result<&'r FieldSpec<E>, FilterError> {
        let registry = self.registry;
        registry
            .default_field()
            .ok_or_else(|| self.error_at_end("No default field"))
    }

    fn default_contains(&self, text: &str) -> Result<Predicate, FilterError> {
        let spec = self.default_field()?;
        Ok(Predicate::Compare(Comparison {
            field: spec.name,
            op: CmpOp::Contains,
            operand: Operand::Value(Value::Text(text.to_owned().into())),
        }))
    }

    fn comparison(
        &mut self,
        spec: &FieldSpec<E>,
        op: OpToken,
        op_tok: &Token,
    ) -> Result<Predicate, FilterError> {
        let (cmp, negate) = match op {
            OpToken::Eq => (CmpOp::Eq, false),
            OpToken::Ne => (CmpOp::Ne, false),
            OpToken::Lt => (CmpOp::Lt, false),
            OpToken::Le => (CmpOp::Le, false),
            OpToken::Gt => (CmpOp::Gt, false),
            OpToken::Ge => (CmpOp::Ge, false),
            OpToken::Contains => (CmpOp::Contains, false),
            OpToken::NotContains => (CmpOp::Contains, true),
            OpToken::Regex => (CmpOp::Regex, false),
            OpToken::NotRegex => (CmpOp::Regex, true),
        };
        if matches!(cmp, CmpOp::Contains | CmpOp::Regex) && !spec.ty.is_textual() {
            return Err(FilterError::InvalidOperator {
                field: spec.name.to_owned(),
                op: op.symbol().to_owned(),
                ty: spec.ty,
                offset: op_tok.offset,
            });
        }

        let (text, offset) = match self.bump() {
            Some(Token {
                tok: Tok::Word { text, .. },
                offset,
                ..
            }) => (text, offset),
            Some(other) => return Err(syntax("Expected a value after operator", &other)),
            None => return Err(syntax("Expected a value after operator", op_tok)),
        };

        let invalid = |reason: String| FilterError::InvalidValue {
            field: spec.name.to_owned(),
            value: text.clone(),
            reason,
            offset,
        };

        let operand = match cmp {
            CmpOp::Regex => Operand::Pattern(Pattern::new(&text).map_err(|e| invalid(e.to_string()))?),
            CmpOp::Contains => Operand::Value(Value::Text(text.clone().into())),
            _ => Operand::Value(self.literal(spec, &text).map_err(invalid)?),
        };

        let pred = Predicate::Compare(Comparison {
            field: spec.name,
            op: cmp,
            operand,
        });
        Ok(if negate { pred.not() } else { pred })
    }

    fn literal(&self, spec: &FieldSpec<E>, text: &str) -> Result<Value<'static>, String> {
        Ok(match spec.ty {
            ValueType::Integer => Value::Int(parse_int(text)?),
            ValueType::Ratio => Value::Float(parse_float(text, false)?),
            ValueType::Percent => Value::Float(parse_float(text, true)?),
            ValueType::Bytes => Value::Bytes(parse_bytes(text, false)?),
            ValueType::Rate => Value::Bytes(parse_bytes(text, true)?),
            ValueType::Duration => Value::Duration(parse_duration(text)?),
            ValueType::Timestamp => Value::Timestamp(parse_timestamp(text, self.now, spec.future)?),
            ValueType::Bool => Value::Bool(parse_bool(text)?),
            ValueType::Text | ValueType::Path => Value::Text(text.to_owned().into()),
            ValueType::Status => {
                let (rank, name) = spec
                    .choices
                    .iter()
                    .enumerate()
                    .find(|(_, c)| c.eq_ignore_ascii_case(text))
                    .ok_or_else(|| format!("expected one of: {}", spec.choices.join(", ")))?;
                Value::Status {
                    rank: u8::try_from(rank).unwrap_or(u8::MAX),
                    name: *name,
                }
            }
        })
    }
}
