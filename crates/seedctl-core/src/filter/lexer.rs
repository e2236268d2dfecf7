// ── Filter tokenizer ──

use super::error::FilterError;

/// Comparison operators as written, before `!~` / `!=~` desugar to NOT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpToken {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
    NotContains,
    Regex,
    NotRegex,
}

impl OpToken {
    pub(crate) fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Contains => "~",
            Self::NotContains => "!~",
            Self::Regex => "=~",
            Self::NotRegex => "!=~",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Tok {
    Word { text: String, quoted: bool },
    Op(OpToken),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub tok: Tok,
    pub offset: usize,
    /// Raw source text of the token.
    pub raw: String,
}

/// Characters that end a bare word.
pub(crate) fn is_special(c: char) -> bool {
    matches!(c, '=' | '!' | '<' | '>' | '~' | '&' | '|' | '(' | ')')
}

/// Characters a backslash escapes in bare words. Other backslashes are
/// kept, so regex classes like `\d` survive unquoted.
fn escapable(c: char) -> bool {
    c.is_whitespace() || is_special(c) || matches!(c, '\'' | '"' | '\\')
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, FilterError> {
    let mut out = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let tok = match c {
            '(' | ')' | '&' | '|' | '~' => {
                chars.next();
                match c {
                    '(' => Tok::LParen,
                    ')' => Tok::RParen,
                    '&' => Tok::And,
                    '|' => Tok::Or,
                    _ => Tok::Op(OpToken::Contains),
                }
            }
            '!' => {
                chars.next();
                if chars.next_if(|&(_, n)| n == '=').is_some() {
                    if chars.next_if(|&(_, n)| n == '~').is_some() {
                        Tok::Op(OpToken::NotRegex)
                    } else {
                        Tok::Op(OpToken::Ne)
                    }
                } else if chars.next_if(|&(_, n)| n == '~').is_some() {
                    Tok::Op(OpToken::NotContains)
                } else {
                    Tok::Not
                }
            }
            '=' => {
                chars.next();
                if chars.next_if(|&(_, n)| n == '~').is_some() {
                    Tok::Op(OpToken::Regex)
                } else {
                    Tok::Op(OpToken::Eq)
                }
            }
            '<' | '>' => {
                chars.next();
                let or_equal = chars.next_if(|&(_, n)| n == '=').is_some();
                Tok::Op(match (c, or_equal) {
                    ('<', false) => OpToken::Lt,
                    ('<', true) => OpToken::Le,
                    (_, false) => OpToken::Gt,
                    (_, true) => OpToken::Ge,
                })
            }
            '\'' | '"' => {
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                while let Some((_, ch)) = chars.next() {
                    if ch == c {
                        closed = true;
                        break;
                    }
                    if ch == '\\' {
                        match chars.next_if(|&(_, n)| n == c || n == '\\') {
                            Some((_, escaped)) => text.push(escaped),
                            None => text.push(ch),
                        }
                        continue;
                    }
                    text.push(ch);
                }
                if !closed {
                    return Err(FilterError::Syntax {
                        message: "Unterminated quote".into(),
                        token: input[start..].to_owned(),
                        offset: start,
                    });
                }
                Tok::Word { text, quoted: true }
            }
            _ => {
                let mut text = String::new();
                while let Some(&(_, ch)) = chars.peek() {
                    if ch.is_whitespace() || is_special(ch) {
                        break;
                    }
                    chars.next();
                    if ch == '\\' {
                        match chars.next_if(|&(_, n)| escapable(n)) {
                            Some((_, escaped)) => text.push(escaped),
                            None => text.push(ch),
                        }
                        continue;
                    }
                    text.push(ch);
                }
                Tok::Word {
                    text,
                    quoted: false,
                }
            }
        };

        let end = chars.peek().map_or(input.len(), |&(i, _)| i);
        out.push(Token {
            tok,
            offset: start,
            raw: input[start..end].to_owned(),
        });
    }
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Tok> {
        tokenize(input).unwrap().into_iter().map(|t| t.tok).collect()
    }

    fn word(s: &str) -> Tok {
        Tok::Word {
            text: s.into(),
            quoted: false,
        }
    }

    #[test]
    fn operators_split_words_without_spaces() {
        assert_eq!(
            kinds("path~/foo/&ratio>10"),
            vec![
                word("path"),
                Tok::Op(OpToken::Contains),
                word("/foo/"),
                Tok::And,
                word("ratio"),
                Tok::Op(OpToken::Gt),
                word("10"),
            ]
        );
    }

    #[test]
    fn negated_operators() {
        assert_eq!(
            kinds("!a!=b!~c!=~d"),
            vec![
                Tok::Not,
                word("a"),
                Tok::Op(OpToken::Ne),
                word("b"),
                Tok::Op(OpToken::NotContains),
                word("c"),
                Tok::Op(OpToken::NotRegex),
                word("d"),
            ]
        );
    }

    #[test]
    fn quotes_and_escapes() {
        assert_eq!(
            kinds(r#"name="a b\"c" x\&y"#),
            vec![
                word("name"),
                Tok::Op(OpToken::Eq),
                Tok::Word {
                    text: "a b\"c".into(),
                    quoted: true,
                },
                word("x&y"),
            ]
        );
    }

    #[test]
    fn backslash_before_ordinary_characters_is_kept() {
        assert_eq!(kinds(r"\d+"), vec![word(r"\d+")]);
        assert_eq!(
            kinds(r"'a\db\'c'"),
            vec![Tok::Word {
                text: r"a\db'c".into(),
                quoted: true,
            }]
        );
    }

    #[test]
    fn offsets_are_byte_positions() {
        let toks = tokenize("  seeds >= 5").unwrap();
        assert_eq!(toks[0].offset, 2);
        assert_eq!(toks[1].offset, 8);
        assert_eq!(toks[1].raw, ">=");
        assert_eq!(toks[2].offset, 11);
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        let err = tokenize("name='abc").unwrap_err();
        assert_eq!(err.offset(), 5);
    }
}
