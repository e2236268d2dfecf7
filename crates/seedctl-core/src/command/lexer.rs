// Shell-like tokenizer for command lines.

use crate::error::CoreError;

/// One word of a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    /// Unquoted, unescaped text.
    pub text: String,
    /// Exact source slice, quotes and backslashes included.
    pub raw: String,
    /// Whether any part of the word was quoted or escaped.
    pub quoted: bool,
    /// Byte offset of the word in the line.
    pub offset: usize,
}

impl Word {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            raw: text.clone(),
            text,
            quoted: false,
            offset: 0,
        }
    }

    /// Text handed to the filter parser. A word that is one quoted
    /// segment is unwrapped; anything else keeps its quotes so
    /// `name='a b'` reaches the parser intact.
    pub fn filter_text(&self) -> &str {
        let wrapped = self.raw.len() >= 2
            && (self.raw.starts_with('\'') || self.raw.starts_with('"'))
            && self.raw.ends_with(&self.raw[..1])
            && self.text.len() + 2 == self.raw.len();
        if wrapped { &self.text } else { &self.raw }
    }

    /// Unquoted word equal to `s`. Chain operators must be unquoted.
    pub fn is_bare(&self, s: &str) -> bool {
        !self.quoted && self.text == s
    }
}

/// Split `line` into words. Whitespace separates words, `'…'` and `"…"`
/// group, a backslash escapes the next character, and an unquoted `;`
/// is always a word of its own.
pub fn tokenize(line: &str) -> Result<Vec<Word>, CoreError> {
    let mut words = Vec::new();
    let mut current: Option<Word> = None;
    let mut chars = line.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        if c.is_whitespace() {
            finish(&mut words, &mut current, line, pos);
            continue;
        }
        if c == ';' {
            finish(&mut words, &mut current, line, pos);
            words.push(Word {
                text: ";".into(),
                raw: ";".into(),
                quoted: false,
                offset: pos,
            });
            continue;
        }

        let word = current.get_or_insert_with(|| Word {
            text: String::new(),
            raw: String::new(),
            quoted: false,
            offset: pos,
        });
        match c {
            '\\' => {
                word.quoted = true;
                if let Some((_, next)) = chars.next() {
                    word.text.push(next);
                }
            }
            '\'' | '"' => {
                word.quoted = true;
                let mut closed = false;
                while let Some((_, inner)) = chars.next() {
                    if inner == c {
                        closed = true;
                        break;
                    }
                    if inner == '\\' && c == '"' {
                        if let Some((_, next)) = chars.next_if(|(_, n)| *n == '"' || *n == '\\') {
                            word.text.push(next);
                            continue;
                        }
                    }
                    word.text.push(inner);
                }
                if !closed {
                    return Err(CoreError::Syntax {
                        message: format!("unterminated quote {c}"),
                        offset: pos,
                    });
                }
            }
            _ => word.text.push(c),
        }
    }
    finish(&mut words, &mut current, line, line.len());
    Ok(words)
}

fn finish(words: &mut Vec<Word>, current: &mut Option<Word>, line: &str, end: usize) {
    if let Some(mut word) = current.take() {
        word.raw = line[word.offset..end].to_owned();
        words.push(word);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn texts(line: &str) -> Vec<String> {
        tokenize(line).unwrap().into_iter().map(|w| w.text).collect()
    }

    #[test]
    fn splits_on_whitespace_and_semicolons() {
        assert_eq!(texts("ls  -s name;stop"), vec!["ls", "-s", "name", ";", "stop"]);
        assert_eq!(texts("  "), Vec::<String>::new());
    }

    #[test]
    fn quotes_and_escapes() {
        assert_eq!(texts(r#"add "a b" 'c;d' e\ f"#), vec!["add", "a b", "c;d", "e f"]);
        assert_eq!(texts(r#"rename "say \"hi\"""#), vec!["rename", r#"say "hi""#]);
    }

    #[test]
    fn raw_keeps_inner_quotes_for_filters() {
        let words = tokenize("ls name='a b' 'seeds > 5'").unwrap();
        assert_eq!(words[1].filter_text(), "name='a b'");
        assert_eq!(words[1].offset, 3);
        assert_eq!(words[2].filter_text(), "seeds > 5");
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        let err = tokenize("ls 'abc").unwrap_err();
        assert!(matches!(err, CoreError::Syntax { offset: 3, .. }));
    }
}
