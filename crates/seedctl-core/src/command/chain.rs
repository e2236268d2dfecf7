// Command chains: `a ; b`, `a & b`, `a | b` and their word forms.

use std::fmt;

use serde::Serialize;

use super::lexer::Word;
use crate::error::CoreError;

/// How a command relates to the result of the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChainOp {
    /// `;` / `also`, and the first command of every chain.
    Always,
    /// `&` / `and`
    OnSuccess,
    /// `|` / `or`
    OnFailure,
}

impl ChainOp {
    fn from_word(word: &Word) -> Option<Self> {
        if word.quoted {
            return None;
        }
        match word.text.as_str() {
            ";" | "also" => Some(Self::Always),
            "&" | "and" => Some(Self::OnSuccess),
            "|" | "or" => Some(Self::OnFailure),
            _ => None,
        }
    }

    /// Whether a command behind this operator runs, given the previous
    /// command's success.
    pub fn should_run(self, previous_ok: Option<bool>) -> bool {
        match (self, previous_ok) {
            (Self::Always, _) | (_, None) => true,
            (Self::OnSuccess, Some(ok)) => ok,
            (Self::OnFailure, Some(ok)) => !ok,
        }
    }
}

impl fmt::Display for ChainOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Always => ";",
            Self::OnSuccess => "&",
            Self::OnFailure => "|",
        })
    }
}

/// One command of a chain with the operator in front of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub op: ChainOp,
    pub words: Vec<Word>,
}

impl Link {
    /// Command text reassembled from the source words.
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.raw.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Split words on unquoted chain operators. Consecutive or leading
/// operators are syntax errors; a trailing one is ignored.
pub fn split_chain(words: Vec<Word>) -> Result<Vec<Link>, CoreError> {
    let mut links = Vec::new();
    let mut op = ChainOp::Always;
    let mut current: Vec<Word> = Vec::new();
    let mut pending: Option<Word> = None;

    for word in words {
        match ChainOp::from_word(&word) {
            Some(next) => {
                if current.is_empty() {
                    return Err(CoreError::Syntax {
                        message: match pending {
                            Some(prev) => format!("consecutive operators '{}' '{}'", prev.text, word.text),
                            None => format!("command expected before '{}'", word.text),
                        },
                        offset: word.offset,
                    });
                }
                links.push(Link {
                    op,
                    words: std::mem::take(&mut current),
                });
                op = next;
                pending = Some(word);
            }
            None => {
                pending = None;
                current.push(word);
            }
        }
    }
    if !current.is_empty() {
        links.push(Link { op, words: current });
    }
    Ok(links)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::command::lexer::tokenize;

    fn chain(line: &str) -> Result<Vec<(ChainOp, String)>, CoreError> {
        split_chain(tokenize(line)?).map(|links| {
            links
                .into_iter()
                .map(|l| (l.op, l.text()))
                .collect()
        })
    }

    #[test]
    fn splits_on_symbols_and_words() {
        assert_eq!(
            chain("stop foo & start bar | ls; verify also announce").unwrap(),
            vec![
                (ChainOp::Always, "stop foo".into()),
                (ChainOp::OnSuccess, "start bar".into()),
                (ChainOp::OnFailure, "ls".into()),
                (ChainOp::Always, "verify".into()),
                (ChainOp::Always, "announce".into()),
            ]
        );
    }

    #[test]
    fn quoted_operators_are_words() {
        let links = chain("ls '&' \"and\"").unwrap();
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn trailing_operator_is_ignored() {
        assert_eq!(chain("ls ;").unwrap().len(), 1);
        assert_eq!(chain("ls and").unwrap().len(), 1);
    }

    #[test]
    fn consecutive_or_leading_operators_fail() {
        assert!(matches!(chain("ls & | stop"), Err(CoreError::Syntax { offset: 5, .. })));
        assert!(matches!(chain("; ls"), Err(CoreError::Syntax { offset: 0, .. })));
    }

    #[test]
    fn run_decisions() {
        assert!(ChainOp::Always.should_run(Some(false)));
        assert!(ChainOp::OnSuccess.should_run(Some(true)));
        assert!(!ChainOp::OnSuccess.should_run(Some(false)));
        assert!(ChainOp::OnFailure.should_run(Some(false)));
        assert!(!ChainOp::OnFailure.should_run(Some(true)));
    }
}
