//! Line-oriented lexer shared by `go.mod` and `go.work`.
//!
//! Both files are a sequence of directives. A directive is either a single
//! line (`require example.com/a v1.0.0`) or a parenthesised block whose
//! lines share the directive verb:
//!
//! ```text
//! require (
//!     example.com/a v1.0.0
//!     example.com/b v1.2.0 // indirect
//! )
//! ```

use std::path::Path;

use crate::core::errors::{Result, VendorError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Word(String),
    LParen,
    RParen,
    Arrow,
}

/// One logical line of arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entry {
    /// 1-based line number.
    pub line: usize,
    pub args: Vec<Token>,
    /// Trailing `//` comment, trimmed.
    pub comment: Option<String>,
}

impl Entry {
    /// Arguments as plain words, failing on any structural token.
    pub fn words(&self, path: &Path) -> Result<Vec<&str>> {
        self.args
            .iter()
            .map(|t| match t {
                Token::Word(w) => Ok(w.as_str()),
                Token::Arrow => Err(VendorError::parse(path, self.line, "unexpected =>")),
                Token::LParen | Token::RParen => {
                    Err(VendorError::parse(path, self.line, "unexpected parenthesis"))
                }
            })
            .collect()
    }
}

/// A directive with all of its entries (one for the single-line form).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Directive {
    pub verb: String,
    pub line: usize,
    pub entries: Vec<Entry>,
}

/// Split a descriptor into directives.
pub(crate) fn parse_directives(path: &Path, src: &str) -> Result<Vec<Directive>> {
    let mut directives = Vec::new();
    let mut open: Option<Directive> = None;

    for (idx, raw) in src.lines().enumerate() {
        let line = idx + 1;
        let (tokens, comment) = tokenize(path, line, raw)?;
        if tokens.is_empty() {
            continue;
        }

        if open.is_some() {
            if tokens == [Token::RParen] {
                directives.extend(open.take());
                continue;
            }
            if tokens.contains(&Token::LParen) {
                return Err(VendorError::parse(path, line, "nested blocks are not allowed"));
            }
            if let Some(block) = open.as_mut() {
                block.entries.push(Entry {
                    line,
                    args: tokens,
                    comment,
                });
            }
            continue;
        }

        let verb = match &tokens[0] {
            Token::Word(w) => w.clone(),
            _ => return Err(VendorError::parse(path, line, "expected a directive")),
        };
        let rest = &tokens[1..];

        match rest {
            [Token::LParen] => {
                open = Some(Directive {
                    verb,
                    line,
                    entries: Vec::new(),
                });
            }
            [Token::LParen, Token::RParen] => directives.push(Directive {
                verb,
                line,
                entries: Vec::new(),
            }),
            _ => directives.push(Directive {
                verb,
                line,
                entries: vec![Entry {
                    line,
                    args: rest.to_vec(),
                    comment,
                }],
            }),
        }
    }

    if let Some(block) = open {
        return Err(VendorError::parse(
            path,
            block.line,
            format!("unterminated {} block", block.verb),
        ));
    }

    Ok(directives)
}

fn tokenize(path: &Path, line: usize, raw: &str) -> Result<(Vec<Token>, Option<String>)> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = raw.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '/' if chars.get(i + 1) == Some(&'/') => {
                let comment: String = chars[i + 2..].iter().collect();
                return Ok((tokens, Some(comment.trim().to_string())));
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '=' if chars.get(i + 1) == Some(&'>') => {
                tokens.push(Token::Arrow);
                i += 2;
            }
            '"' => {
                let mut word = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => {
                            return Err(VendorError::parse(path, line, "unterminated quoted string"))
                        }
                        Some('"') => {
                            i += 1;
                            break;
                        }
                        Some('\\') => {
                            match chars.get(i + 1) {
                                Some('n') => word.push('\n'),
                                Some('t') => word.push('\t'),
                                Some(&other) => word.push(other),
                                None => {
                                    return Err(VendorError::parse(
                                        path,
                                        line,
                                        "unterminated quoted string",
                                    ))
                                }
                            }
                            i += 2;
                        }
                        Some(&other) => {
                            word.push(other);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Word(word));
            }
            '`' => {
                let start = i + 1;
                let Some(len) = chars[start..].iter().position(|&c| c == '`') else {
                    return Err(VendorError::parse(path, line, "unterminated raw string"));
                };
                tokens.push(Token::Word(chars[start..start + len].iter().collect()));
                i = start + len + 1;
            }
            _ => {
                let start = i;
                while i < chars.len() {
                    let c = chars[i];
                    let next = chars.get(i + 1);
                    if c.is_whitespace()
                        || matches!(c, '(' | ')' | '"' | '`')
                        || (c == '/' && next == Some(&'/'))
                        || (c == '=' && next == Some(&'>'))
                    {
                        break;
                    }
                    i += 1;
                }
                tokens.push(Token::Word(chars[start..i].iter().collect()));
            }
        }
    }

    Ok((tokens, None))
}
