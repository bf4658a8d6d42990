//! Tokenizer shared by the DDS and DAS grammars.

use crate::error::{DapError, DapResult};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// Identifier, keyword or bare number.
    Word(String),
    /// Double-quoted string with escapes resolved.
    Str(String),
    Punct(char),
}

const PUNCT: &[char] = &['{', '}', '[', ']', '=', ';', ',', ':'];

pub(crate) fn tokenize(input: &str, what: &'static str) -> DapResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if PUNCT.contains(&c) {
            tokens.push(Token::Punct(c));
            chars.next();
        } else if c == '"' {
            chars.next();
            let mut s = String::new();
            loop {
                match chars.next() {
                    Some('\\') => match chars.next() {
                        Some(escaped) => s.push(escaped),
                        None => return Err(DapError::parse(what, "unterminated escape")),
                    },
                    Some('"') => break,
                    Some(other) => s.push(other),
                    None => return Err(DapError::parse(what, "unterminated string")),
                }
            }
            tokens.push(Token::Str(s));
        } else {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() || PUNCT.contains(&c) || c == '"' {
                    break;
                }
                word.push(c);
                chars.next();
            }
            tokens.push(Token::Word(word));
        }
    }

    Ok(tokens)
}

/// Cursor over a token list with expectation helpers.
pub(crate) struct Tokens {
    tokens: Vec<Token>,
    pos: usize,
    what: &'static str,
}

impl Tokens {
    pub fn new(input: &str, what: &'static str) -> DapResult<Self> {
        Ok(Self {
            tokens: tokenize(input, what)?,
            pos: 0,
            what,
        })
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    pub fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn peek_is(&self, c: char) -> bool {
        matches!(self.peek(), Some(Token::Punct(p)) if *p == c)
    }

    pub fn expect(&mut self, c: char) -> DapResult<()> {
        match self.next() {
            Some(Token::Punct(p)) if p == c => Ok(()),
            other => Err(self.error(format!("expected '{}', found {:?}", c, other))),
        }
    }

    pub fn word(&mut self) -> DapResult<String> {
        match self.next() {
            Some(Token::Word(w)) => Ok(w),
            other => Err(self.error(format!("expected identifier, found {:?}", other))),
        }
    }

    /// Consume a keyword, case-insensitively.
    pub fn keyword(&mut self, kw: &str) -> DapResult<()> {
        let w = self.word()?;
        if w.eq_ignore_ascii_case(kw) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}', found '{}'", kw, w)))
        }
    }

    pub fn error(&self, message: String) -> DapError {
        DapError::parse(self.what, format!("{} (token {})", message, self.pos))
    }
}
