//! Dataset Attribute Structure (DAS) parsing.

use std::collections::HashMap;

use crate::dds::check_error_document;
use crate::error::DapResult;
use crate::lexer::{Token, Tokens};

#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Numbers(Vec<f64>),
}

impl AttrValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            AttrValue::Numbers(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Numbers(v) => v.first().copied(),
            AttrValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Attributes grouped by container (usually one container per variable).
///
/// Nested containers are stored under a dotted path, e.g. `NC_GLOBAL.history`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Das {
    containers: HashMap<String, HashMap<String, AttrValue>>,
}

impl Das {
    pub fn parse(text: &str) -> DapResult<Self> {
        check_error_document(text)?;

        let mut tokens = Tokens::new(text, "DAS")?;
        tokens.keyword("Attributes")?;
        tokens.expect('{')?;

        let mut das = Das::default();
        while !tokens.peek_is('}') {
            if tokens.is_at_end() {
                return Err(tokens.error("unexpected end of DAS".into()));
            }
            let name = tokens.word()?;
            das.parse_container(&mut tokens, name)?;
        }
        tokens.expect('}')?;
        Ok(das)
    }

    fn parse_container(&mut self, tokens: &mut Tokens, path: String) -> DapResult<()> {
        tokens.expect('{')?;
        let mut attrs = HashMap::new();

        while !tokens.peek_is('}') {
            if tokens.is_at_end() {
                return Err(tokens.error(format!("unterminated container '{}'", path)));
            }
            let type_or_name = tokens.word()?;
            if tokens.peek_is('{') {
                self.parse_container(tokens, format!("{}.{}", path, type_or_name))?;
                continue;
            }

            let attr_name = tokens.word()?;
            let mut texts = Vec::new();
            let mut numbers = Vec::new();
            loop {
                match tokens.next() {
                    Some(Token::Str(s)) => texts.push(s),
                    Some(Token::Word(w)) => match w.parse::<f64>() {
                        Ok(n) => numbers.push(n),
                        Err(_) => texts.push(w),
                    },
                    other => {
                        return Err(tokens.error(format!(
                            "expected value for '{}', found {:?}",
                            attr_name, other
                        )))
                    }
                }
                if tokens.peek_is(',') {
                    tokens.next();
                    continue;
                }
                tokens.expect(';')?;
                break;
            }

            let is_text = type_or_name.eq_ignore_ascii_case("string") || type_or_name.eq_ignore_ascii_case("url");
            let value = if is_text || !texts.is_empty() {
                let mut all: Vec<String> = texts;
                all.extend(numbers.iter().map(|n| n.to_string()));
                AttrValue::Text(all.join(", "))
            } else {
                AttrValue::Numbers(numbers)
            };
            attrs.insert(attr_name, value);
        }
        tokens.expect('}')?;

        self.containers.entry(path).or_default().extend(attrs);
        Ok(())
    }

    pub fn get(&self, container: &str, attribute: &str) -> Option<&AttrValue> {
        self.containers.get(container)?.get(attribute)
    }

    pub fn text(&self, container: &str, attribute: &str) -> Option<&str> {
        self.get(container, attribute)?.as_text()
    }

    pub fn number(&self, container: &str, attribute: &str) -> Option<f64> {
        self.get(container, attribute)?.as_number()
    }

    /// Values that mark missing data for a variable (`_FillValue`, `missing_value`).
    pub fn missing_values(&self, variable: &str) -> Vec<f64> {
        let mut out = Vec::new();
        for key in ["_FillValue", "missing_value"] {
            if let Some(AttrValue::Numbers(values)) = self.get(variable, key) {
                for &v in values {
                    if !out.contains(&v) {
                        out.push(v);
                    }
                }
            }
        }
        out
    }
}
