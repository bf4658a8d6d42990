//! Dataset Descriptor Structure (DDS) parsing.
//!
//! A DDS describes the shape of every variable in a dataset:
//!
//! ```text
//! Dataset {
//!     Float64 time[time = 121];
//!     Grid {
//!      ARRAY:
//!         Float32 tmp2m[time = 121][lat = 721][lon = 1440];
//!      MAPS:
//!         Float64 time[time = 121];
//!         Float64 lat[lat = 721];
//!         Float64 lon[lon = 1440];
//!     } tmp2m;
//! } gfs_0p25_1hr_00z;
//! ```
//!
//! Grids are flattened to their array member. Structure and Sequence
//! members are flattened into the top-level variable list.

use gfs_common::Dimension;

use crate::error::{DapError, DapResult};
use crate::lexer::{Token, Tokens};

/// DAP2 atomic types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DapType {
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float32,
    Float64,
    String,
    Url,
}

impl DapType {
    fn from_keyword(s: &str) -> Option<Self> {
        let t = match s.to_ascii_lowercase().as_str() {
            "byte" => DapType::Byte,
            "int16" => DapType::Int16,
            "uint16" => DapType::UInt16,
            "int32" => DapType::Int32,
            "uint32" => DapType::UInt32,
            "float32" => DapType::Float32,
            "float64" => DapType::Float64,
            "string" => DapType::String,
            "url" => DapType::Url,
            _ => return None,
        };
        Some(t)
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, DapType::String | DapType::Url)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DdsVariable {
    pub name: String,
    pub dtype: DapType,
    pub dims: Vec<Dimension>,
    /// True for the array member of a Grid.
    pub is_grid: bool,
}

impl DdsVariable {
    /// A one-dimensional variable named after its own dimension.
    pub fn is_coordinate(&self) -> bool {
        !self.is_grid && self.dims.len() == 1 && self.dims[0].name == self.name
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dds {
    pub name: String,
    pub variables: Vec<DdsVariable>,
}

impl Dds {
    pub fn parse(text: &str) -> DapResult<Self> {
        check_error_document(text)?;

        let mut tokens = Tokens::new(text, "DDS")?;
        tokens.keyword("Dataset")?;
        tokens.expect('{')?;

        let mut variables = Vec::new();
        while !tokens.peek_is('}') {
            if tokens.is_at_end() {
                return Err(tokens.error("unexpected end of DDS".into()));
            }
            parse_declaration(&mut tokens, &mut variables)?;
        }
        tokens.expect('}')?;
        let name = tokens.word()?;
        tokens.expect(';')?;

        Ok(Self { name, variables })
    }

    pub fn variable(&self, name: &str) -> Option<&DdsVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn coordinates(&self) -> impl Iterator<Item = &DdsVariable> {
        self.variables.iter().filter(|v| v.is_coordinate())
    }

    /// Variables that are not coordinate axes.
    pub fn data_variables(&self) -> impl Iterator<Item = &DdsVariable> {
        self.variables.iter().filter(|v| !v.is_coordinate())
    }
}

fn parse_declaration(tokens: &mut Tokens, out: &mut Vec<DdsVariable>) -> DapResult<()> {
    let keyword = tokens.word()?;

    match keyword.to_ascii_lowercase().as_str() {
        "grid" => {
            tokens.expect('{')?;
            tokens.keyword("ARRAY")?;
            tokens.expect(':')?;
            let mut array = parse_atomic(tokens)?;
            tokens.keyword("MAPS")?;
            tokens.expect(':')?;
            while !tokens.peek_is('}') {
                // Map vectors repeat the top-level coordinates.
                parse_atomic(tokens)?;
            }
            tokens.expect('}')?;
            let name = tokens.word()?;
            tokens.expect(';')?;
            array.name = name;
            array.is_grid = true;
            out.push(array);
        }
        "structure" | "sequence" => {
            tokens.expect('{')?;
            while !tokens.peek_is('}') {
                if tokens.is_at_end() {
                    return Err(tokens.error("unexpected end of structure".into()));
                }
                parse_declaration(tokens, out)?;
            }
            tokens.expect('}')?;
            tokens.word()?;
            tokens.expect(';')?;
        }
        _ => {
            let dtype = DapType::from_keyword(&keyword)
                .ok_or_else(|| tokens.error(format!("unknown type '{}'", keyword)))?;
            let var = parse_atomic_rest(tokens, dtype)?;
            out.push(var);
        }
    }
    Ok(())
}

fn parse_atomic(tokens: &mut Tokens) -> DapResult<DdsVariable> {
    let keyword = tokens.word()?;
    let dtype = DapType::from_keyword(&keyword)
        .ok_or_else(|| tokens.error(format!("unknown type '{}'", keyword)))?;
    parse_atomic_rest(tokens, dtype)
}

fn parse_atomic_rest(tokens: &mut Tokens, dtype: DapType) -> DapResult<DdsVariable> {
    let name = tokens.word()?;
    let mut dims = Vec::new();

    while tokens.peek_is('[') {
        tokens.expect('[')?;
        let first = tokens.word()?;
        let (dim_name, size_word) = if tokens.peek_is('=') {
            tokens.expect('=')?;
            (first, tokens.word()?)
        } else {
            (format!("dim{}", dims.len()), first)
        };
        let size = size_word
            .parse::<usize>()
            .map_err(|_| tokens.error(format!("invalid dimension size '{}'", size_word)))?;
        tokens.expect(']')?;
        dims.push(Dimension::new(dim_name, size));
    }
    tokens.expect(';')?;

    Ok(DdsVariable {
        name,
        dtype,
        dims,
        is_grid: false,
    })
}

/// Detect a DAP `Error { code = ...; message = "..."; };` body.
pub(crate) fn check_error_document(text: &str) -> DapResult<()> {
    let trimmed = text.trim_start();
    if !trimmed.starts_with("Error") {
        return Ok(());
    }

    let mut tokens = Tokens::new(trimmed, "error document")?;
    let mut message = None;
    while let Some(token) = tokens.next() {
        if token == Token::Word("message".into()) && tokens.peek_is('=') {
            tokens.next();
            if let Some(Token::Str(s)) = tokens.next() {
                message = Some(s);
            }
            break;
        }
    }
    Err(DapError::Server(
        message.unwrap_or_else(|| trimmed.lines().next().unwrap_or_default().to_string()),
    ))
}
