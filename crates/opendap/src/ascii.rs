//! Parsing of DAP2 ASCII data responses.
//!
//! Each array in the response starts with a header line naming it and its
//! shape, followed by rows of comma separated values. Rows of arrays with
//! more than one dimension are prefixed with their leading indices:
//!
//! ```text
//! tmp2m, [1][2][3]
//! [0][0], 300.1, 300.2, 300.3
//! [0][1], 301.1, 301.2, 301.3
//! time, [1]
//! 738901.0
//! ```

use crate::dds::check_error_document;
use crate::error::{DapError, DapResult};

#[derive(Debug, Clone, PartialEq)]
pub struct AsciiArray {
    /// Array name with any grid prefix (`tmp2m.tmp2m`) removed.
    pub name: String,
    pub shape: Vec<usize>,
    pub values: Vec<f64>,
}

impl AsciiArray {
    pub fn expected_len(&self) -> usize {
        self.shape.iter().product()
    }
}

/// Parse all arrays in an ASCII response, checking each against its shape.
pub fn parse_ascii(text: &str) -> DapResult<Vec<AsciiArray>> {
    check_error_document(text)?;

    let mut arrays: Vec<AsciiArray> = Vec::new();

    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("Dataset:") || line.chars().all(|c| c == '-') {
            continue;
        }

        if let Some((name, shape)) = parse_header(line) {
            arrays.push(AsciiArray {
                name,
                shape,
                values: Vec::new(),
            });
            continue;
        }

        let current = arrays.last_mut().ok_or_else(|| {
            DapError::parse("ASCII data", format!("values before any header at line {}", line_no + 1))
        })?;

        let body = strip_index_prefix(line);
        for item in body.split(',') {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            let value = parse_value(item).ok_or_else(|| {
                DapError::parse(
                    "ASCII data",
                    format!("invalid number '{}' at line {}", item, line_no + 1),
                )
            })?;
            current.values.push(value);
        }
    }

    for array in &arrays {
        if array.values.len() != array.expected_len() {
            return Err(DapError::ShapeMismatch {
                variable: array.name.clone(),
                expected: array.expected_len(),
                actual: array.values.len(),
            });
        }
    }

    Ok(arrays)
}

/// `name, [d1][d2]...` or `name.member, [d1]`.
fn parse_header(line: &str) -> Option<(String, Vec<usize>)> {
    let (name, rest) = line.split_once(',')?;
    let name = name.trim();
    let starts_ok = name
        .chars()
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_');
    if !starts_ok || name.contains(char::is_whitespace) {
        return None;
    }

    let mut rest = rest.trim();
    if !rest.starts_with('[') {
        return None;
    }

    let mut shape = Vec::new();
    while let Some(stripped) = rest.strip_prefix('[') {
        let (size, tail) = stripped.split_once(']')?;
        shape.push(size.trim().parse::<usize>().ok()?);
        rest = tail.trim_start();
    }
    if !rest.is_empty() {
        return None;
    }

    let short = name.rsplit('.').next().unwrap_or(name).to_string();
    Some((short, shape))
}

/// Drop a leading `[i][j], ` index prefix from a data row.
fn strip_index_prefix(line: &str) -> &str {
    if !line.starts_with('[') {
        return line;
    }
    match line.find(',') {
        Some(pos) => &line[pos + 1..],
        None => "",
    }
}

fn parse_value(item: &str) -> Option<f64> {
    match item.to_ascii_lowercase().as_str() {
        "nan" | "-nan" => Some(f64::NAN),
        _ => item.parse::<f64>().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinates() {
        let text = "time, [2]\n738901.0, 738901.0416666666\nlat, [3]\n0.0, 0.25, 0.5\n";
        let arrays = parse_ascii(text).unwrap();
        assert_eq!(arrays.len(), 2);
        assert_eq!(arrays[0].name, "time");
        assert_eq!(arrays[1].values, vec![0.0, 0.25, 0.5]);
    }

    #[test]
    fn test_parse_grid_with_maps() {
        let text = "\
tmp2m.tmp2m, [1][2][3]
[0][0], 300.1, 300.2, 300.3
[0][1], 301.1, 9.999E20, 301.3

tmp2m.time, [1]
738901.0
tmp2m.lat, [2]
0.0, 0.25
tmp2m.lon, [3]
95.0, 95.25, 95.5
";
        let arrays = parse_ascii(text).unwrap();
        assert_eq!(arrays[0].name, "tmp2m");
        assert_eq!(arrays[0].shape, vec![1, 2, 3]);
        assert_eq!(arrays[0].values[4], 9.999e20);
        assert_eq!(arrays[3].name, "lon");
    }

    #[test]
    fn test_dataset_banner_skipped() {
        let text = "Dataset: gfs_0p25_1hr_00z\n---------------------------------------------\nlon, [2]\n95.0, 95.25\n";
        let arrays = parse_ascii(text).unwrap();
        assert_eq!(arrays[0].values, vec![95.0, 95.25]);
    }

    #[test]
    fn test_short_array_rejected() {
        let err = parse_ascii("lat, [3]\n0.0, 0.25\n").unwrap_err();
        assert!(matches!(err, DapError::ShapeMismatch { expected: 3, actual: 2, .. }));
    }

    #[test]
    fn test_nan_tokens() {
        let arrays = parse_ascii("x, [2]\nNaN, -nan\n").unwrap();
        assert!(arrays[0].values.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_bad_number() {
        assert!(parse_ascii("x, [1]\nabc\n").is_err());
    }
}
