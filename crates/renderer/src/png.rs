//! PNG encoding for rendered maps.
//!
//! Writes 8-bit RGBA images with optional `tEXt` metadata chunks. Only the
//! chunks needed here are produced: IHDR, tEXt, IDAT and IEND.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{RenderError, RenderResult};

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Encodes straight (non-premultiplied) RGBA pixels.
///
/// `text` entries become `tEXt` chunks; keywords must be 1 to 79 printable
/// Latin-1 characters, and text characters outside Latin-1 become `?`.
pub fn encode_rgba(pixels: &[u8], width: u32, height: u32, text: &[(&str, &str)]) -> RenderResult<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidCanvas { width, height });
    }
    let stride = width as usize * 4;
    let expected = stride * height as usize;
    if pixels.len() != expected {
        return Err(RenderError::encode(format!(
            "expected {} bytes of RGBA data for {}x{}, got {}",
            expected,
            width,
            height,
            pixels.len()
        )));
    }

    let mut png = Vec::with_capacity(expected / 4 + 1024);
    png.extend_from_slice(&SIGNATURE);

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    // Bit depth 8, colour type 6 (RGBA), deflate, adaptive filtering, no interlace.
    ihdr.extend_from_slice(&[8, 6, 0, 0, 0]);
    write_chunk(&mut png, b"IHDR", &ihdr);

    for (keyword, value) in text {
        write_chunk(&mut png, b"tEXt", &text_payload(keyword, value)?);
    }

    write_chunk(&mut png, b"IDAT", &compress_scanlines(pixels, stride)?);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Reads back the `tEXt` chunks of an encoded PNG, in file order.
pub fn text_chunks(png: &[u8]) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let Some(mut rest) = png.strip_prefix(&SIGNATURE[..]) else {
        return out;
    };

    while rest.len() >= 12 {
        let len = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
        let Some(data) = rest.get(8..8 + len) else {
            break;
        };
        if &rest[4..8] == b"tEXt" {
            if let Some(nul) = data.iter().position(|b| *b == 0) {
                let latin1 = |bytes: &[u8]| bytes.iter().map(|b| char::from(*b)).collect::<String>();
                out.push((latin1(&data[..nul]), latin1(&data[nul + 1..])));
            }
        }
        rest = rest.get(12 + len..).unwrap_or_default();
    }

    out
}

fn text_payload(keyword: &str, text: &str) -> RenderResult<Vec<u8>> {
    let printable = keyword.chars().all(|c| (' '..='~').contains(&c));
    if keyword.is_empty() || keyword.len() > 79 || !printable {
        return Err(RenderError::encode(format!("invalid tEXt keyword {:?}", keyword)));
    }

    let mut data = Vec::with_capacity(keyword.len() + 1 + text.len());
    data.extend_from_slice(keyword.as_bytes());
    data.push(0);
    data.extend(
        text.chars()
            .map(|c| u8::try_from(u32::from(c)).ok().filter(|b| *b != 0).unwrap_or(b'?')),
    );
    Ok(data)
}

/// Filter byte 0 (none) per row, then zlib.
fn compress_scanlines(pixels: &[u8], stride: usize) -> RenderResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(pixels.len() / 4), Compression::default());
    for row in pixels.chunks_exact(stride) {
        encoder
            .write_all(&[0])
            .and_then(|_| encoder.write_all(row))
            .map_err(|e| RenderError::encode(e.to_string()))?;
    }
    encoder.finish().map_err(|e| RenderError::encode(e.to_string()))
}

fn write_chunk(png: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    let body = png.len();
    png.extend_from_slice(kind);
    png.extend_from_slice(data);
    let crc = crc32fast::hash(&png[body..]);
    png.extend_from_slice(&crc.to_be_bytes());
}
