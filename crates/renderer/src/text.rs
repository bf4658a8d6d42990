//! TrueType text drawing on the final RGBA image.
//!
//! No font ships with the crate. Without a configured font every drawing
//! call is a no-op, so a map still renders, just without text.

use std::path::Path;

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use rusttype::{Font, Scale};

use crate::error::{RenderError, RenderResult};
use crate::gradient::Color;

/// Horizontal alignment relative to the anchor x.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

pub struct TextPainter {
    font: Option<Font<'static>>,
}

impl TextPainter {
    pub fn without_font() -> Self {
        Self { font: None }
    }

    pub fn load(path: &Path) -> RenderResult<Self> {
        let bytes = std::fs::read(path).map_err(|source| RenderError::FontRead {
            path: path.to_path_buf(),
            source,
        })?;
        let font = Font::try_from_vec(bytes).ok_or_else(|| RenderError::FontInvalid(path.to_path_buf()))?;
        Ok(Self { font: Some(font) })
    }

    pub fn from_config(path: Option<&Path>) -> RenderResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::without_font()),
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Rendered width and height in pixels, `(0, 0)` without a font.
    pub fn measure(&self, text: &str, size: f32) -> (u32, u32) {
        match &self.font {
            Some(font) => {
                let (w, h) = text_size(Scale::uniform(size), font, text);
                (w.max(0) as u32, h.max(0) as u32)
            }
            None => (0, 0),
        }
    }

    /// Draws `text` with its top edge at `y`; returns whether anything was drawn.
    pub fn draw(&self, img: &mut RgbaImage, text: &str, x: i32, y: i32, size: f32, color: Color, align: Align) -> bool {
        let Some(font) = &self.font else {
            return false;
        };
        if text.is_empty() {
            return false;
        }
        let (w, _) = self.measure(text, size);
        let x = match align {
            Align::Left => x,
            Align::Center => x - w as i32 / 2,
            Align::Right => x - w as i32,
        };
        draw_text_mut(img, Rgba(color.to_rgba()), x, y, Scale::uniform(size), font, text);
        true
    }

    /// Heavier weight by overdrawing one pixel to the right.
    pub fn draw_bold(&self, img: &mut RgbaImage, text: &str, x: i32, y: i32, size: f32, color: Color, align: Align) -> bool {
        let drawn = self.draw(img, text, x, y, size, color, align);
        if drawn {
            self.draw(img, text, x + 1, y, size, color, align);
        }
        drawn
    }

    /// Text centred on `(cx, cy)` over a filled box, for inline labels.
    pub fn draw_boxed(&self, img: &mut RgbaImage, text: &str, cx: i32, cy: i32, size: f32, color: Color, background: Color) -> bool {
        if !self.has_font() {
            return false;
        }
        let (w, h) = self.measure(text, size);
        let pad = 2;
        let rect = Rect::at(cx - w as i32 / 2 - pad, cy - h as i32 / 2 - pad).of_size(w + 2 * pad as u32, h + 2 * pad as u32);
        draw_filled_rect_mut(img, rect, Rgba(background.to_rgba()));
        self.draw(img, text, cx, cy - h as i32 / 2, size, color, Align::Center)
    }
}

impl std::fmt::Debug for TextPainter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextPainter").field("has_font", &self.has_font()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_font_draws_nothing() {
        let painter = TextPainter::without_font();
        let mut img = RgbaImage::from_pixel(20, 20, Rgba([255, 255, 255, 255]));
        assert!(!painter.draw(&mut img, "1010", 0, 0, 12.0, Color::BLACK, Align::Left));
        assert!(!painter.draw_boxed(&mut img, "1010", 10, 10, 12.0, Color::BLACK, Color::LIGHT_GRAY));
        assert!(img.pixels().all(|p| p.0 == [255, 255, 255, 255]));
        assert_eq!(painter.measure("1010", 12.0), (0, 0));
    }

    #[test]
    fn test_missing_font_file() {
        let err = TextPainter::load(Path::new("/definitely/not/here.ttf")).unwrap_err();
        assert!(matches!(err, RenderError::FontRead { .. }));
    }

    #[test]
    fn test_garbage_font_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        assert!(matches!(TextPainter::load(&path), Err(RenderError::FontInvalid(_))));
    }
}
