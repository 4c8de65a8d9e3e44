//! Caption documents: ASS for burning into video, SRT as a sidecar.

use std::fmt::Write as _;

use studycast_models::timestamp::{format_ass_timestamp, format_srt_timestamp};
use studycast_models::CaptionChunk;

/// Visual style of burned-in captions.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionStyle {
    pub font_name: String,
    /// Font size in output pixels
    pub font_size: u32,
    pub bold: bool,
    /// Fill colour as RGB
    pub primary_rgb: [u8; 3],
    /// Outline colour as RGB
    pub outline_rgb: [u8; 3],
    /// Outline width in pixels
    pub outline_width: u32,
    /// Share of the frame width text may occupy before wrapping
    pub width_fraction: f64,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_name: "Arial".to_string(),
            font_size: 80,
            bold: true,
            primary_rgb: [255, 255, 255],
            outline_rgb: [255, 0, 0],
            outline_width: 4,
            width_fraction: 0.8,
        }
    }
}

impl CaptionStyle {
    /// Horizontal margin that confines text to `width_fraction` of the frame.
    fn side_margin(&self, frame_width: u32) -> u32 {
        let fraction = self.width_fraction.clamp(0.1, 1.0);
        ((1.0 - fraction) / 2.0 * frame_width as f64).round() as u32
    }
}

/// ASS colours are `&HAABBGGRR` with alpha 00 meaning opaque.
fn ass_colour([r, g, b]: [u8; 3]) -> String {
    format!("&H00{:02X}{:02X}{:02X}", b, g, r)
}

/// Make caption text inert for libass: no override blocks or escapes.
fn escape_ass_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '{' => out.push('('),
            '}' => out.push(')'),
            // A word joiner after the backslash breaks \N, \n and \h sequences
            '\\' => out.push_str("\\\u{2060}"),
            '\r' | '\n' => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

/// Build an ASS subtitle document with one centered event per chunk.
///
/// `frame` is the output resolution; sizes in `style` are interpreted in
/// that pixel space.
pub fn build_ass(chunks: &[CaptionChunk], style: &CaptionStyle, frame: (u32, u32)) -> String {
    let (width, height) = frame;
    let margin = style.side_margin(width);
    let bold = if style.bold { -1 } else { 0 };

    let mut doc = String::new();
    doc.push_str("[Script Info]\n");
    doc.push_str("ScriptType: v4.00+\n");
    let _ = writeln!(doc, "PlayResX: {}", width);
    let _ = writeln!(doc, "PlayResY: {}", height);
    doc.push_str("WrapStyle: 0\n");
    doc.push_str("ScaledBorderAndShadow: yes\n\n");

    doc.push_str("[V4+ Styles]\n");
    doc.push_str(
        "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, \
         BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, \
         BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n",
    );
    // Alignment 5 is the middle-center numpad position
    let _ = writeln!(
        doc,
        "Style: Caption,{},{},{},{},{},&H00000000,{},0,0,0,100,100,0,0,1,{},0,5,{},{},0,1",
        style.font_name,
        style.font_size,
        ass_colour(style.primary_rgb),
        ass_colour(style.primary_rgb),
        ass_colour(style.outline_rgb),
        bold,
        style.outline_width,
        margin,
        margin,
    );
    doc.push('\n');

    doc.push_str("[Events]\n");
    doc.push_str("Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n");
    for chunk in chunks {
        let _ = writeln!(
            doc,
            "Dialogue: 0,{},{},Caption,,0,0,0,,{}",
            format_ass_timestamp(chunk.start),
            format_ass_timestamp(chunk.end),
            escape_ass_text(&chunk.text),
        );
    }

    doc
}

/// Build an SRT document, numbering cues from 1.
pub fn build_srt(chunks: &[CaptionChunk]) -> String {
    let mut doc = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        let _ = write!(
            doc,
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_srt_timestamp(chunk.start),
            format_srt_timestamp(chunk.end),
            chunk.text.trim(),
        );
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks() -> Vec<CaptionChunk> {
        vec![
            CaptionChunk {
                start: 0.0,
                end: 2.5,
                text: "one two three four five".into(),
            },
            CaptionChunk {
                start: 2.5,
                end: 5.0,
                text: "six seven".into(),
            },
        ]
    }

    #[test]
    fn test_srt_document() {
        let srt = build_srt(&chunks());
        assert_eq!(
            srt,
            "1\n00:00:00,000 --> 00:00:02,500\none two three four five\n\n\
             2\n00:00:02,500 --> 00:00:05,000\nsix seven\n\n"
        );
    }

    #[test]
    fn test_ass_style_and_events() {
        let ass = build_ass(&chunks(), &CaptionStyle::default(), (1080, 1920));
        assert!(ass.contains("PlayResX: 1080"));
        // White fill, red outline, bold, outline 4, centered, 10% side margins
        assert!(ass.contains(
            "Style: Caption,Arial,80,&H00FFFFFF,&H00FFFFFF,&H000000FF,&H00000000,-1,0,0,0,100,100,0,0,1,4,0,5,108,108,0,1"
        ));
        assert!(ass.contains("Dialogue: 0,0:00:00.00,0:00:02.50,Caption,,0,0,0,,one two three four five"));
        assert!(ass.contains("Dialogue: 0,0:00:02.50,0:00:05.00,Caption,,0,0,0,,six seven"));
    }

    #[test]
    fn test_ass_text_cannot_inject_overrides() {
        assert_eq!(escape_ass_text("{\\b1}bold"), "(\\\u{2060}b1)bold");
        assert_eq!(escape_ass_text("line\nbreak"), "line break");
    }
}
