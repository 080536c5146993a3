//! Text-layer extraction from PDF content streams.

use std::collections::HashMap;

use pdf::content::{Op, TextDrawAdjusted};
use pdf::font::ToUnicodeMap;
use pdf::object::{Resolve, Resources};
use pdf::primitive::{Name, PdfString};

/// TJ horizontal adjustments more negative than this read as word gaps.
const TJ_INSERT_SPACE_THRESHOLD: f32 = -200.0;

pub(crate) fn extract(ops: &[Op], resolver: &impl Resolve, resources: &Resources) -> String {
    let mut tounicode_cache: HashMap<Name, Option<ToUnicodeMap>> = HashMap::new();
    let mut current_font: Option<Name> = None;
    let mut pending_space = false;
    let mut out = String::new();

    for op in ops {
        match op {
            Op::TextFont { name, .. } => {
                current_font = Some(name.clone());
            }
            Op::TextDraw { text } => {
                let piece = decode_string(
                    text,
                    current_font.as_ref(),
                    resolver,
                    resources,
                    &mut tounicode_cache,
                );
                push_piece(&mut out, &piece, &mut pending_space);
            }
            Op::TextDrawAdjusted { array } => {
                for item in array {
                    match item {
                        TextDrawAdjusted::Text(text) => {
                            let piece = decode_string(
                                text,
                                current_font.as_ref(),
                                resolver,
                                resources,
                                &mut tounicode_cache,
                            );
                            push_piece(&mut out, &piece, &mut pending_space);
                        }
                        TextDrawAdjusted::Spacing(spacing) => {
                            if *spacing <= TJ_INSERT_SPACE_THRESHOLD {
                                pending_space = true;
                            }
                        }
                    }
                }
            }
            Op::TextNewline => {
                out.push('\n');
                pending_space = false;
            }
            Op::MoveTextPosition { translation } => {
                if translation.y < 0.0 {
                    out.push('\n');
                    pending_space = false;
                }
            }
            _ => {}
        }
    }

    out
}

fn push_piece(out: &mut String, piece: &str, pending_space: &mut bool) {
    let sanitized = sanitize(piece);
    let trimmed = sanitized.trim_matches('\0');
    if trimmed.is_empty() {
        return;
    }

    if *pending_space {
        let first = trimmed.chars().find(|ch| !ch.is_whitespace());
        let punctuation =
            first.is_some_and(|ch| matches!(ch, ',' | '.' | ';' | ':' | '!' | '?' | ')' | ']'));
        if !out.is_empty()
            && !punctuation
            && !out.ends_with([' ', '\n', '\t'])
            && !trimmed.starts_with(char::is_whitespace)
        {
            out.push(' ');
        }
        *pending_space = false;
    }
    out.push_str(trimmed);
}

fn decode_string(
    text: &PdfString,
    font_name: Option<&Name>,
    resolver: &impl Resolve,
    resources: &Resources,
    cache: &mut HashMap<Name, Option<ToUnicodeMap>>,
) -> String {
    let Some(font_name) = font_name else {
        return text.to_string_lossy();
    };

    if !cache.contains_key(font_name) {
        let map = resources
            .fonts
            .get(font_name)
            .and_then(|lazy| lazy.load(resolver).ok())
            .and_then(|font| font.to_unicode(resolver))
            .and_then(|res| res.ok());
        cache.insert(font_name.clone(), map);
    }
    let Some(map) = cache.get(font_name).and_then(|opt| opt.as_ref()) else {
        return text.to_string_lossy();
    };

    decode_with_map(text.as_bytes(), map).unwrap_or_else(|| text.to_string_lossy())
}

/// Tries 1-byte and (for even-length strings) 2-byte codes against the
/// font's ToUnicode map and keeps whichever decodes more of the input.
fn decode_with_map(bytes: &[u8], map: &ToUnicodeMap) -> Option<String> {
    let one = decode_width(bytes, 1, map);
    let mut best = one;

    if bytes.len() % 2 == 0 {
        let two = decode_width(bytes, 2, map);
        if two.1 > best.1 {
            best = two;
        }
    }

    let (decoded, matched, total) = best;
    if total == 0 || (matched as f32 / total as f32) < 0.3 {
        return None;
    }
    Some(decoded)
}

fn decode_width(bytes: &[u8], width: usize, map: &ToUnicodeMap) -> (String, usize, usize) {
    let mut out = String::new();
    let mut matched = 0usize;
    let mut total = 0usize;

    let mut push_code = |code: u16, out: &mut String| {
        total += 1;
        if let Some(s) = map.get(code) {
            out.push_str(s);
            matched += 1;
        } else {
            out.push('\u{FFFD}');
        }
    };

    match width {
        1 => {
            for &b in bytes {
                push_code(b as u16, &mut out);
            }
        }
        2 => {
            for chunk in bytes.chunks_exact(2) {
                push_code(u16::from_be_bytes([chunk[0], chunk[1]]), &mut out);
            }
        }
        _ => return (String::new(), 0, 0),
    }

    (out, matched, total)
}

fn sanitize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\n' | '\t' => out.push(ch),
            '\r' => out.push('\n'),
            '\u{FFFD}' => {}
            _ if ch.is_control() => {}
            _ => {
                let code = ch as u32;
                let private_use = (0xE000..=0xF8FF).contains(&code)
                    || (0xF0000..=0xFFFFD).contains(&code)
                    || (0x100000..=0x10FFFD).contains(&code);
                let noncharacter = (0xFDD0..=0xFDEF).contains(&code)
                    || (code & 0xFFFF == 0xFFFE)
                    || (code & 0xFFFF == 0xFFFF);
                if !private_use && !noncharacter {
                    out.push(ch);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdf::object::NoResolve;

    fn empty_resources() -> Resources {
        Resources {
            graphics_states: HashMap::new(),
            color_spaces: HashMap::new(),
            pattern: HashMap::new(),
            xobjects: HashMap::new(),
            fonts: HashMap::new(),
            properties: HashMap::new(),
        }
    }

    #[test]
    fn adjacent_draws_are_not_spaced() {
        let resources = empty_resources();
        let ops = vec![
            Op::TextDraw {
                text: PdfString::from("fi"),
            },
            Op::TextDraw {
                text: PdfString::from("le"),
            },
        ];
        assert_eq!(extract(&ops, &NoResolve, &resources), "file");
    }

    #[test]
    fn large_tj_spacing_inserts_a_word_gap() {
        let resources = empty_resources();
        let ops = vec![Op::TextDrawAdjusted {
            array: vec![
                TextDrawAdjusted::Text(PdfString::from("Hello")),
                TextDrawAdjusted::Spacing(-300.0),
                TextDrawAdjusted::Text(PdfString::from("world")),
            ],
        }];
        assert_eq!(extract(&ops, &NoResolve, &resources), "Hello world");
    }

    #[test]
    fn small_tj_spacing_is_kerning_not_a_gap() {
        let resources = empty_resources();
        let ops = vec![Op::TextDrawAdjusted {
            array: vec![
                TextDrawAdjusted::Text(PdfString::from("ker")),
                TextDrawAdjusted::Spacing(-50.0),
                TextDrawAdjusted::Text(PdfString::from("ned")),
            ],
        }];
        assert_eq!(extract(&ops, &NoResolve, &resources), "kerned");
    }

    #[test]
    fn newline_ops_break_lines() {
        let resources = empty_resources();
        let ops = vec![
            Op::TextDraw {
                text: PdfString::from("one"),
            },
            Op::TextNewline,
            Op::TextDraw {
                text: PdfString::from("two"),
            },
        ];
        assert_eq!(extract(&ops, &NoResolve, &resources), "one\ntwo");
    }

    #[test]
    fn sanitize_strips_control_and_replacement_chars() {
        assert_eq!(sanitize("a\u{0007}b\u{FFFD}c"), "abc");
        assert_eq!(sanitize("line\r"), "line\n");
    }
}
