//! Lightweight line-by-line Markdown model for the text viewer.
//!
//! Deliberately line-local: headers, lists, blockquotes, horizontal rules
//! and inline code. Not a full parser; anything else renders as plain text.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkdownLine<'a> {
    Heading { level: u8, text: &'a str },
    Bullet { text: &'a str },
    Numbered { marker: &'a str, text: &'a str },
    Blockquote { text: &'a str },
    Rule,
    Blank,
    Paragraph { text: &'a str },
}

pub fn classify_line(line: &str) -> MarkdownLine<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return MarkdownLine::Blank;
    }

    if let Some(heading) = parse_heading(trimmed) {
        return heading;
    }

    if is_rule(trimmed) {
        return MarkdownLine::Rule;
    }

    if let Some(text) = trimmed.strip_prefix('>') {
        return MarkdownLine::Blockquote {
            text: text.trim_start(),
        };
    }

    for marker in ["- ", "* ", "+ "] {
        if let Some(text) = trimmed.strip_prefix(marker) {
            return MarkdownLine::Bullet { text };
        }
    }

    if let Some((marker, text)) = parse_numbered(trimmed) {
        return MarkdownLine::Numbered { marker, text };
    }

    MarkdownLine::Paragraph { text: trimmed }
}

/// Splits a line on backtick pairs into `(is_code, segment)` pieces. An
/// unmatched trailing backtick is treated as literal text.
pub fn split_inline_code(text: &str) -> Vec<(bool, &str)> {
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find('`') {
        let Some(close_rel) = rest[open + 1..].find('`') else {
            break;
        };
        let close = open + 1 + close_rel;
        if open > 0 {
            out.push((false, &rest[..open]));
        }
        out.push((true, &rest[open + 1..close]));
        rest = &rest[close + 1..];
    }
    if !rest.is_empty() {
        out.push((false, rest));
    }
    out
}

fn parse_heading(trimmed: &str) -> Option<MarkdownLine<'_>> {
    let hashes = trimmed.bytes().take_while(|&b| b == b'#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &trimmed[hashes..];
    let text = rest.strip_prefix(' ')?;
    Some(MarkdownLine::Heading {
        level: hashes as u8,
        text: text.trim(),
    })
}

fn parse_numbered(trimmed: &str) -> Option<(&str, &str)> {
    let digits = trimmed.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let rest = &trimmed[digits..];
    if let Some(text) = rest.strip_prefix(". ") {
        return Some((&trimmed[..digits + 1], text));
    }
    if let Some(text) = rest.strip_prefix(") ") {
        return Some((&trimmed[..digits + 1], text));
    }
    None
}

fn is_rule(trimmed: &str) -> bool {
    for ch in ['-', '*', '_'] {
        if trimmed.len() >= 3 && trimmed.chars().all(|c| c == ch) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_by_level() {
        assert_eq!(
            classify_line("# Title"),
            MarkdownLine::Heading {
                level: 1,
                text: "Title"
            }
        );
        assert_eq!(
            classify_line("### Deep"),
            MarkdownLine::Heading {
                level: 3,
                text: "Deep"
            }
        );
    }

    #[test]
    fn hashes_without_space_are_not_headings() {
        assert_eq!(
            classify_line("#hashtag"),
            MarkdownLine::Paragraph { text: "#hashtag" }
        );
        assert_eq!(
            classify_line("####### seven"),
            MarkdownLine::Paragraph {
                text: "####### seven"
            }
        );
    }

    #[test]
    fn bullet_and_numbered_lists() {
        assert_eq!(classify_line("- item"), MarkdownLine::Bullet { text: "item" });
        assert_eq!(classify_line("* item"), MarkdownLine::Bullet { text: "item" });
        assert_eq!(
            classify_line("12. item"),
            MarkdownLine::Numbered {
                marker: "12.",
                text: "item"
            }
        );
        assert_eq!(
            classify_line("3) item"),
            MarkdownLine::Numbered {
                marker: "3)",
                text: "item"
            }
        );
    }

    #[test]
    fn blockquote_and_rule() {
        assert_eq!(
            classify_line("> quoted"),
            MarkdownLine::Blockquote { text: "quoted" }
        );
        assert_eq!(classify_line("---"), MarkdownLine::Rule);
        assert_eq!(classify_line("*****"), MarkdownLine::Rule);
        assert_eq!(classify_line("--"), MarkdownLine::Paragraph { text: "--" });
    }

    #[test]
    fn blank_lines() {
        assert_eq!(classify_line(""), MarkdownLine::Blank);
        assert_eq!(classify_line("   "), MarkdownLine::Blank);
    }

    #[test]
    fn inline_code_segments() {
        assert_eq!(
            split_inline_code("use `cargo` to build"),
            vec![(false, "use "), (true, "cargo"), (false, " to build")]
        );
        assert_eq!(split_inline_code("`a``b`"), vec![(true, "a"), (true, "b")]);
    }

    #[test]
    fn unmatched_backtick_stays_literal() {
        assert_eq!(split_inline_code("broken `code"), vec![(false, "broken `code")]);
    }
}
