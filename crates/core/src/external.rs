//! Hosted viewing endpoints for office and otherwise-unrenderable files.
//!
//! The viewer builds a URL embedding the percent-encoded source and hands it
//! to an external opener; no local rendering is attempted for these.

const HOSTED_VIEWER_ENDPOINT: &str = "https://docs.google.com/viewer?embedded=true&url=";
const OFFICE_VIEWER_ENDPOINT: &str = "https://view.officeapps.live.com/op/embed.aspx?src=";

/// Generic hosted document viewer (pdf and "other" fallbacks).
pub fn hosted_viewer_url(source_url: &str) -> String {
    format!("{HOSTED_VIEWER_ENDPOINT}{}", encode_component(source_url))
}

/// Office-document viewer (doc/xls/ppt families).
pub fn office_viewer_url(source_url: &str) -> String {
    format!("{OFFICE_VIEWER_ENDPOINT}{}", encode_component(source_url))
}

/// Percent-encodes a URL query component (RFC 3986 unreserved set kept).
pub fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => {
                out.push('%');
                out.push_str(&format!("{byte:02X}"));
            }
        }
    }
    out
}
