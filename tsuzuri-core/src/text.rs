//! Text helpers shared by the validators, the era converter and the assembler.

/// Fold full-width ASCII variants (`０`, `Ｒ`, `／`, ideographic space) and the
/// common dash look-alikes to plain ASCII, then trim.
pub fn normalize_width(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            '\u{3000}' => ' ',
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2212}' | '\u{30FC}' => '-',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// True when `c` is hiragana, katakana (full or half width) or a CJK ideograph.
pub fn is_japanese_char(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{309F}'
        | '\u{30A0}'..='\u{30FF}'
        | '\u{31F0}'..='\u{31FF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{4E00}'..='\u{9FFF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{FF66}'..='\u{FF9F}'
    )
}

pub fn contains_japanese(text: &str) -> bool {
    text.chars().any(is_japanese_char)
}

/// Katakana only (spaces allowed), as expected for name readings.
pub fn is_katakana(text: &str) -> bool {
    let mut seen = false;
    for c in text.chars() {
        match c {
            '\u{30A0}'..='\u{30FF}' | '\u{FF66}'..='\u{FF9F}' => seen = true,
            ' ' | '\u{3000}' => {}
            _ => return false,
        }
    }
    seen
}

/// Escape text for inclusion in a FHIR narrative `<div>`.
pub fn escape_xhtml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap plain text as a FHIR narrative div; line breaks become `<br/>`.
pub fn xhtml_div(text: &str) -> String {
    let body = text
        .lines()
        .map(escape_xhtml)
        .collect::<Vec<_>>()
        .join("<br/>");
    format!(r#"<div xmlns="http://www.w3.org/1999/xhtml">{}</div>"#, body)
}
