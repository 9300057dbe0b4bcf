//! Allow-list sanitizer for untrusted SVG markup.
//!
//! Only the elements and attributes listed below survive. A rejected element
//! is dropped together with its whole subtree, so `<script>` bodies and
//! `<foreignObject>` payloads never reach the output. Comments, processing
//! instructions and DOCTYPE declarations are discarded.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

const ROOT_ELEMENT: &str = "svg";

const ALLOWED_ELEMENTS: &[&str] = &[
    "svg",
    "g",
    "defs",
    "title",
    "desc",
    "circle",
    "ellipse",
    "rect",
    "line",
    "polyline",
    "polygon",
    "path",
    "text",
    "tspan",
    "linearGradient",
    "radialGradient",
    "stop",
];

const ALLOWED_ATTRIBUTES: &[&str] = &[
    "xmlns",
    "version",
    "id",
    "class",
    "width",
    "height",
    "viewBox",
    "preserveAspectRatio",
    "x",
    "y",
    "x1",
    "y1",
    "x2",
    "y2",
    "cx",
    "cy",
    "r",
    "rx",
    "ry",
    "d",
    "points",
    "dx",
    "dy",
    "fill",
    "fill-opacity",
    "fill-rule",
    "stroke",
    "stroke-width",
    "stroke-opacity",
    "stroke-linecap",
    "stroke-linejoin",
    "opacity",
    "transform",
    "style",
    "font-family",
    "font-size",
    "font-weight",
    "font-style",
    "text-anchor",
    "dominant-baseline",
    "alignment-baseline",
    "offset",
    "stop-color",
    "stop-opacity",
    "gradientUnits",
    "gradientTransform",
];

const FORBIDDEN_VALUE_FRAGMENTS: &[&str] =
    &["javascript:", "vbscript:", "data:", "expression(", "@import", "behavior:"];

/// Returns a well-formed SVG document containing only allow-listed markup.
///
/// Never fails: markup that cannot be parsed is truncated at the first error
/// and any elements still open are closed, which in the worst case yields an
/// empty string.
pub fn sanitize_svg(input: &str) -> String {
    sanitize(input).unwrap_or_default()
}

fn sanitize(input: &str) -> Option<String> {
    let mut reader = Reader::from_str(input);
    let mut writer = Writer::new(Vec::new());
    let mut open: Vec<String> = Vec::new();
    let mut skipped_depth = 0usize;
    let mut root_seen = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                if skipped_depth > 0 {
                    skipped_depth += 1;
                    continue;
                }
                match clean_element(&element, open.is_empty(), root_seen) {
                    Some((name, clean)) => {
                        writer.write_event(Event::Start(clean)).ok()?;
                        open.push(name);
                        root_seen = true;
                    }
                    None => skipped_depth = 1,
                }
            }
            Ok(Event::Empty(element)) => {
                if skipped_depth > 0 {
                    continue;
                }
                if let Some((_, clean)) = clean_element(&element, open.is_empty(), root_seen) {
                    writer.write_event(Event::Empty(clean)).ok()?;
                    root_seen = true;
                }
            }
            Ok(Event::End(_)) => {
                if skipped_depth > 0 {
                    skipped_depth -= 1;
                    continue;
                }
                if let Some(name) = open.pop() {
                    writer.write_event(Event::End(BytesEnd::new(name))).ok()?;
                }
            }
            Ok(Event::Text(text)) => {
                if skipped_depth > 0 || open.is_empty() {
                    continue;
                }
                // Undeclared entities fail to unescape; the text node is dropped.
                if let Ok(content) = text.unescape() {
                    writer.write_event(Event::Text(BytesText::new(&content))).ok()?;
                }
            }
            Ok(Event::CData(data)) => {
                if skipped_depth > 0 || open.is_empty() {
                    continue;
                }
                let content = String::from_utf8_lossy(&data.into_inner()).into_owned();
                writer.write_event(Event::Text(BytesText::new(&content))).ok()?;
            }
            Ok(Event::Eof) | Err(_) => break,
            Ok(_) => {}
        }
    }

    while let Some(name) = open.pop() {
        writer.write_event(Event::End(BytesEnd::new(name))).ok()?;
    }

    String::from_utf8(writer.into_inner()).ok()
}

fn clean_element(
    element: &BytesStart<'_>,
    at_top_level: bool,
    root_seen: bool,
) -> Option<(String, BytesStart<'static>)> {
    let name = std::str::from_utf8(element.name().as_ref()).ok()?.to_string();
    if at_top_level && (name != ROOT_ELEMENT || root_seen) {
        return None;
    }
    if !ALLOWED_ELEMENTS.contains(&name.as_str()) {
        return None;
    }

    let mut clean = BytesStart::new(name.clone());
    for attribute in element.attributes().flatten() {
        let Ok(key) = std::str::from_utf8(attribute.key.as_ref()) else {
            continue;
        };
        if !ALLOWED_ATTRIBUTES.contains(&key) {
            continue;
        }
        let Ok(value) = attribute.unescape_value() else {
            continue;
        };
        if is_safe_value(&value) {
            clean.push_attribute((key, value.as_ref()));
        }
    }

    Some((name, clean))
}

/// Rejects values that could execute script or pull in an external resource.
/// Local fragment references such as `url(#gradient)` are kept.
fn is_safe_value(value: &str) -> bool {
    let normalized: String = value
        .chars()
        .filter(|ch| !ch.is_whitespace() && !ch.is_control())
        .flat_map(char::to_lowercase)
        .collect();

    if FORBIDDEN_VALUE_FRAGMENTS.iter().any(|fragment| normalized.contains(fragment)) {
        return false;
    }

    normalized.match_indices("url(").all(|(index, matched)| {
        normalized[index + matched.len()..].trim_start_matches(['\'', '"']).starts_with('#')
    })
}
