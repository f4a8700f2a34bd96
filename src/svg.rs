//! The ellipse-only SVG dialect: writing it and parsing it back into a
//! compact sequence.
//!
//! Vectorizers emit documents of this exact shape:
//!
//! ```text
//! <svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="1024" height="768">
//! <rect x="0" y="0" width="1024" height="768" fill="#7a7b73" />
//! <g transform="scale(4) translate(0.5 0.5)">
//! <ellipse fill="#ffffff" fill-opacity="0.501961" cx="12" cy="34" rx="5" ry="6" />
//! ...
//! </g>
//! </svg>
//! ```
//!
//! The front-end does not need the markup, only the primitives, so each
//! ellipse is reduced to one comma-joined string:
//!
//! ```text
//! #ffffff,0.502,12,34,5,6
//! fill  opacity cx cy rx ry
//! ```
//!
//! Opacity is rounded to three decimals; every other field keeps the exact
//! text found in the document. The declared `width`/`height` are kept as
//! strings for the same reason.
//!
//! Parsing is deliberately narrow. The root `width="…" height="…"` pair must
//! appear, in that order, before the first ellipse, and every ellipse must
//! carry exactly the six attributes above in that order. Anything else is a
//! [`SvgParseError`] for that one document.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use thiserror::Error;

const ELLIPSE_OPEN: &str = "<ellipse ";
const STRIPPED_TOKENS: [&str; 3] = ["/>", "</g>", "</svg>"];
const ELLIPSE_ATTRIBUTES: [&str; 6] = ["fill", "fill-opacity", "cx", "cy", "rx", "ry"];

#[derive(Error, Debug, PartialEq)]
pub enum SvgParseError {
    #[error("no width/height pair before the first ellipse")]
    MissingDimensions,
    #[error("declared {attribute} is not a number: {value:?}")]
    InvalidDimension { attribute: &'static str, value: String },
    #[error("ellipse {index}: malformed attributes: {reason}")]
    Malformed { index: usize, reason: String },
    #[error("ellipse {index}: expected 6 attributes, found {found}")]
    Arity { index: usize, found: usize },
    #[error("ellipse {index}: expected attribute '{expected}', found '{found}'")]
    UnexpectedAttribute {
        index: usize,
        expected: &'static str,
        found: String,
    },
    #[error("ellipse {index}: {attribute} is not a number: {value:?}")]
    InvalidNumber {
        index: usize,
        attribute: &'static str,
        value: String,
    },
}

/// Primitives extracted from one SVG document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SvgSequence {
    pub width: String,
    pub height: String,
    pub sequence: Vec<String>,
}

/// Parse an ellipse-only SVG document into its declared size and primitive sequence.
pub fn parse_svg_sequence(text: &str) -> Result<SvgSequence, SvgParseError> {
    let mut segments = text.split(ELLIPSE_OPEN);
    let front_matter = segments.next().unwrap_or_default();
    let (width, height) = parse_dimensions(front_matter)?;

    let sequence = segments
        .enumerate()
        .map(|(index, segment)| parse_ellipse(index, segment))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SvgSequence {
        width,
        height,
        sequence,
    })
}

fn parse_dimensions(front_matter: &str) -> Result<(String, String), SvgParseError> {
    let (_, after_width) = front_matter
        .split_once("width=\"")
        .ok_or(SvgParseError::MissingDimensions)?;
    let (width, after_height) = after_width
        .split_once("\" height=\"")
        .ok_or(SvgParseError::MissingDimensions)?;
    let (height, _) = after_height
        .split_once("\">")
        .ok_or(SvgParseError::MissingDimensions)?;

    for (attribute, value) in [("width", width), ("height", height)] {
        if !value.parse::<f64>().is_ok_and(f64::is_finite) {
            return Err(SvgParseError::InvalidDimension {
                attribute,
                value: value.to_string(),
            });
        }
    }

    Ok((width.to_string(), height.to_string()))
}

fn parse_ellipse(index: usize, segment: &str) -> Result<String, SvgParseError> {
    let mut body = segment.to_string();
    for token in STRIPPED_TOKENS {
        body = body.replace(token, "");
    }

    let attributes =
        parse_attributes(body.trim()).map_err(|reason| SvgParseError::Malformed { index, reason })?;
    if attributes.len() != ELLIPSE_ATTRIBUTES.len() {
        return Err(SvgParseError::Arity {
            index,
            found: attributes.len(),
        });
    }
    for ((name, _), expected) in attributes.iter().zip(ELLIPSE_ATTRIBUTES) {
        if *name != expected {
            return Err(SvgParseError::UnexpectedAttribute {
                index,
                expected,
                found: name.to_string(),
            });
        }
    }

    let fill = attributes[0].1;
    if fill.is_empty() {
        return Err(SvgParseError::Malformed {
            index,
            reason: "empty fill".into(),
        });
    }
    let opacity = format_opacity(attributes[1].1).ok_or_else(|| SvgParseError::InvalidNumber {
        index,
        attribute: "fill-opacity",
        value: attributes[1].1.to_string(),
    })?;
    for (&attribute, &(_, value)) in ELLIPSE_ATTRIBUTES.iter().zip(&attributes).skip(2) {
        if value.parse::<f64>().is_err() {
            return Err(SvgParseError::InvalidNumber {
                index,
                attribute,
                value: value.to_string(),
            });
        }
    }

    Ok(format!(
        "{},{},{},{},{},{}",
        fill, opacity, attributes[2].1, attributes[3].1, attributes[4].1, attributes[5].1
    ))
}

/// Split `name="value" name="value" …` into pairs, in order.
fn parse_attributes(body: &str) -> Result<Vec<(&str, &str)>, String> {
    let mut pairs = Vec::new();
    let mut rest = body;
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return Ok(pairs);
        }
        let (name, after_name) = rest
            .split_once('=')
            .ok_or_else(|| format!("expected name=\"value\" at {rest:?}"))?;
        let name = name.trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(format!("bad attribute name {name:?}"));
        }
        let after_quote = after_name
            .strip_prefix('"')
            .ok_or_else(|| format!("unquoted value for {name}"))?;
        let (value, remaining) = after_quote
            .split_once('"')
            .ok_or_else(|| format!("unterminated value for {name}"))?;
        pairs.push((name, value));
        rest = remaining;
    }
}

/// Round an opacity string to exactly three decimals.
fn format_opacity(raw: &str) -> Option<String> {
    let value: f64 = raw.trim().parse().ok()?;
    value.is_finite().then(|| round_thousandths(value))
}

/// Three decimals, with exact ties going to the larger magnitude
/// (`0.0625` → `0.063`, where `{:.3}` gives `0.062`).
fn round_thousandths(value: f64) -> String {
    // Any value with a 5 in the fourth decimal place has an exact binary
    // expansion well within 70 digits.
    let exact = format!("{:.70}", value.abs());
    let Some((whole, fraction)) = exact.split_once('.') else {
        return format!("{value:.3}");
    };
    let tie = fraction.get(3..4) == Some("5") && fraction[4..].bytes().all(|b| b == b'0');
    let thousandths = whole
        .parse::<u64>()
        .ok()
        .zip(fraction[..3].parse::<u64>().ok())
        .map(|(w, f)| w * 1000 + f + 1);
    match thousandths {
        Some(n) if tie => {
            let sign = if value < 0.0 { "-" } else { "" };
            format!("{sign}{}.{:03}", n / 1000, n % 1000)
        }
        _ => format!("{value:.3}"),
    }
}

/// One filled ellipse, in the vectorizer's working coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Ellipse {
    pub fill: String,
    pub opacity: f64,
    pub cx: f64,
    pub cy: f64,
    pub rx: f64,
    pub ry: f64,
}

/// Render a document in the ellipse-only dialect.
///
/// `width`/`height` are the declared output size; `scale` maps working
/// coordinates onto it.
pub fn write_document(
    width: u32,
    height: u32,
    background: &str,
    scale: f64,
    ellipses: &[Ellipse],
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="{width}" height="{height}">"#
    );
    let _ = writeln!(
        out,
        r#"<rect x="0" y="0" width="{width}" height="{height}" fill="{background}" />"#
    );
    let _ = writeln!(out, r#"<g transform="scale({scale}) translate(0.5 0.5)">"#);
    for e in ellipses {
        let _ = writeln!(
            out,
            r#"<ellipse fill="{}" fill-opacity="{}" cx="{}" cy="{}" rx="{}" ry="{}" />"#,
            e.fill, e.opacity, e.cx, e.cy, e.rx, e.ry
        );
    }
    out.push_str("</g>\n</svg>\n");
    out
}
