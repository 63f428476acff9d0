//! Assessment metadata embedded in model output.
//!
//! Prompt authors ask the model to append a block like
//!
//! ```text
//! <!-- INSTRUCTOR_METADATA
//! Overall_Score: 2.5
//! Scaffolding_Level: MEDIUM
//! -->
//! ```
//!
//! [`extract`] parses the first such block into a [`Metadata`] map and
//! returns the content with blocks removed; [`strip`] only removes them.
//! Keys are lower-cased with spaces turned into underscores. Values become
//! a float when they contain a `.`, an integer otherwise, and stay text when
//! the number does not parse.

use crate::types::{Metadata, MetadataValue};

/// Opening sentinel of a metadata block.
pub const BEGIN_MARKER: &str = "<!-- INSTRUCTOR_METADATA";
/// Closing sentinel of a metadata block.
pub const END_MARKER: &str = "-->";

/// Result of [`extract`].
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    /// Content with metadata blocks removed and whitespace trimmed, or the
    /// original content untouched when there is no block.
    pub content: String,
    pub metadata: Metadata,
}

/// Byte offsets of a block: `start..end` spans the sentinels, `body` the
/// text between them.
struct Block {
    start: usize,
    body: std::ops::Range<usize>,
    end: usize,
}

fn find_block(raw: &str, from: usize) -> Option<Block> {
    let start = from + raw[from..].find(BEGIN_MARKER)?;
    let body_start = start + BEGIN_MARKER.len();
    let body_end = body_start + raw[body_start..].find(END_MARKER)?;
    Some(Block {
        start,
        body: body_start..body_end,
        end: body_end + END_MARKER.len(),
    })
}

/// Parse the first metadata block and return the visible content.
pub fn extract(raw: &str) -> Extracted {
    match find_block(raw, 0) {
        Some(block) => Extracted {
            content: strip(raw),
            metadata: parse_body(&raw[block.body]),
        },
        None => Extracted {
            content: raw.to_string(),
            metadata: Metadata::new(),
        },
    }
}

/// Remove every metadata block (sentinels included) and trim the result.
///
/// A begin marker without a matching end marker is left in place.
pub fn strip(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut cursor = 0;
    while let Some(block) = find_block(raw, cursor) {
        out.push_str(&raw[cursor..block.start]);
        cursor = block.end;
    }
    out.push_str(&raw[cursor..]);
    out.trim().to_string()
}

/// Render pairs as a metadata block, keys written as given.
pub fn encode<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a MetadataValue)>,
{
    let mut block = String::from(BEGIN_MARKER);
    block.push('\n');
    for (key, value) in pairs {
        block.push_str(key);
        block.push_str(": ");
        block.push_str(&value.to_string());
        block.push('\n');
    }
    block.push_str(END_MARKER);
    block
}

fn parse_body(body: &str) -> Metadata {
    let mut metadata = Metadata::new();
    for line in body.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase().replace(' ', "_");
        metadata.insert(key, coerce(value.trim()));
    }
    metadata
}

fn coerce(value: &str) -> MetadataValue {
    let parsed = if value.contains('.') {
        value.parse::<f64>().ok().map(MetadataValue::Float)
    } else {
        value.parse::<i64>().ok().map(MetadataValue::Int)
    };
    parsed.unwrap_or_else(|| MetadataValue::Text(value.to_string()))
}
