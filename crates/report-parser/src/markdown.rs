//! Line-oriented renderer for the small markdown subset the model writes.
//!
//! Each line is classified on its own: no paragraph joining, no nested
//! lists, no links or code spans. Emphasis is the literal split on `**` with
//! odd-indexed pieces emphasised, so an unmatched `**` leaves the rest of the
//! line emphasised.
// TODO: replace the split-and-alternate emphasis with a tokenizer that only
// emphasises closed `**` pairs once the front-end no longer relies on the
// current output.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const EMPHASIS: &str = "**";

/// Run of text inside a list item or paragraph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Segment {
    pub text: String,
    pub emphasis: bool,
}

impl Segment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emphasis: false,
        }
    }

    pub fn emphasis(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emphasis: true,
        }
    }
}

/// One display block produced from one input line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RenderedBlock {
    Heading { level: u8, text: String },
    ListItem { segments: Vec<Segment> },
    Paragraph { segments: Vec<Segment> },
    Spacer,
}

/// Render every line of `content` into a block.
pub fn render_markdown(content: &str) -> Vec<RenderedBlock> {
    content.split('\n').map(render_line).collect()
}

/// Classify a single line. The first matching rule wins.
pub fn render_line(line: &str) -> RenderedBlock {
    if let Some(text) = line.strip_prefix("### ") {
        return heading(3, text);
    }
    if let Some(text) = line.strip_prefix("## ") {
        return heading(2, text);
    }
    if let Some(text) = line.strip_prefix("# ") {
        return heading(1, text);
    }

    let trimmed = line.trim();
    if let Some(item) = trimmed
        .strip_prefix("* ")
        .or_else(|| trimmed.strip_prefix("- "))
    {
        return RenderedBlock::ListItem {
            segments: split_emphasis(item),
        };
    }

    if line.contains(EMPHASIS) {
        return RenderedBlock::Paragraph {
            segments: split_emphasis(line),
        };
    }

    if trimmed.is_empty() {
        return RenderedBlock::Spacer;
    }

    RenderedBlock::Paragraph {
        segments: vec![Segment::plain(line)],
    }
}

fn heading(level: u8, text: &str) -> RenderedBlock {
    RenderedBlock::Heading {
        level,
        text: text.to_string(),
    }
}

/// Split on `**`; odd-indexed pieces are emphasised. Empty pieces are dropped
/// without shifting the parity of the ones after them.
pub fn split_emphasis(text: &str) -> Vec<Segment> {
    text.split(EMPHASIS)
        .enumerate()
        .filter(|(_, part)| !part.is_empty())
        .map(|(i, part)| {
            if i % 2 == 1 {
                Segment::emphasis(part)
            } else {
                Segment::plain(part)
            }
        })
        .collect()
}
