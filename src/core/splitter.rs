//! Splits a model answer into a formal section and a supplementary section.
//!
//! Answers are asked to end with an informal explanation introduced by a
//! fixed marker. The formal part is meant for copying and printing; the
//! supplementary part explains it in a lighter tone.

/// Heading that introduces the supplementary section.
pub const SUPPLEMENTARY_MARKER: &str = "**Sensei's Anime Corner**";

/// Fallback separator when the marker is absent.
pub const SECTION_DELIMITER: &str = "---";

/// Supplementary text used when the answer has no recognizable split.
pub const MISSING_SUPPLEMENTARY: &str =
    "Sensei is speechless with this complex query! (No specific simplified explanation generated)";

/// A split answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionDocument {
    /// Formal answer
    pub formal: String,
    /// Informal explanation, marker included when present
    pub supplementary: String,
    /// The unsplit answer
    pub raw: String,
}

impl SolutionDocument {
    /// Text for sharing: the raw answer, or both sections when it is empty.
    pub fn share_text(&self) -> String {
        if !self.raw.trim().is_empty() {
            return self.raw.clone();
        }
        format!("{}\n\n{}", self.formal, self.supplementary)
    }

    /// Formal section with markdown emphasis and heading markers removed, for print.
    pub fn printable_formal(&self) -> String {
        self.formal.replace("**", "").replace(['*', '#'], "")
    }
}

/// Strategy for splitting an answer. Never fails.
pub trait ResponseSplitter: Send + Sync {
    fn split(&self, raw: &str) -> SolutionDocument;
}

/// Marker-first splitter with a delimiter fallback.
///
/// 1. If the marker occurs, everything before its first occurrence is formal
///    and the rest, marker included, is supplementary.
/// 2. Otherwise, if the delimiter occurs, the first segment is formal and the
///    remaining segments, rejoined with the delimiter, are supplementary.
/// 3. Otherwise the whole answer is formal and the supplementary section is a
///    fixed placeholder.
///
/// All sections are trimmed.
#[derive(Debug, Clone)]
pub struct MarkerSplitter {
    marker: String,
    delimiter: String,
    placeholder: String,
}

impl Default for MarkerSplitter {
    fn default() -> Self {
        Self {
            marker: SUPPLEMENTARY_MARKER.to_string(),
            delimiter: SECTION_DELIMITER.to_string(),
            placeholder: MISSING_SUPPLEMENTARY.to_string(),
        }
    }
}

impl MarkerSplitter {
    pub fn new(
        marker: impl Into<String>,
        delimiter: impl Into<String>,
        placeholder: impl Into<String>,
    ) -> Self {
        Self {
            marker: marker.into(),
            delimiter: delimiter.into(),
            placeholder: placeholder.into(),
        }
    }
}

impl ResponseSplitter for MarkerSplitter {
    fn split(&self, raw: &str) -> SolutionDocument {
        let (formal, supplementary) = if let Some(idx) = raw.find(self.marker.as_str()) {
            (raw[..idx].trim().to_string(), raw[idx..].trim().to_string())
        } else if let Some((head, tail)) = raw.split_once(self.delimiter.as_str()) {
            (head.trim().to_string(), tail.trim().to_string())
        } else {
            (raw.trim().to_string(), self.placeholder.clone())
        };

        SolutionDocument {
            formal,
            supplementary,
            raw: raw.to_string(),
        }
    }
}
