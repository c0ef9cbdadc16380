//! Output file naming

use std::fmt;

const UNSAFE_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
const FALLBACK_STEM: &str = "untitled";

/// The file a record is appended to, relative to its source's output directory
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputUnit {
    stem: String,
}

impl OutputUnit {
    /// Builds an output unit from a year, term, column or book id
    pub fn new(name: &str) -> Self {
        Self {
            stem: sanitize(name, None),
        }
    }

    /// Builds an output unit from an article title, keeping at most
    /// `max_chars` characters
    pub fn slug(title: &str, max_chars: usize) -> Self {
        Self {
            stem: sanitize(title, Some(max_chars)),
        }
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn file_name(&self) -> String {
        format!("{}.txt", self.stem)
    }
}

impl fmt::Display for OutputUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

fn sanitize(raw: &str, max_chars: Option<usize>) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !UNSAFE_CHARS.contains(c) && !c.is_control())
        .collect();

    let cleaned = match max_chars {
        Some(max) => cleaned.trim().chars().take(max).collect(),
        None => cleaned,
    };

    // Leading dots hide the file, trailing dots are dropped on some filesystems
    let stem = cleaned.trim().trim_matches('.').trim();
    if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem.to_string()
    }
}
