//! OSGT scene-tree parser
//!
//! OSGT files are line-oriented, brace-delimited nested layout data:
//!
//! ```text
//! VertexData {
//!   Array TRUE ArrayID 24 Vec3fArray 4 {
//!     531.011 -266 300
//!     ...
//!   }
//!   Indices FALSE
//! }
//! ```
//!
//! Each line is either a leaf key, the start of a nested block (`key {`),
//! or the end of the current block (`}`). The parser keeps keys verbatim
//! after trimming; payload lines such as vertex coordinates are leaf keys
//! too, and are interpreted downstream by the scene converter.

use super::ParseError;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// One entry of a scene tree level: a key plus an optional owned subtree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsgtEntry {
    /// Trimmed line content, brace removed for block openers
    pub key: String,
    /// Nested block, when the line opened one
    pub child: Option<Osgt>,
}

/// A parsed OSGT level: an ordered list of entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Osgt {
    /// Entries in file order
    pub entries: Vec<OsgtEntry>,
}

impl Osgt {
    /// Parse OSGT text from a buffered reader
    ///
    /// A read error at any depth aborts the whole parse.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, ParseError> {
        let mut lines = reader.lines();
        scan_level(&mut lines)
    }

    /// Parse an OSGT file from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ParseError> {
        let file = File::open(path.as_ref())?;
        Self::parse(BufReader::new(file))
    }

    /// Collect, depth-first, every child subtree whose key contains `pattern`
    ///
    /// Matching branches are returned as-is and not searched further;
    /// non-matching branches are descended into.
    pub fn find(&self, pattern: &str) -> Vec<&Osgt> {
        let mut found = Vec::new();
        for entry in &self.entries {
            if let Some(child) = &entry.child {
                if entry.key.contains(pattern) {
                    found.push(child);
                } else {
                    found.extend(child.find(pattern));
                }
            }
        }
        found
    }

    /// Find the first key containing `pattern`
    ///
    /// All sibling keys at a level are checked before descending into any
    /// child, so a shallow match always wins over a deeper one.
    pub fn find_key(&self, pattern: &str) -> Option<&str> {
        for entry in &self.entries {
            if entry.key.contains(pattern) {
                return Some(&entry.key);
            }
        }
        for entry in &self.entries {
            if let Some(child) = &entry.child {
                if let Some(key) = child.find_key(pattern) {
                    return Some(key);
                }
            }
        }
        None
    }

    /// Render the tree as indented `[key]` lines, two spaces per depth
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        self.pretty_indent(&mut out, "");
        out
    }

    fn pretty_indent(&self, out: &mut String, indent: &str) {
        for entry in &self.entries {
            out.push_str(indent);
            out.push('[');
            out.push_str(&entry.key);
            out.push_str("]\n");
            if let Some(child) = &entry.child {
                child.pretty_indent(out, &format!("{indent}  "));
            }
        }
    }
}

fn scan_level<R: BufRead>(lines: &mut Lines<R>) -> Result<Osgt, ParseError> {
    let mut level = Osgt::default();
    while let Some(line) = lines.next() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.contains('}') {
            return Ok(level);
        }
        let mut child = None;
        let key = if trimmed.contains('{') {
            let stripped = trimmed.replacen('{', "", 1);
            child = Some(scan_level(lines)?);
            stripped.trim().to_string()
        } else {
            trimmed.to_string()
        };
        level.entries.push(OsgtEntry { key, child });
    }
    Ok(level)
}
