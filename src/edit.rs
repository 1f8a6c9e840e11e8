use std::fs;
use std::io::Write;
use std::ops::Range;
use std::path::Path;
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// The fundamental rewrite primitive: byte-span replacement with verification.
///
/// Every rewrite rule (import normalization, renames, removals, body
/// replacement) compiles down to this one primitive. Intelligence lives in
/// span acquisition, not in application.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Edit does nothing until it is applied through an EditSet"]
pub struct Edit {
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// New text to insert at [byte_start, byte_end)
    pub new_text: String,
    /// Verification of what we expect to find before applying
    pub expected_before: EditVerification,
}

/// Verification strategy for edit safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (faster for large spans)
    Hash(u64),
}

impl EditVerification {
    /// Check if the provided text matches the verification criteria.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("before-text verification failed at {byte_start}..{byte_end}: found {found:?}")]
    BeforeTextMismatch {
        byte_start: usize,
        byte_end: usize,
        found: String,
    },

    #[error("invalid byte range: [{byte_start}, {byte_end}) in text of length {len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        len: usize,
    },

    #[error("conflicting edits: {first:?} partially overlaps {second:?}")]
    Overlap {
        first: Range<usize>,
        second: Range<usize>,
    },

    #[error("edit boundary at byte {0} splits a UTF-8 character")]
    InvalidUtf8Edit(usize),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Edit {
    /// Create an edit replacing `source[byte_start..byte_end]`, capturing the
    /// current text for verification.
    pub fn new(source: &str, byte_start: usize, byte_end: usize, new_text: impl Into<String>) -> Self {
        let before = source.get(byte_start..byte_end).unwrap_or_default();
        Self {
            byte_start,
            byte_end,
            new_text: new_text.into(),
            expected_before: EditVerification::from_text(before),
        }
    }

    /// Create an edit with an explicit verification strategy.
    pub fn with_verification(
        byte_start: usize,
        byte_end: usize,
        new_text: impl Into<String>,
        verification: EditVerification,
    ) -> Self {
        Self {
            byte_start,
            byte_end,
            new_text: new_text.into(),
            expected_before: verification,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.byte_start..self.byte_end
    }

    /// Check the edit against the text it is about to be applied to.
    fn validate(&self, source: &str) -> Result<(), EditError> {
        if self.byte_start > self.byte_end || self.byte_end > source.len() {
            return Err(EditError::InvalidByteRange {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                len: source.len(),
            });
        }
        for at in [self.byte_start, self.byte_end] {
            if !source.is_char_boundary(at) {
                return Err(EditError::InvalidUtf8Edit(at));
            }
        }
        let current = &source[self.byte_start..self.byte_end];
        if !self.expected_before.matches(current) {
            return Err(EditError::BeforeTextMismatch {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                found: current.to_string(),
            });
        }
        Ok(())
    }
}

/// An ordered collection of edits against one source text.
///
/// Edits nested inside another edit's span are subsumed by the outer edit
/// (a removed function takes its inner renames with it). Partially
/// overlapping spans are a conflict. When two edits cover the same span the
/// one pushed first wins.
#[derive(Debug, Clone, Default)]
pub struct EditSet {
    edits: Vec<Edit>,
}

impl EditSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edit> {
        self.edits.iter()
    }

    /// Render `source[range]` with every edit inside `range` applied.
    pub fn render(&self, source: &str, range: Range<usize>) -> Result<String, EditError> {
        if range.start > range.end || range.end > source.len() {
            return Err(EditError::InvalidByteRange {
                byte_start: range.start,
                byte_end: range.end,
                len: source.len(),
            });
        }

        let mut inside: Vec<(usize, &Edit)> = self
            .edits
            .iter()
            .enumerate()
            .filter(|(_, e)| e.byte_start >= range.start && e.byte_end <= range.end)
            .collect();
        // Ascending start, wider span first, then push order
        inside.sort_by(|(ia, a), (ib, b)| {
            a.byte_start
                .cmp(&b.byte_start)
                .then(b.byte_end.cmp(&a.byte_end))
                .then(ia.cmp(ib))
        });

        let mut out = String::with_capacity(range.end - range.start);
        let mut cursor = range.start;
        let mut last: Option<&Edit> = None;

        for (_, edit) in inside {
            edit.validate(source)?;
            if let Some(prev) = last {
                if edit.byte_start < prev.byte_end {
                    if edit.byte_end <= prev.byte_end {
                        continue;
                    }
                    return Err(EditError::Overlap {
                        first: prev.range(),
                        second: edit.range(),
                    });
                }
            }
            out.push_str(&source[cursor..edit.byte_start]);
            out.push_str(&edit.new_text);
            cursor = edit.byte_end;
            last = Some(edit);
        }

        out.push_str(&source[cursor..range.end]);
        Ok(out)
    }

    /// Apply every edit to the whole of `source`.
    pub fn apply(&self, source: &str) -> Result<String, EditError> {
        self.render(source, 0..source.len())
    }
}

impl Extend<Edit> for EditSet {
    fn extend<T: IntoIterator<Item = Edit>>(&mut self, iter: T) {
        self.edits.extend(iter);
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write succeeds or nothing changes.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EditError> {
    // Create tempfile in same directory to ensure same filesystem
    let parent = path.parent().ok_or_else(|| {
        EditError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path has no parent directory",
        ))
    })?;
    // A bare file name has an empty parent
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    fs::create_dir_all(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
