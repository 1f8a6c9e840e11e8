//! Byte-signature extraction of an embedded payload.
//!
//! Standalone executables produced by JavaScript bundlers carry the bundled
//! source somewhere inside the binary, framed by a header marker before it
//! and a tail marker after it. [`extract`] strips that framing.
//!
//! Extraction never fails: a missing marker is an expected outcome when the
//! framing changes between bundler versions (or when the input is already
//! plain source), so the affected bytes pass through unchanged and the
//! outcome is reported through [`Extraction`].

pub mod markers;

pub use markers::{Signature, BUN_HEADER, BUN_TAIL};

use std::fmt;

/// What happened to a single marker during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerOutcome {
    /// Marker found at `offset`.
    ///
    /// Header offsets are relative to the original buffer, tail offsets to
    /// the buffer left after the header was stripped.
    Found { offset: usize },
    /// Marker absent; the buffer passed through unchanged.
    Missing,
    /// The search was not performed (tail search after a missing header).
    NotSearched,
}

impl MarkerOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, MarkerOutcome::Found { .. })
    }
}

impl fmt::Display for MarkerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerOutcome::Found { offset } => write!(f, "found at byte {offset}"),
            MarkerOutcome::Missing => write!(f, "missing"),
            MarkerOutcome::NotSearched => write!(f, "not searched"),
        }
    }
}

/// Result of [`extract`]: the payload and how each marker was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Extraction carries the payload"]
pub struct Extraction {
    pub payload: Vec<u8>,
    pub header: MarkerOutcome,
    pub tail: MarkerOutcome,
}

impl Extraction {
    /// True when both markers were found and stripped.
    pub fn is_framed(&self) -> bool {
        self.header.is_found() && self.tail.is_found()
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

/// Strip the framing around an embedded payload.
///
/// 1. The first occurrence of `header` in `buffer` is located. Everything up
///    to and including it is dropped. Without a header, `buffer` is returned
///    unchanged.
/// 2. In the remainder, the *last* occurrence of `tail` is located and the
///    marker and everything after it is dropped. Without a tail, the whole
///    remainder is kept.
///
/// The tail is searched from the end because trailing metadata (a debug id
/// comment, for instance) can repeat the marker bytes.
pub fn extract(buffer: &[u8], header: &Signature, tail: &Signature) -> Extraction {
    let Some(header_at) = find_first(buffer, header.bytes()) else {
        tracing::warn!(
            marker = header.name(),
            len = buffer.len(),
            "header marker not found, passing buffer through unchanged"
        );
        return Extraction {
            payload: buffer.to_vec(),
            header: MarkerOutcome::Missing,
            tail: MarkerOutcome::NotSearched,
        };
    };

    let rest = &buffer[header_at + header.len()..];
    tracing::debug!(marker = header.name(), offset = header_at, "header marker found");

    match find_last(rest, tail.bytes()) {
        Some(tail_at) => {
            tracing::debug!(marker = tail.name(), offset = tail_at, "tail marker found");
            Extraction {
                payload: rest[..tail_at].to_vec(),
                header: MarkerOutcome::Found { offset: header_at },
                tail: MarkerOutcome::Found { offset: tail_at },
            }
        }
        None => {
            tracing::warn!(
                marker = tail.name(),
                "tail marker not found, keeping everything after the header"
            );
            Extraction {
                payload: rest.to_vec(),
                header: MarkerOutcome::Found { offset: header_at },
                tail: MarkerOutcome::Missing,
            }
        }
    }
}

/// Offset of the first occurrence of `needle` in `haystack`.
pub fn find_first(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Offset of the last occurrence of `needle` in `haystack`.
pub fn find_last(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|w| w == needle)
}
