//! Framing markers of known bundler container formats.
//!
//! These are versioned constants: when the bundler changes its framing the
//! markers have to follow. Extraction stays pass-through on a mismatch.

/// A named, fixed byte sequence used as a search key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    name: &'static str,
    bytes: &'static [u8],
}

impl Signature {
    pub const fn new(name: &'static str, bytes: &'static [u8]) -> Self {
        Self { name, bytes }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn bytes(&self) -> &'static [u8] {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Pragma line the bundler writes in front of an ES-module entry point.
pub const BUN_HEADER: Signature = Signature::new("bun-header", b"// @bun\n");

/// Debug-id comment the bundler appends after the module source.
pub const BUN_TAIL: Signature = Signature::new("bun-tail", b"\n//# debugId=");
