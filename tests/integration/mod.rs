//! End-to-end tests: transform behavior over whole programs, extraction
//! properties, the update pipeline against a fake release channel, and the
//! command-line interface.

mod cli;
mod extract;
mod pipeline;
mod transform;
