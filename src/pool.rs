//! Thread-local parser pooling.
//!
//! A transform parses its document at least twice (input and validation),
//! and batch runs transform many documents. The pool keeps one JavaScript
//! parser per thread and hands it out on demand.

use crate::js::{JsParser, TransformError};
use std::cell::RefCell;

thread_local! {
    static JS_PARSER: RefCell<Option<JsParser>> = const { RefCell::new(None) };
}

/// Execute `f` with the pooled parser for this thread, creating it on first
/// use.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use bundle_patcher::pool::with_parser;
///
/// let errors = with_parser(|parser| {
///     parser.parse_with_source("let a = 1;").map(|p| p.error_nodes())
/// })??;
/// assert!(errors.is_empty());
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(f: F) -> Result<R, TransformError>
where
    F: FnOnce(&mut JsParser) -> R,
{
    JS_PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot = Some(JsParser::new()?);
        }
        match slot.as_mut() {
            Some(parser) => Ok(f(parser)),
            None => Err(TransformError::LanguageSet),
        }
    })
}
