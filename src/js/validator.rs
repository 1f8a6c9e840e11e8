use crate::js::errors::TransformError;
use crate::js::parser::ErrorNode;
use crate::pool::with_parser;

/// ERROR and MISSING nodes in `source`.
pub fn syntax_errors(source: &str) -> Result<Vec<ErrorNode>, TransformError> {
    with_parser(|parser| parser.parse_with_source(source).map(|p| p.error_nodes()))?
}

/// Check that `output` has no more syntax errors than its input had.
pub fn validate_output(output: &str, errors_before: usize) -> Result<(), TransformError> {
    let errors = syntax_errors(output)?;
    if errors.len() <= errors_before {
        return Ok(());
    }
    Err(TransformError::IntroducedSyntaxErrors {
        count: errors.len() - errors_before,
        first_byte: errors.first().map(|e| e.byte_start).unwrap_or_default(),
    })
}
