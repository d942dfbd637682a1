//! Locates the `scriptConfig` object embedded in raw script source.
//!
//! The scan is a single left-to-right pass with no backtracking. A word
//! buffer accumulates the current line; once the trimmed buffer reads as the
//! declaration token the scanner switches to looking for the opening brace,
//! then copies until the brace depth returns to zero. The scanner has no
//! awareness of the host language's string or comment syntax, so braces
//! inside string literals or comments of the embedded script count toward
//! the depth. That is a documented limitation of the format, not something
//! to repair here.

use crate::error::ExtractError;

/// Variable name that introduces the embedded configuration object.
const DECLARATION_TOKEN: &str = "scriptConfig";

enum ScanState {
    /// Accumulating line text until the declaration token appears.
    SeekingToken,
    /// Token seen; skipping forward to the first `{`.
    SeekingOpenBrace,
    /// Inside the object, tracking brace depth from the recorded start.
    InObject { start: usize, depth: u32 },
}

/// Extracts the balanced `{...}` region declared as `scriptConfig`.
///
/// Returns the subslice of `source` spanning the first opening brace after
/// the declaration token through its matching close brace. Only the first
/// successfully closed object is recognized.
pub fn extract_config(source: &str) -> Result<&str, ExtractError> {
    let mut state = ScanState::SeekingToken;
    let mut word = String::new();

    for (index, ch) in source.char_indices() {
        match state {
            ScanState::SeekingToken => {
                // The declaration must sit on a single line.
                if ch == '\n' || ch == '\r' {
                    word.clear();
                    continue;
                }
                word.push(ch);
                let trimmed = word.trim();
                if trimmed == DECLARATION_TOKEN
                    || (trimmed.starts_with("var") && trimmed.ends_with(DECLARATION_TOKEN))
                {
                    state = ScanState::SeekingOpenBrace;
                }
            }
            ScanState::SeekingOpenBrace => {
                if ch == '{' {
                    state = ScanState::InObject {
                        start: index,
                        depth: 1,
                    };
                }
            }
            ScanState::InObject { start, depth } => {
                let depth = match ch {
                    '{' => depth + 1,
                    '}' => depth - 1,
                    _ => depth,
                };
                if depth == 0 {
                    let object = &source[start..=index];
                    tracing::debug!(bytes = object.len(), "extracted embedded configuration");
                    return Ok(object);
                }
                state = ScanState::InObject { start, depth };
            }
        }
    }

    Err(match state {
        ScanState::SeekingToken => ExtractError::DeclarationNotFound,
        ScanState::SeekingOpenBrace => ExtractError::MissingOpenBrace,
        ScanState::InObject { .. } => ExtractError::MissingCloseBrace,
    })
}
