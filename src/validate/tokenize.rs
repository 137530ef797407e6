//! POSIX-like command splitting.
//!
//! Handles whitespace separation, single quotes (literal), double quotes
//! (backslash escapes `"`, `\`, `$` and `` ` ``), and backslash escapes outside
//! quotes. Nothing is expanded: no globbing, variables or substitutions.

use crate::errors::CommandParseError;

/// Split `command` into argv tokens.
pub fn split_command(command: &str) -> Result<Vec<String>, CommandParseError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = command.chars();

    while let Some(ch) = chars.next() {
        match ch {
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            '\'' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(CommandParseError::UnterminatedQuote { quote: '\'' }),
                    }
                }
            }
            '"' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\' | '$' | '`')) => current.push(c),
                            Some('\n') => {}
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            }
                            None => {
                                return Err(CommandParseError::UnterminatedQuote { quote: '"' });
                            }
                        },
                        Some(c) => current.push(c),
                        None => return Err(CommandParseError::UnterminatedQuote { quote: '"' }),
                    }
                }
            }
            '\\' => match chars.next() {
                Some('\n') => {}
                Some(c) => {
                    in_token = true;
                    current.push(c);
                }
                None => return Err(CommandParseError::TrailingEscape),
            },
            c => {
                in_token = true;
                current.push(c);
            }
        }
    }

    if in_token {
        tokens.push(current);
    }

    Ok(tokens)
}
