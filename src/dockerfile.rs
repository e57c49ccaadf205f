//! Dockerfile instruction parser.
//!
//! Tokenizes raw Dockerfile text into an ordered sequence of
//! [`Instruction`]s, honoring `\` line continuation. Blank lines and `#`
//! comments are dropped before parsing; every other physical line belongs to
//! exactly one instruction.

use crate::error::{HullcheckError, Result};
use crate::types::Instruction;
use tracing::debug;

/// Parses Dockerfile content into an ordered instruction sequence.
///
/// Continuation fragments are joined with single spaces. A bare keyword with
/// no argument parses to an empty argument rather than failing; a logical
/// line from which no keyword can be isolated is an error the caller decides
/// how to handle.
pub fn parse(content: &str) -> Result<Vec<Instruction>> {
    let mut instructions = Vec::new();
    let mut pending: Option<(String, Vec<String>, usize)> = None;

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(fragment) = line.strip_suffix('\\') {
            let fragment = fragment.trim();
            match pending.as_mut() {
                Some((_, args, _)) => args.push(fragment.to_string()),
                None => {
                    let (keyword, arg) = split_keyword(fragment, idx + 1)?;
                    pending = Some((keyword, vec![arg], idx + 1));
                }
            }
        } else {
            match pending.take() {
                Some((keyword, mut args, _)) => {
                    args.push(line.to_string());
                    let argument = args
                        .iter()
                        .map(String::as_str)
                        .filter(|a| !a.is_empty())
                        .collect::<Vec<_>>()
                        .join(" ");
                    instructions.push(Instruction { keyword, argument });
                }
                None => {
                    let (keyword, argument) = split_keyword(line, idx + 1)?;
                    instructions.push(Instruction { keyword, argument });
                }
            }
        }
    }

    // Trailing continuation with no closing line still yields an instruction.
    if let Some((keyword, args, _)) = pending {
        let argument = args
            .iter()
            .map(String::as_str)
            .filter(|a| !a.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        instructions.push(Instruction { keyword, argument });
    }

    debug!(count = instructions.len(), "parsed dockerfile instructions");
    Ok(instructions)
}

/// Splits a logical line into (uppercase keyword, raw argument) on the first
/// whitespace run.
fn split_keyword(line: &str, line_no: usize) -> Result<(String, String)> {
    let mut parts = line.splitn(2, char::is_whitespace);
    let keyword = parts
        .next()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| HullcheckError::instruction_parse(line_no, "empty instruction"))?;
    if !keyword.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(HullcheckError::instruction_parse(
            line_no,
            format!("cannot isolate instruction keyword in {line:?}"),
        ));
    }
    let argument = parts.next().unwrap_or("").trim().to_string();
    Ok((keyword.to_ascii_uppercase(), argument))
}
