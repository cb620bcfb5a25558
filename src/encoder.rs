//! This module provides encoding functionality for converting programs into their
//! textual form and back.

use crate::parser::parse;
use crate::types::{
    is_token, unencodable, Program, TuringError, ITEM_DELIMITER, SECTION_DELIMITER,
};

/// Encodes a program into a single line.
///
/// Format: `tape:index:default:state:rules`
/// - tape: Comma-separated cells, left to right.
/// - index: Head position relative to the first cell.
/// - default: The filler symbol, possibly empty.
/// - state: The current state.
/// - rules: Comma-separated rules, `DEF` standing for the filler in value positions.
///
/// # Arguments
///
/// * `program` - The Program to encode.
///
/// # Returns
///
/// * `Ok(String)` - The encoded program string.
/// * `Err(TuringError::Configuration)` if the tape is empty or a symbol would
///   not decode back to itself.
pub fn encode(program: &Program) -> Result<String, TuringError> {
    let rules = encode_rules(program)?;

    Ok(format!(
        "{}{s}{}",
        encode_header(program)?,
        rules.join(ITEM_DELIMITER.to_string().as_str()),
        s = SECTION_DELIMITER
    ))
}

/// Encodes a program in the file form: the header on the first line and one rule per line.
pub fn encode_file(program: &Program) -> Result<String, TuringError> {
    let mut lines = vec![encode_header(program)?];
    lines.extend(encode_rules(program)?);

    Ok(lines.join("\n") + "\n")
}

fn encode_rules(program: &Program) -> Result<Vec<String>, TuringError> {
    program
        .rules
        .iter()
        .map(|rule| rule.encode(&program.default))
        .collect()
}

fn encode_header(program: &Program) -> Result<String, TuringError> {
    // An empty cell list would read back as one empty cell
    if program.tape.is_empty() {
        return Err(TuringError::Configuration(
            "A program needs at least one tape cell".into(),
        ));
    }

    let blank_or_token = |s: &str| s.is_empty() || is_token(s);
    if let Some(cell) = program.tape.iter().find(|cell| !blank_or_token(cell.as_str())) {
        return Err(unencodable("tape cell", cell));
    }
    if !blank_or_token(program.default.as_str()) {
        return Err(unencodable("filler", &program.default));
    }
    if !is_token(&program.initial_state) {
        return Err(unencodable("state", &program.initial_state));
    }

    Ok(format!(
        "{}{s}{}{s}{}{s}{}",
        program.tape.join(ITEM_DELIMITER.to_string().as_str()),
        program.index,
        program.default,
        program.initial_state,
        s = SECTION_DELIMITER
    ))
}

/// Decodes a program produced by [`encode`] or [`encode_file`].
///
/// # Returns
///
/// * `Ok(Program)` with the decoded program.
/// * `Err(TuringError)` if the string is not a valid encoding.
pub fn decode(encoded: &str) -> Result<Program, TuringError> {
    parse(encoded)
}
