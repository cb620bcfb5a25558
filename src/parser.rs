//! This module provides the parser for the textual machine encoding, utilizing the `pest` crate.
//! It defines the grammar for encoded programs and `.tm` files and functions to parse the
//! input into a `Program` struct or a list of rules.

use crate::types::{self, Action, Program, Symbol, TuringError, DEFAULT_SIGN};
use pest::{
    error::{Error, ErrorVariant},
    iterators::Pair,
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;

/// Derives a `PestParser` for the grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct ProgramParser;

/// Parses an encoded program.
///
/// Both the single-line form `tape:index:default:state:rules` and the file form,
/// where the rules follow the header one per line, are accepted.
///
/// # Arguments
///
/// * `input` - A string slice containing the encoded program.
///
/// # Returns
///
/// * `Ok(Program)` if the input is successfully parsed.
/// * `Err(TuringError::Parse)` if there are any syntax errors.
/// * `Err(TuringError::Configuration)` if a rule names an unknown action.
pub fn parse(input: &str) -> Result<Program, TuringError> {
    let root = ProgramParser::parse(Rule::program, input.trim())
        .map_err(|e| TuringError::Parse(e.into()))?
        .next()
        .ok_or_else(|| TuringError::Configuration("Empty program".into()))?;

    parse_program(root)
}

/// Parses a list of rules separated by commas or newlines.
///
/// `DEF` in a value position stands for `default`.
pub fn parse_rules(input: &str, default: &str) -> Result<Vec<types::Rule>, TuringError> {
    let root = ProgramParser::parse(Rule::table, input.trim())
        .map_err(|e| TuringError::Parse(e.into()))?
        .next()
        .ok_or_else(|| TuringError::Configuration("Empty rule list".into()))?;

    match root.into_inner().find(|p| p.as_rule() == Rule::entries) {
        Some(list) => parse_entries(list, default),
        None => Ok(Vec::new()),
    }
}

/// Builds a `Program` from a `Pair<Rule::program>`. Sections arrive in order,
/// so the default is known before any rule is read.
fn parse_program(pair: Pair<Rule>) -> Result<Program, TuringError> {
    let mut tape = Vec::new();
    let mut index = 0;
    let mut default = Symbol::new();
    let mut initial_state = None;
    let mut rules = Vec::new();

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::tape => tape = p.into_inner().map(|cell| cell.as_str().to_string()).collect(),
            Rule::index => index = parse_index(p)?,
            Rule::blank => default = p.as_str().to_string(),
            Rule::state => initial_state = Some(p.as_str().to_string()),
            Rule::entries => rules = parse_entries(p, &default)?,
            _ => {} // EOI
        }
    }

    let initial_state = initial_state
        .ok_or_else(|| TuringError::Configuration("Missing initial state".into()))?;

    Ok(Program {
        tape,
        index,
        default,
        initial_state,
        rules,
    })
}

fn parse_index(pair: Pair<Rule>) -> Result<i64, TuringError> {
    let span = pair.as_span();
    pair.as_str()
        .parse()
        .map_err(|_| parse_error(&format!("Invalid index: {}", pair.as_str()), span))
}

fn parse_entries(pair: Pair<Rule>, default: &str) -> Result<Vec<types::Rule>, TuringError> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::entry)
        .map(|p| parse_rule(p, default))
        .collect()
}

/// Parses `value state -> next_value next_state action`. The short form
/// `value state -> next_value action` keeps the state.
fn parse_rule(pair: Pair<Rule>, default: &str) -> Result<types::Rule, TuringError> {
    let span = pair.as_span();
    let tokens: Vec<&str> = pair.into_inner().map(|p| p.as_str()).collect();

    let (value, state, next_value, next_state, action) = match tokens.as_slice() {
        [v, s, nv, ns, a] => (*v, *s, *nv, *ns, *a),
        [v, s, nv, a] => (*v, *s, *nv, *s, *a),
        _ => return Err(parse_error("Malformed rule", span)),
    };

    let sign = |s: &str| {
        if s == DEFAULT_SIGN {
            default.to_string()
        } else {
            s.to_string()
        }
    };

    Ok(types::Rule::new(
        sign(value),
        state,
        sign(next_value),
        next_state,
        action.parse::<Action>()?,
    ))
}

/// Creates a `TuringError::Parse` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> TuringError {
    TuringError::Parse(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_string_form() {
        let program = parse("1,0,1:1:_:q1:1 q1 -> 0 q1 R,0 q1 -> 0 q2 STOP").unwrap();

        assert_eq!(program.tape, vec!["1", "0", "1"]);
        assert_eq!(program.index, 1);
        assert_eq!(program.default, "_");
        assert_eq!(program.initial_state, "q1");
        assert_eq!(program.rules.len(), 2);
        assert_eq!(program.rules[1].action, Action::Halt);
    }

    #[test]
    fn test_parse_file_form() {
        let input = r#"
a,b,c:0::q1
a q1 -> a q1 R
b q1 -> x q2 L

a q2 -> a q2 STOP
"#;
        let program = parse(input).unwrap();

        assert_eq!(program.default, "");
        assert_eq!(program.rules.len(), 3);
        assert_eq!(program.rules[1].to_string(), "b q1 -> x q2 L");
    }

    #[test]
    fn test_parse_empty_cells_and_default() {
        let error = parse("a,,b::::q1:").unwrap_err();
        assert!(matches!(error, TuringError::Parse(_)));

        let program = parse("a,,b:::q1:").unwrap();
        assert_eq!(program.tape, vec!["a", "", "b"]);
        assert_eq!(program.index, 0);
        assert_eq!(program.default, "");
        assert!(program.rules.is_empty());
    }

    #[test]
    fn test_parse_negative_index() {
        let program = parse("a:-2:_:q1").unwrap();
        assert_eq!(program.index, -2);
    }

    #[test]
    fn test_default_sign() {
        let rules = parse_rules("DEF q1 -> DEF q2 R", "_").unwrap();

        assert_eq!(rules[0].value, "_");
        assert_eq!(rules[0].next_value, "_");
        assert_eq!(rules[0].state, "q1");
    }

    #[test]
    fn test_short_stop_form_keeps_state() {
        let rules = parse_rules("1 q7 -> 0 STOP", "").unwrap();

        assert_eq!(rules[0].next_state, "q7");
        assert_eq!(rules[0].action, Action::Halt);
    }

    #[test]
    fn test_long_arrow() {
        let rules = parse_rules("1 q1 --> 0 q2 L\n0 q2 -> 0 q2 S", "").unwrap();

        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1].action, Action::Stay);
    }

    #[test]
    fn test_unknown_action() {
        let error = parse_rules("1 q1 -> 0 q2 X", "").unwrap_err();

        assert!(matches!(error, TuringError::Configuration(_)));
        assert!(error.to_string().contains("wrong action 'X'"));
    }

    #[test]
    fn test_malformed_rule() {
        let error = parse_rules("1 q1 0 q2 R", "").unwrap_err();
        assert!(matches!(error, TuringError::Parse(_)));

        let error = parse("1,0:0:_").unwrap_err();
        assert!(matches!(error, TuringError::Parse(_)));
    }

    #[test]
    fn test_empty_rule_list() {
        assert!(parse_rules("", "").unwrap().is_empty());
    }
}
