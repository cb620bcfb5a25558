//! This module defines the core data structures and types used throughout the crate,
//! including symbols, rule actions, transition table entries, program configuration,
//! execution results, and error types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::parser::Rule as GrammarRule;

/// A tape value or a machine state. Both namespaces use the same representation.
pub type Symbol = String;

/// The default filler written into cells the tape grows into.
pub const DEFAULT_FILLER: &str = "";
/// Placeholder used in textual rules to stand for the machine's default filler.
pub const DEFAULT_SIGN: &str = "DEF";
/// Alphabet the symbol allocator combines into fresh names.
pub const DEFAULT_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz0123456789";
/// Separator between the sections of an encoded program.
pub const SECTION_DELIMITER: char = ':';
/// Separator between tape cells and between rules of an encoded program.
pub const ITEM_DELIMITER: char = ',';

/// Checks that `symbol` can stand on its own in the textual encoding.
pub(crate) fn is_token(symbol: &str) -> bool {
    !symbol.is_empty()
        && !symbol
            .chars()
            .any(|c| c.is_whitespace() || c == SECTION_DELIMITER || c == ITEM_DELIMITER)
}

pub(crate) fn unencodable(role: &str, symbol: &str) -> TuringError {
    TuringError::Configuration(format!("The {role} '{symbol}' has no textual encoding"))
}

/// The action applied after a rule has written its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Move the head one cell to the left.
    Left,
    /// Move the head one cell to the right.
    Right,
    /// Keep the head where it is.
    Stay,
    /// Stop the machine permanently without moving.
    Halt,
}

impl Action {
    /// Returns the direction pointing the other way. `Stay` and `Halt` are their own opposite.
    pub fn opposite(self) -> Self {
        match self {
            Action::Left => Action::Right,
            Action::Right => Action::Left,
            other => other,
        }
    }

    /// Returns `true` for the two actions that move the head.
    pub fn is_move(self) -> bool {
        matches!(self, Action::Left | Action::Right)
    }

    /// The code used for this action in the textual encoding.
    pub fn code(self) -> &'static str {
        match self {
            Action::Left => "L",
            Action::Right => "R",
            Action::Stay => "S",
            Action::Halt => "STOP",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Action {
    type Err = TuringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "L" => Ok(Action::Left),
            "R" => Ok(Action::Right),
            "S" => Ok(Action::Stay),
            "STOP" => Ok(Action::Halt),
            _ => Err(TuringError::Configuration(format!(
                "wrong action '{s}', must be one of 'R', 'L', 'S' or 'STOP'"
            ))),
        }
    }
}

/// The right-hand side of a table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Value written into the current cell.
    pub next_value: Symbol,
    /// State the machine enters.
    pub next_state: Symbol,
    /// What the head does afterwards.
    pub action: Action,
}

/// A complete transition table entry: `(value, state) -> (next_value, next_state, action)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub value: Symbol,
    pub state: Symbol,
    pub next_value: Symbol,
    pub next_state: Symbol,
    pub action: Action,
}

impl Rule {
    pub fn new(
        value: impl Into<Symbol>,
        state: impl Into<Symbol>,
        next_value: impl Into<Symbol>,
        next_state: impl Into<Symbol>,
        action: Action,
    ) -> Self {
        Self {
            value: value.into(),
            state: state.into(),
            next_value: next_value.into(),
            next_state: next_state.into(),
            action,
        }
    }

    /// Splits the entry into its table key and its transition.
    pub fn into_parts(self) -> ((Symbol, Symbol), Transition) {
        (
            (self.value, self.state),
            Transition {
                next_value: self.next_value,
                next_state: self.next_state,
                action: self.action,
            },
        )
    }

    /// Renders the rule with `blank` replaced by [`DEFAULT_SIGN`], the form accepted by the parser.
    ///
    /// # Errors
    ///
    /// * `TuringError::Configuration` if a symbol would not parse back to itself:
    ///   an empty or literal `DEF` value other than `blank`, an empty state, or a
    ///   symbol holding whitespace or a delimiter.
    pub fn encode(&self, blank: &str) -> Result<String, TuringError> {
        let value = |s: &str| {
            if s == blank {
                Ok(DEFAULT_SIGN.to_string())
            } else if s != DEFAULT_SIGN && is_token(s) {
                Ok(s.to_string())
            } else {
                Err(unencodable("value", s))
            }
        };
        let state = |s: &str| {
            if is_token(s) {
                Ok(s.to_string())
            } else {
                Err(unencodable("state", s))
            }
        };

        Ok(format!(
            "{} {} -> {} {} {}",
            value(&self.value)?,
            state(&self.state)?,
            value(&self.next_value)?,
            state(&self.next_state)?,
            self.action
        ))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {} {} {}",
            self.value, self.state, self.next_value, self.next_state, self.action
        )
    }
}

/// The initial configuration of a machine together with its transition table.
///
/// `index` is relative to the first cell of `tape`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Initial tape content, left to right.
    pub tape: Vec<Symbol>,
    /// Initial head position.
    pub index: i64,
    /// Filler written into cells the tape grows into.
    pub default: Symbol,
    /// The state the machine starts in.
    pub initial_state: Symbol,
    /// Transition table in insertion order.
    pub rules: Vec<Rule>,
}

impl Program {
    /// Creates a program without rules. An empty tape holds one filler cell.
    pub fn new<I, S>(tape: I, initial_state: impl Into<Symbol>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        let mut tape: Vec<Symbol> = tape.into_iter().map(Into::into).collect();
        if tape.is_empty() {
            tape.push(DEFAULT_FILLER.to_string());
        }

        Self {
            tape,
            index: 0,
            default: DEFAULT_FILLER.to_string(),
            initial_state: initial_state.into(),
            rules: Vec::new(),
        }
    }

    /// Sets the initial head position.
    pub fn with_index(mut self, index: i64) -> Self {
        self.index = index;
        self
    }

    /// Sets the default filler symbol.
    pub fn with_default(mut self, default: impl Into<Symbol>) -> Self {
        self.default = default.into();
        self
    }

    /// Serializes the program as JSON.
    pub fn to_json(&self) -> Result<String, TuringError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TuringError::Configuration(format!("Failed to serialize program: {e}")))
    }

    /// Reads a program from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, TuringError> {
        serde_json::from_str(json)
            .map_err(|e| TuringError::Configuration(format!("Invalid program JSON: {e}")))
    }
}

/// Represents the outcome of an interpreter step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// A rule was applied and the machine can go on.
    Continue,
    /// The machine has stopped on a halting rule.
    Halted,
    /// No rule matched; the run is over and the machine is left as it was.
    Failed(TuringError),
}

/// Represents the errors raised while compiling or running a machine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuringError {
    /// Malformed label, action, alphabet, branch arrays or range layout.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// A malformed encoded program.
    #[error("Program parsing error: {0}")]
    Parse(#[from] Box<pest::error::Error<GrammarRule>>),
    /// A second, different rule for an existing `(value, state)` key.
    #[error("Rule with value '{value}' and state '{state}' already exists: {existing} (requested: {requested})")]
    Conflict {
        value: Symbol,
        state: Symbol,
        existing: String,
        requested: String,
    },
    /// The cursor does not have the shape an operation needs, or it is stale.
    #[error("Undetermined state: {0}")]
    UndeterminedState(String),
    /// No table entry for the value under the head in the current state.
    #[error("No rule for value '{value}' in state '{state}', rules on this machine:\n{table}")]
    MissingRule {
        value: Symbol,
        state: Symbol,
        table: String,
    },
    /// Reading or writing a program file failed.
    #[error("File error: {0}")]
    FileError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_serialization() {
        let left_json = serde_json::to_string(&Action::Left).unwrap();
        let halt_json = serde_json::to_string(&Action::Halt).unwrap();

        assert_eq!(left_json, "\"Left\"");
        assert_eq!(halt_json, "\"Halt\"");

        let left: Action = serde_json::from_str(&left_json).unwrap();
        assert_eq!(left, Action::Left);
    }

    #[test]
    fn test_action_codes() {
        for action in [Action::Left, Action::Right, Action::Stay, Action::Halt] {
            assert_eq!(action.code().parse::<Action>().unwrap(), action);
        }

        let error = "X".parse::<Action>().unwrap_err();
        assert!(matches!(error, TuringError::Configuration(_)));
        assert!(error.to_string().contains("wrong action 'X'"));
    }

    #[test]
    fn test_action_opposite() {
        assert_eq!(Action::Left.opposite(), Action::Right);
        assert_eq!(Action::Right.opposite(), Action::Left);
        assert_eq!(Action::Stay.opposite(), Action::Stay);
        assert!(!Action::Halt.is_move());
    }

    #[test]
    fn test_rule_display_and_encode() {
        let rule = Rule::new("", "q1", "1", "q2", Action::Right);

        assert_eq!(rule.to_string(), " q1 -> 1 q2 R");
        assert_eq!(rule.encode("").unwrap(), "DEF q1 -> 1 q2 R");
    }

    #[test]
    fn test_rule_encode_rejects_unparsable_symbols() {
        let empty_value = Rule::new("", "q1", "x", "q2", Action::Right);
        assert_eq!(empty_value.encode("").unwrap(), "DEF q1 -> x q2 R");
        assert!(matches!(
            empty_value.encode("_"),
            Err(TuringError::Configuration(_))
        ));

        for rule in [
            Rule::new("DEF", "q1", "x", "q2", Action::Right),
            Rule::new("a b", "q1", "x", "q2", Action::Right),
            Rule::new("a", "q1", "x,y", "q2", Action::Right),
            Rule::new("a", "", "x", "q2", Action::Right),
            Rule::new("a", "q1", "x", "q:2", Action::Right),
        ] {
            assert!(rule.encode("_").is_err(), "{rule}");
        }
    }

    #[test]
    fn test_program_empty_tape() {
        let program = Program::new(Vec::<Symbol>::new(), "q1");
        assert_eq!(program.tape, vec![DEFAULT_FILLER]);
    }

    #[test]
    fn test_program_json() {
        let program = Program::new(["1", "0"], "q1").with_index(1).with_default("_");
        let json = program.to_json().unwrap();

        assert_eq!(Program::from_json(&json).unwrap(), program);
        assert!(Program::from_json("{").is_err());
    }

    #[test]
    fn test_error_display() {
        let error = TuringError::UndeterminedState("cursor is stale".to_string());

        assert!(error.to_string().contains("Undetermined state"));
        assert!(error.to_string().contains("stale"));
    }
}
