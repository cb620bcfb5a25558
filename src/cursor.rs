//! The compiler's notion of where the program under construction currently is.

use std::fmt;

use crate::types::{Symbol, TuringError};

/// The value(s) expected under the head together with the state(s) the
/// program may be in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueCondition {
    /// One value, one state.
    Single { value: Symbol, state: Symbol },
    /// One value, several states: unreconciled program paths that all expect the same value.
    Branch { value: Symbol, states: Vec<Symbol> },
    /// `values[i]` is expected in `states[i]`.
    Pairs {
        values: Vec<Symbol>,
        states: Vec<Symbol>,
    },
}

impl ValueCondition {
    pub fn single(value: impl Into<Symbol>, state: impl Into<Symbol>) -> Self {
        ValueCondition::Single {
            value: value.into(),
            state: state.into(),
        }
    }

    pub fn branch<I, S>(value: impl Into<Symbol>, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        ValueCondition::Branch {
            value: value.into(),
            states: states.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a `Pairs` condition.
    ///
    /// # Errors
    ///
    /// * `TuringError::Configuration` if the two lists differ in length.
    pub fn pairs<V, S>(values: V, states: S) -> Result<Self, TuringError>
    where
        V: IntoIterator,
        V::Item: Into<Symbol>,
        S: IntoIterator,
        S::Item: Into<Symbol>,
    {
        let values: Vec<Symbol> = values.into_iter().map(Into::into).collect();
        let states: Vec<Symbol> = states.into_iter().map(Into::into).collect();

        if values.len() != states.len() {
            return Err(TuringError::Configuration(format!(
                "{} values paired with {} states",
                values.len(),
                states.len()
            )));
        }

        Ok(ValueCondition::Pairs { values, states })
    }

    /// Every expected value, one per state for `Pairs`.
    pub fn values(&self) -> Vec<&Symbol> {
        match self {
            ValueCondition::Single { value, .. } | ValueCondition::Branch { value, .. } => {
                vec![value]
            }
            ValueCondition::Pairs { values, .. } => values.iter().collect(),
        }
    }

    pub fn states(&self) -> Vec<&Symbol> {
        match self {
            ValueCondition::Single { state, .. } => vec![state],
            ValueCondition::Branch { states, .. } | ValueCondition::Pairs { states, .. } => {
                states.iter().collect()
            }
        }
    }

    pub fn is_single(&self) -> bool {
        matches!(self, ValueCondition::Single { .. })
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, ValueCondition::Branch { .. })
    }

    pub fn is_pairs(&self) -> bool {
        matches!(self, ValueCondition::Pairs { .. })
    }

    fn shape(&self) -> &'static str {
        match self {
            ValueCondition::Single { .. } => "single",
            ValueCondition::Branch { .. } => "branch",
            ValueCondition::Pairs { .. } => "pairs",
        }
    }
}

impl fmt::Display for ValueCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueCondition::Single { value, state } => write!(f, "({value}, {state})"),
            ValueCondition::Branch { value, states } => {
                write!(f, "({value}, [{}])", states.join(", "))
            }
            ValueCondition::Pairs { values, states } => {
                write!(f, "([{}], [{}])", values.join(", "), states.join(", "))
            }
        }
    }
}

/// Tracks the current `ValueCondition` and whether it still describes the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    current: ValueCondition,
    fresh: bool,
}

impl Cursor {
    pub fn new(current: ValueCondition) -> Self {
        Self {
            current,
            fresh: true,
        }
    }

    /// Replaces the active shape and marks the cursor up to date.
    pub fn set(&mut self, current: ValueCondition) {
        self.current = current;
        self.fresh = true;
    }

    /// Marks the cursor as no longer describing the table.
    pub fn mark_stale(&mut self) {
        self.fresh = false;
    }

    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// Returns the active shape, stale or not.
    pub fn peek(&self) -> &ValueCondition {
        &self.current
    }

    /// Returns the active shape.
    ///
    /// # Errors
    ///
    /// * `TuringError::UndeterminedState` if the cursor is stale.
    pub fn get(&self) -> Result<&ValueCondition, TuringError> {
        if !self.fresh {
            return Err(TuringError::UndeterminedState(format!(
                "cursor {} is stale after a manual rule, set it first",
                self.current
            )));
        }

        Ok(&self.current)
    }

    /// Returns `(value, state)` if the cursor is an up to date `Single`.
    pub fn single(&self, operation: &str) -> Result<(Symbol, Symbol), TuringError> {
        match self.get()? {
            ValueCondition::Single { value, state } => Ok((value.clone(), state.clone())),
            other => Err(self.mismatch(operation, "single", other)),
        }
    }

    /// Returns `(value, states)` if the cursor is an up to date `Branch`.
    pub fn branch(&self, operation: &str) -> Result<(Symbol, Vec<Symbol>), TuringError> {
        match self.get()? {
            ValueCondition::Branch { value, states } => Ok((value.clone(), states.clone())),
            other => Err(self.mismatch(operation, "branch", other)),
        }
    }

    /// Returns `(values, states)` if the cursor is an up to date `Pairs`.
    pub fn pairs(&self, operation: &str) -> Result<(Vec<Symbol>, Vec<Symbol>), TuringError> {
        match self.get()? {
            ValueCondition::Pairs { values, states } => Ok((values.clone(), states.clone())),
            other => Err(self.mismatch(operation, "pairs", other)),
        }
    }

    fn mismatch(&self, operation: &str, expected: &str, found: &ValueCondition) -> TuringError {
        TuringError::UndeterminedState(format!(
            "{operation} needs a {expected} cursor, found {} {found}",
            found.shape()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes() {
        let single = ValueCondition::single("1", "q1");
        let branch = ValueCondition::branch("1", ["q1", "q2"]);
        let pairs = ValueCondition::pairs(["1", "0"], ["q1", "q2"]).unwrap();

        assert!(single.is_single() && !single.is_branch());
        assert!(branch.is_branch() && !branch.is_pairs());
        assert!(pairs.is_pairs() && !pairs.is_single());

        assert_eq!(branch.values(), vec!["1"]);
        assert_eq!(branch.states(), vec!["q1", "q2"]);
        assert_eq!(pairs.values(), vec!["1", "0"]);
        assert_eq!(single.to_string(), "(1, q1)");
        assert_eq!(pairs.to_string(), "([1, 0], [q1, q2])");
    }

    #[test]
    fn test_pairs_length_mismatch() {
        let error = ValueCondition::pairs(["1"], ["q1", "q2"]).unwrap_err();
        assert!(matches!(error, TuringError::Configuration(_)));
    }

    #[test]
    fn test_stale_cursor() {
        let mut cursor = Cursor::new(ValueCondition::single("1", "q1"));
        assert_eq!(
            cursor.single("test").unwrap(),
            ("1".to_string(), "q1".to_string())
        );

        cursor.mark_stale();
        assert!(matches!(
            cursor.get(),
            Err(TuringError::UndeterminedState(_))
        ));
        assert!(cursor.peek().is_single());

        cursor.set(ValueCondition::branch("0", ["q2"]));
        assert!(cursor.is_fresh());
        assert_eq!(cursor.branch("test").unwrap().1, vec!["q2"]);
    }

    #[test]
    fn test_shape_mismatch() {
        let cursor = Cursor::new(ValueCondition::single("1", "q1"));
        let error = cursor.branch("join").unwrap_err();

        assert!(matches!(error, TuringError::UndeterminedState(_)));
        assert!(error.to_string().contains("join needs a branch cursor"));
    }
}
