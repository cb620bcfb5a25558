//! Scan-until-target traversals.
//!
//! A traversal leaves the start cell, keeps moving over its interior values and
//! settles on the first terminal value it meets. [`Hooks`] decide what is
//! written into the start cell, each interior cell and the terminal cell, which
//! gives the navigation, painting and erasing flavors from one algorithm.

use std::collections::HashMap;

use crate::compiler::{MacroCompiler, Move, NextState};
use crate::cursor::ValueCondition;
use crate::types::{Action, Symbol, TuringError};

/// Rewrites applied to the cells a traversal visits.
pub trait Hooks {
    fn start(&self, value: &str) -> Symbol {
        value.to_string()
    }

    fn interior(&self, value: &str) -> Symbol {
        value.to_string()
    }

    fn end(&self, value: &str) -> Symbol {
        value.to_string()
    }
}

/// Leaves every cell as it is.
pub struct Identity;

impl Hooks for Identity {}

/// Overwrites every visited cell with one value.
pub struct Paint(pub Symbol);

impl Hooks for Paint {
    fn start(&self, _: &str) -> Symbol {
        self.0.clone()
    }

    fn interior(&self, _: &str) -> Symbol {
        self.0.clone()
    }

    fn end(&self, _: &str) -> Symbol {
        self.0.clone()
    }
}

/// Replaces the start value through a lookup table; unmapped values are kept.
pub struct Relocate(pub HashMap<Symbol, Symbol>);

impl Hooks for Relocate {
    fn start(&self, value: &str) -> Symbol {
        self.0
            .get(value)
            .cloned()
            .unwrap_or_else(|| value.to_string())
    }
}

/// Describes where a traversal goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traversal {
    pub interior: Vec<Symbol>,
    pub terminals: Vec<Symbol>,
    pub direction: Action,
    /// Apply [`Hooks::start`] to the start cell.
    pub include_start: bool,
    /// Apply [`Hooks::end`] to the terminal cell.
    pub include_end: bool,
}

impl Traversal {
    /// Moves over `interior` values in `direction` until one of `terminals`.
    pub fn new<I, T>(interior: I, terminals: T, direction: Action) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Symbol>,
        T: IntoIterator,
        T::Item: Into<Symbol>,
    {
        Self {
            interior: interior.into_iter().map(Into::into).collect(),
            terminals: terminals.into_iter().map(Into::into).collect(),
            direction,
            include_start: true,
            include_end: false,
        }
    }

    pub fn include_start(mut self, include: bool) -> Self {
        self.include_start = include;
        self
    }

    pub fn include_end(mut self, include: bool) -> Self {
        self.include_end = include;
        self
    }

    fn validate(&self) -> Result<(), TuringError> {
        if !self.direction.is_move() {
            return Err(TuringError::Configuration(format!(
                "A traversal must move left or right, not '{}'",
                self.direction
            )));
        }

        if self.terminals.is_empty() {
            return Err(TuringError::Configuration(
                "A traversal needs at least one terminal value".into(),
            ));
        }

        Ok(())
    }
}

/// Keeps the first occurrence of every symbol.
pub(crate) fn unique<'a>(symbols: impl IntoIterator<Item = &'a Symbol>) -> Vec<Symbol> {
    let mut seen = Vec::new();
    for symbol in symbols {
        if !seen.contains(symbol) {
            seen.push(symbol.clone());
        }
    }
    seen
}

impl MacroCompiler {
    /// Runs a traversal from a `Single` cursor.
    ///
    /// The cursor becomes `Single(end, arrived)`, or `Pairs(ends, [arrived; n])`
    /// when the traversal may end on different values.
    pub fn traverse(
        &mut self,
        traversal: &Traversal,
        hooks: &dyn Hooks,
    ) -> Result<ValueCondition, TuringError> {
        self.atomic(|compiler| {
            traversal.validate()?;
            let (value, _) = compiler.cursor().single("traverse")?;

            let start = if traversal.include_start {
                hooks.start(&value)
            } else {
                value
            };
            let scan = match compiler.single_move(
                Move::new(traversal.direction)
                    .write(start)
                    .to(NextState::Auto),
            )? {
                ValueCondition::Single { state, .. } => state,
                other => return Err(TuringError::UndeterminedState(other.to_string())),
            };

            let terminals = unique(&traversal.terminals);
            let interior: Vec<Symbol> = unique(&traversal.interior)
                .into_iter()
                .filter(|v| !terminals.contains(v))
                .collect();

            for value in &interior {
                compiler.emit(
                    value,
                    &scan,
                    &hooks.interior(value),
                    &scan,
                    traversal.direction,
                )?;
            }

            let arrived = compiler.new_state();
            let mut ends = Vec::with_capacity(terminals.len());
            for value in &terminals {
                let end = if traversal.include_end {
                    hooks.end(value)
                } else {
                    value.clone()
                };
                compiler.emit(value, &scan, &end, &arrived, Action::Stay)?;
                ends.push(end);
            }

            tracing::debug!(
                direction = %traversal.direction,
                %scan,
                %arrived,
                interior = interior.len(),
                terminals = terminals.len(),
                "traversal"
            );

            let ends = unique(&ends);
            let current = if ends.len() == 1 {
                ValueCondition::single(ends[0].clone(), arrived)
            } else {
                let states = vec![arrived; ends.len()];
                ValueCondition::pairs(ends, states)?
            };

            compiler.set_cursor(current);
            Ok(compiler.cursor().peek().clone())
        })
    }

    /// Moves to the first terminal value without changing anything on the way.
    pub fn move_by_val(&mut self, traversal: &Traversal) -> Result<ValueCondition, TuringError> {
        self.traverse(traversal, &Identity)
    }

    /// Overwrites the cells on the way with `to` (the filler when `None`).
    pub fn set_all_on_way(
        &mut self,
        traversal: &Traversal,
        to: Option<Symbol>,
    ) -> Result<ValueCondition, TuringError> {
        let to = to.unwrap_or_else(|| self.filler());
        self.traverse(traversal, &Paint(to))
    }

    /// Erases the cells on the way.
    pub fn clean_range(&mut self, traversal: &Traversal) -> Result<ValueCondition, TuringError> {
        let filler = self.filler();
        self.traverse(traversal, &Paint(filler))
    }

    /// Moves to the first terminal value and writes `put` there.
    ///
    /// The cursor becomes `Single(put, state)` for a fresh state. Without `put`
    /// this is [`MacroCompiler::move_by_val`].
    pub fn put_by_val(
        &mut self,
        traversal: &Traversal,
        put: Option<Symbol>,
    ) -> Result<ValueCondition, TuringError> {
        self.atomic(|compiler| {
            let arrived = compiler.move_by_val(traversal)?;
            let Some(put) = put else {
                return Ok(arrived);
            };

            let target = compiler.new_state();
            for (value, state) in arrived.values().into_iter().zip(arrived.states()) {
                compiler.emit(value, state, &put, &target, Action::Stay)?;
            }

            compiler.set_cursor(ValueCondition::single(put, target));
            Ok(compiler.cursor().peek().clone())
        })
    }

    /// Replaces the start value with `replace`, then carries the original start
    /// value to the first terminal value and writes it there.
    ///
    /// Without `replace` this is [`MacroCompiler::move_by_val`].
    pub fn move_from_to(
        &mut self,
        traversal: &Traversal,
        replace: Option<Symbol>,
    ) -> Result<ValueCondition, TuringError> {
        self.atomic(|compiler| {
            let Some(replace) = replace else {
                return compiler.move_by_val(traversal);
            };

            let (value, _) = compiler.cursor().single("move_from_to")?;
            compiler.single_move(Move::stay().write(replace).to(NextState::Auto))?;
            compiler.put_by_val(traversal, Some(value))
        })
    }

    /// Starts one traversal per `(value, state)` pair of a `Pairs` cursor, all
    /// heading for the same single terminal.
    ///
    /// The start values are added to the interior so a branch may cross cells
    /// holding another branch's start value. The cursor becomes
    /// `Branch(terminal, [arrived; n])` with one arrival state per pair.
    pub fn parallelise(&mut self, traversal: &Traversal) -> Result<ValueCondition, TuringError> {
        self.parallelise_with(traversal, &Identity)
    }

    /// [`MacroCompiler::parallelise`] with custom hooks.
    pub fn parallelise_with(
        &mut self,
        traversal: &Traversal,
        hooks: &dyn Hooks,
    ) -> Result<ValueCondition, TuringError> {
        self.atomic(|compiler| {
            let (values, states) = compiler.cursor().pairs("parallelise")?;
            let terminal = single_terminal(traversal, "parallelise")?;

            let mut branch = traversal.clone();
            branch.interior.extend(values.iter().cloned());

            let mut arrived = Vec::with_capacity(values.len());
            for (value, state) in values.into_iter().zip(states) {
                compiler.set_cursor(ValueCondition::single(value, state));
                arrived.push(compiler.arrive(&branch, hooks, "parallelise")?);
            }

            compiler.set_cursor(ValueCondition::branch(terminal, arrived));
            Ok(compiler.cursor().peek().clone())
        })
    }

    /// Replays a traversal from every state of a `Branch` cursor.
    ///
    /// The cursor becomes `Branch(terminal, [arrived; n])` with one arrival state
    /// per input state.
    pub fn parallel_move(&mut self, traversal: &Traversal) -> Result<ValueCondition, TuringError> {
        self.atomic(|compiler| {
            let (value, states) = compiler.cursor().branch("parallel_move")?;
            let terminal = single_terminal(traversal, "parallel_move")?;

            let mut arrived = Vec::with_capacity(states.len());
            for state in states {
                compiler.set_cursor(ValueCondition::single(value.clone(), state));
                arrived.push(compiler.arrive(traversal, &Identity, "parallel_move")?);
            }

            compiler.set_cursor(ValueCondition::branch(terminal, arrived));
            Ok(compiler.cursor().peek().clone())
        })
    }

    /// Traverses and returns the arrival state.
    fn arrive(
        &mut self,
        traversal: &Traversal,
        hooks: &dyn Hooks,
        operation: &str,
    ) -> Result<Symbol, TuringError> {
        match self.traverse(traversal, hooks)? {
            ValueCondition::Single { state, .. } => Ok(state),
            other => Err(TuringError::UndeterminedState(format!(
                "{operation} arrived at {other}"
            ))),
        }
    }
}

fn single_terminal(traversal: &Traversal, operation: &str) -> Result<Symbol, TuringError> {
    match unique(&traversal.terminals).as_slice() {
        [terminal] => Ok(terminal.clone()),
        _ => Err(TuringError::Configuration(format!(
            "{operation} needs exactly one terminal value"
        ))),
    }
}
