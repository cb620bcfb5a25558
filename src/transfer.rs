//! Copying and moving a range of cells to another place on the tape.
//!
//! The tape is expected to look like
//! `[cursor value, *values, end, *between, start, *after, filler...]` read in the
//! transfer direction. Each source cell is swapped for a placeholder, its value
//! carried over to a marker past the destination and written there, and the
//! marker pushed one cell on. When the source is used up the marker is erased
//! and the placeholders are turned back into their values (copy) or into the
//! filler (move).

use std::collections::HashMap;

use crate::compiler::{BranchMove, MacroCompiler, Move, NextState, NextStates, Spread};
use crate::cursor::ValueCondition;
use crate::traversal::{unique, Relocate, Traversal};
use crate::types::{Action, Symbol, TuringError};

/// The symbols that delimit a transfer.
///
/// Boundaries are described by value, not by offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeLayout {
    /// Values the source range is made of.
    pub values: Vec<Symbol>,
    /// The value right after the source range.
    pub end: Symbol,
    /// Values between `end` and `start`.
    pub between: Vec<Symbol>,
    /// The value right before the destination.
    pub start: Symbol,
    /// Values already following `start`; the copy goes after them.
    pub after: Vec<Symbol>,
    pub direction: Action,
}

impl RangeLayout {
    pub fn new<V>(
        values: V,
        end: impl Into<Symbol>,
        start: impl Into<Symbol>,
        direction: Action,
    ) -> Self
    where
        V: IntoIterator,
        V::Item: Into<Symbol>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            end: end.into(),
            between: Vec::new(),
            start: start.into(),
            after: Vec::new(),
            direction,
        }
    }

    pub fn between<I>(mut self, between: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Symbol>,
    {
        self.between = between.into_iter().map(Into::into).collect();
        self
    }

    pub fn after<I>(mut self, after: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Symbol>,
    {
        self.after = after.into_iter().map(Into::into).collect();
        self
    }

    /// Checks the layout against the cursor value and the filler.
    fn validate(&self, origin: &str, filler: &str) -> Result<(), TuringError> {
        let invalid = |reason: String| Err(TuringError::Configuration(reason));

        if !self.direction.is_move() {
            return invalid(format!("Range transfer can not go '{}'", self.direction));
        }
        if self.values.is_empty() {
            return invalid("Range transfer needs at least one source value".into());
        }

        let boundaries = [origin, self.end.as_str(), self.start.as_str()];
        for (i, a) in boundaries.iter().enumerate() {
            if boundaries[i + 1..].contains(a) {
                return invalid(format!("Boundary '{a}' is used twice"));
            }
        }

        for boundary in boundaries {
            let overlaps = self
                .values
                .iter()
                .chain(&self.between)
                .chain(&self.after)
                .any(|v| v == boundary);
            if overlaps {
                return invalid(format!("Boundary '{boundary}' is also an interior value"));
            }
        }

        if self.after.iter().any(|v| v == filler) {
            return invalid(format!(
                "The filler '{filler}' can not follow the destination"
            ));
        }

        Ok(())
    }

    /// Every value between the source's first cell and the marker.
    fn crossed(&self) -> Vec<Symbol> {
        let all: Vec<Symbol> = self
            .values
            .iter()
            .chain([&self.end])
            .chain(&self.between)
            .chain([&self.start])
            .chain(&self.after)
            .cloned()
            .collect();
        unique(&all)
    }
}

impl MacroCompiler {
    /// Copies the source range after the destination.
    ///
    /// Needs a `Single` cursor on the cell before the source range. The cursor ends
    /// there again, as `Single(cursor value, state)`.
    pub fn copy_range(&mut self, layout: &RangeLayout) -> Result<ValueCondition, TuringError> {
        self.transfer(layout, false)
    }

    /// [`MacroCompiler::copy_range`], erasing the source range afterwards.
    pub fn move_range(&mut self, layout: &RangeLayout) -> Result<ValueCondition, TuringError> {
        self.transfer(layout, true)
    }

    fn transfer(&mut self, layout: &RangeLayout, erase: bool) -> Result<ValueCondition, TuringError> {
        self.atomic(|compiler| compiler.plan_transfer(layout, erase))
    }

    fn plan_transfer(
        &mut self,
        layout: &RangeLayout,
        erase: bool,
    ) -> Result<ValueCondition, TuringError> {
        let (origin, _) = self.cursor().single("transfer")?;
        let filler = self.filler();
        layout.validate(&origin, &filler)?;

        let forward = layout.direction;
        let back = forward.opposite();
        let values = unique(&layout.values);
        let crossed = layout.crossed();

        // Placeholders must never match a value of the layout
        self.reserve(
            crossed.iter().chain([&origin, &filler]).cloned(),
            Vec::<Symbol>::new(),
        );
        let marker = self.new_value();
        let placeholders: Vec<Symbol> = values.iter().map(|_| self.new_value()).collect();

        tracing::debug!(
            %origin,
            %marker,
            values = values.len(),
            erase,
            "range transfer"
        );

        // Plant the marker past the destination
        self.move_by_val(&Traversal::new(&values, [&layout.end], forward))?;
        self.move_by_val(&Traversal::new(&layout.between, [&layout.start], forward))?;
        self.put_by_val(
            &Traversal::new(&layout.after, [&filler], forward),
            Some(marker.clone()),
        )?;

        // Back to the source
        let returning: Vec<&Symbol> = layout
            .after
            .iter()
            .chain(&layout.between)
            .chain([&layout.start])
            .collect();
        self.move_by_val(&Traversal::new(returning, [&layout.end], back))?;
        self.move_by_val(&Traversal::new(&values, [&origin], back))?;

        // Each pass of the loop starts on the next source cell
        let pass = match self.single_move(Move::new(forward).to(NextState::Auto))? {
            ValueCondition::Single { state, .. } => state,
            other => return Err(TuringError::UndeterminedState(other.to_string())),
        };

        // Swap the cell for its placeholder and carry the value to the marker
        self.set_cursor(ValueCondition::pairs(
            values.iter().cloned(),
            vec![pass.clone(); values.len()],
        )?);
        let relocate = Relocate(
            values
                .iter()
                .cloned()
                .zip(placeholders.iter().cloned())
                .collect::<HashMap<_, _>>(),
        );
        self.parallelise_with(&Traversal::new(&crossed, [&marker], forward), &relocate)?;

        // Write the value and push the marker on
        self.branch_move(
            BranchMove::new(forward)
                .write(Spread::Each(values.clone()))
                .suppose(Spread::Same(filler.clone()))
                .to(NextStates::Auto),
        )?;
        self.join(Move::stay().write(marker.clone()))?;

        // Back to the last placeholder, then on to the next source cell
        let found = self.move_by_val(&Traversal::new(&crossed, &placeholders, back))?;
        for (placeholder, state) in found.values().into_iter().zip(found.states()) {
            self.emit(placeholder, state, placeholder, &pass, forward)?;
        }

        // The source is used up once `end` shows up: erase the marker
        self.set_cursor(ValueCondition::single(layout.end.clone(), pass));
        self.put_by_val(
            &Traversal::new(&crossed, [&marker], forward),
            Some(filler.clone()),
        )?;
        self.move_by_val(&Traversal::new(&crossed, [&layout.end], back))?;

        // Restore the placeholders on the way back to the origin
        let cleanup = match self.single_move(Move::new(back).to(NextState::Auto))? {
            ValueCondition::Single { state, .. } => state,
            other => return Err(TuringError::UndeterminedState(other.to_string())),
        };
        for (placeholder, value) in placeholders.iter().zip(&values) {
            let restored = if erase { &filler } else { value };
            self.emit(placeholder, &cleanup, restored, &cleanup, back)?;
        }

        let done = self.new_state();
        self.emit(&origin, &cleanup, &origin, &done, Action::Stay)?;

        self.set_cursor(ValueCondition::single(origin, done));
        Ok(self.cursor().peek().clone())
    }
}
