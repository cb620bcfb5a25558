//! An unbounded tape that grows in both directions.
//!
//! Logical indices never change meaning: cells added on the left shift the
//! backing storage, and `origin` records where logical index 0 lives in it.

use std::collections::VecDeque;
use std::fmt;

use crate::types::Symbol;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: VecDeque<Symbol>,
    /// Storage position of logical index 0.
    origin: usize,
    filler: Symbol,
}

impl Tape {
    /// Creates a tape holding `cells` from logical index 0 on.
    /// An empty tape starts out with a single filler cell.
    pub fn new<I, S>(cells: I, filler: impl Into<Symbol>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        let filler = filler.into();
        let mut cells: VecDeque<Symbol> = cells.into_iter().map(Into::into).collect();
        if cells.is_empty() {
            cells.push_back(filler.clone());
        }

        Self {
            cells,
            origin: 0,
            filler,
        }
    }

    /// The symbol written into cells the tape grows into.
    pub fn filler(&self) -> &Symbol {
        &self.filler
    }

    /// Storage position of logical index 0.
    pub fn origin(&self) -> usize {
        self.origin
    }

    /// Logical index of the leftmost stored cell.
    pub fn leftmost(&self) -> i64 {
        -(self.origin as i64)
    }

    /// Logical index of the rightmost stored cell.
    pub fn rightmost(&self) -> i64 {
        self.cells.len() as i64 - 1 - self.origin as i64
    }

    /// Number of stored cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Grows the tape until `index` is stored and returns its storage position.
    fn slot(&mut self, index: i64) -> usize {
        while index < self.leftmost() {
            self.cells.push_front(self.filler.clone());
            self.origin += 1;
        }
        while index > self.rightmost() {
            self.cells.push_back(self.filler.clone());
        }

        (self.origin as i64 + index) as usize
    }

    /// Returns the symbol at `index`, growing the tape if needed.
    pub fn get(&mut self, index: i64) -> &Symbol {
        let slot = self.slot(index);
        &self.cells[slot]
    }

    /// Returns the symbol at `index` without growing the tape; cells outside
    /// the stored range read as the filler.
    pub fn peek(&self, index: i64) -> &Symbol {
        if index < self.leftmost() || index > self.rightmost() {
            return &self.filler;
        }

        &self.cells[(self.origin as i64 + index) as usize]
    }

    /// Writes `value` at `index`, growing the tape if needed.
    pub fn set(&mut self, index: i64, value: impl Into<Symbol>) {
        let slot = self.slot(index);
        self.cells[slot] = value.into();
    }

    /// All stored cells, left to right.
    pub fn cells(&self) -> impl Iterator<Item = &Symbol> {
        self.cells.iter()
    }

    /// Symbols from `from` to `to` inclusive; cells outside the stored range read as filler.
    pub fn window(&self, from: i64, to: i64) -> Vec<Symbol> {
        (from..=to).map(|i| self.peek(i).clone()).collect()
    }

    /// Stored content with the filler cells at both ends stripped.
    pub fn trimmed(&self) -> Vec<Symbol> {
        let start = self.cells.iter().position(|c| *c != self.filler);
        let end = self.cells.iter().rposition(|c| *c != self.filler);

        match (start, end) {
            (Some(start), Some(end)) => self.cells.range(start..=end).cloned().collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<&str> = self.cells.iter().map(String::as_str).collect();
        write!(f, "[{}]", cells.join(", "))
    }
}
