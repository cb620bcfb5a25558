//! The macro compiler: turns cursor-level moves into transition table entries.
//!
//! Every operation checks the cursor shape it needs, emits rules into the owned
//! machine and leaves the cursor describing where the program now is.

use crate::allocator::SymbolAllocator;
use crate::cursor::{Cursor, ValueCondition};
use crate::machine::TuringMachine;
use crate::types::{Action, Program, Rule, Step, Symbol, TuringError, DEFAULT_SIGN};

/// How the state a move leads to is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextState {
    /// Stay in the current state.
    Prev,
    /// Allocate a fresh state.
    Auto,
    /// Use the given state.
    Named(Symbol),
}

impl From<&str> for NextState {
    fn from(state: &str) -> Self {
        NextState::Named(state.to_string())
    }
}

impl From<String> for NextState {
    fn from(state: String) -> Self {
        NextState::Named(state)
    }
}

/// A move from a single cursor position.
///
/// `write` defaults to the value under the head. `suppose` is the value the
/// program expects to find after the move and defaults to `write`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub action: Action,
    pub write: Option<Symbol>,
    pub suppose: Option<Symbol>,
    pub next: Option<NextState>,
}

impl Move {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            write: None,
            suppose: None,
            next: None,
        }
    }

    pub fn right() -> Self {
        Self::new(Action::Right)
    }

    pub fn left() -> Self {
        Self::new(Action::Left)
    }

    pub fn stay() -> Self {
        Self::new(Action::Stay)
    }

    pub fn write(mut self, value: impl Into<Symbol>) -> Self {
        self.write = Some(value.into());
        self
    }

    pub fn suppose(mut self, value: impl Into<Symbol>) -> Self {
        self.suppose = Some(value.into());
        self
    }

    pub fn to(mut self, next: impl Into<NextState>) -> Self {
        self.next = Some(next.into());
        self
    }
}

/// One symbol for every branch, or one symbol per branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Spread {
    Same(Symbol),
    Each(Vec<Symbol>),
}

impl Spread {
    fn expand(&self, len: usize, what: &str) -> Result<Vec<Symbol>, TuringError> {
        match self {
            Spread::Same(value) => Ok(vec![value.clone(); len]),
            Spread::Each(values) if values.len() == len => Ok(values.clone()),
            Spread::Each(values) => Err(TuringError::Configuration(format!(
                "{} {what} for a branch of {len} states",
                values.len()
            ))),
        }
    }
}

/// How the states of a branch move are chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStates {
    /// Every branch stays in its own state.
    Prev,
    /// Every branch gets a fresh state.
    Auto,
    /// One state per branch.
    Named(Vec<Symbol>),
}

/// A move applied to every state of a `Branch` cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchMove {
    pub action: Action,
    pub write: Option<Spread>,
    pub suppose: Option<Spread>,
    pub next: NextStates,
}

impl BranchMove {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            write: None,
            suppose: None,
            next: NextStates::Prev,
        }
    }

    pub fn right() -> Self {
        Self::new(Action::Right)
    }

    pub fn left() -> Self {
        Self::new(Action::Left)
    }

    pub fn stay() -> Self {
        Self::new(Action::Stay)
    }

    pub fn write(mut self, write: Spread) -> Self {
        self.write = Some(write);
        self
    }

    pub fn suppose(mut self, suppose: Spread) -> Self {
        self.suppose = Some(suppose);
        self
    }

    pub fn to(mut self, next: NextStates) -> Self {
        self.next = next;
        self
    }
}

/// Builds a transition table on top of a machine.
///
/// The compiler owns the machine and one allocator per symbol namespace. States
/// continue the numbering of the initial state (`q1` leads to `q2`, `q3`, ...)
/// when it has the `letters + digits` form.
pub struct MacroCompiler {
    machine: TuringMachine,
    states: SymbolAllocator,
    values: SymbolAllocator,
    cursor: Cursor,
}

impl MacroCompiler {
    /// Wraps `machine`, reserving every symbol it already uses.
    pub fn new(machine: TuringMachine) -> Self {
        let mut states = SymbolAllocator::new();
        let mut values = SymbolAllocator::new();

        let state = machine.state().to_string();
        if states.set_template(&state).is_err() {
            states.reserve([state.clone()]);
        }

        values.reserve(machine.tape().cells().cloned());
        values.reserve([machine.default().clone(), DEFAULT_SIGN.to_string()]);
        for rule in machine.rules() {
            values.reserve([rule.value, rule.next_value]);
            states.reserve([rule.state, rule.next_state]);
        }

        let cursor = Cursor::new(ValueCondition::single(machine.symbol().clone(), state));

        Self {
            machine,
            states,
            values,
            cursor,
        }
    }

    /// Builds the machine from `program` and wraps it.
    pub fn from_program(program: Program) -> Result<Self, TuringError> {
        Ok(Self::new(TuringMachine::new(program)?))
    }

    pub fn machine(&self) -> &TuringMachine {
        &self.machine
    }

    pub fn into_machine(self) -> TuringMachine {
        self.machine
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// The machine's default filler.
    pub fn filler(&self) -> Symbol {
        self.machine.default().clone()
    }

    /// Allocates a state that appears nowhere in the table.
    pub fn new_state(&mut self) -> Symbol {
        self.states.pop()
    }

    /// Allocates a tape value that appears nowhere on the tape or in the table.
    pub fn new_value(&mut self) -> Symbol {
        self.values.pop()
    }

    /// Declares values and states the allocators must never hand out.
    pub fn reserve<V, S>(&mut self, values: V, states: S)
    where
        V: IntoIterator,
        V::Item: Into<Symbol>,
        S: IntoIterator,
        S::Item: Into<Symbol>,
    {
        self.values.reserve(values);
        self.states.reserve(states);
    }

    /// Replaces the cursor and marks it up to date. Its symbols are reserved.
    pub fn set_cursor(&mut self, current: ValueCondition) {
        self.values.reserve(current.values().into_iter().cloned());
        self.states.reserve(current.states().into_iter().cloned());
        self.cursor.set(current);
    }

    /// Runs `build` as one operation: when it fails, every rule it added, every
    /// symbol it allocated and its cursor changes are undone.
    pub(crate) fn atomic<T>(
        &mut self,
        build: impl FnOnce(&mut Self) -> Result<T, TuringError>,
    ) -> Result<T, TuringError> {
        let rules = self.machine.rule_count();
        let states = self.states.clone();
        let values = self.values.clone();
        let cursor = self.cursor.clone();

        let result = build(self);
        if let Err(error) = &result {
            tracing::debug!(%error, dropped = self.machine.rule_count() - rules, "rollback");
            self.machine.truncate_rules(rules);
            self.states = states;
            self.values = values;
            self.cursor = cursor;
        }
        result
    }

    /// Adds a rule and reserves its symbols.
    pub(crate) fn emit(
        &mut self,
        value: &str,
        state: &str,
        next_value: &str,
        next_state: &str,
        action: Action,
    ) -> Result<(), TuringError> {
        self.values.reserve([value, next_value]);
        self.states.reserve([state, next_state]);

        let rule = Rule::new(value, state, next_value, next_state, action);
        tracing::debug!(%rule, "emit");
        self.machine.add_rule(rule)
    }

    /// Writes a rule straight into the table.
    ///
    /// The cursor no longer describes the program afterwards; call
    /// [`MacroCompiler::set_cursor`] before the next operation.
    pub fn manual_rule(
        &mut self,
        value: &str,
        state: &str,
        next_value: &str,
        next_state: &str,
        action: Action,
    ) -> Result<(), TuringError> {
        self.atomic(|compiler| {
            compiler.cursor.mark_stale();
            compiler.emit(value, state, next_value, next_state, action)
        })
    }

    fn resolve(&mut self, next: NextState, current: &str) -> Symbol {
        match next {
            NextState::Prev => current.to_string(),
            NextState::Auto => self.new_state(),
            NextState::Named(state) => state,
        }
    }

    /// Emits one rule from a `Single` cursor.
    ///
    /// The next state defaults to the current one. The cursor becomes
    /// `Single(suppose, next)`.
    pub fn single_move(&mut self, step: Move) -> Result<ValueCondition, TuringError> {
        self.atomic(|compiler| {
            let (value, state) = compiler.cursor.single("single_move")?;

            let next = compiler.resolve(step.next.unwrap_or(NextState::Prev), &state);
            let write = step.write.unwrap_or_else(|| value.clone());
            let suppose = step.suppose.unwrap_or_else(|| write.clone());

            compiler.emit(&value, &state, &write, &next, step.action)?;
            compiler.cursor.set(ValueCondition::single(suppose, next));
            Ok(compiler.cursor.peek().clone())
        })
    }

    /// Joins every state of a `Branch` cursor into one destination.
    ///
    /// The destination defaults to a fresh state. `NextState::Prev` is refused since
    /// a branch has no single previous state.
    pub fn join(&mut self, step: Move) -> Result<ValueCondition, TuringError> {
        self.atomic(|compiler| {
            let (value, states) = compiler.cursor.branch("join")?;

            let next = match step.next.unwrap_or(NextState::Auto) {
                NextState::Prev => {
                    return Err(TuringError::UndeterminedState(format!(
                        "join of {} can not stay in the previous state",
                        compiler.cursor.peek()
                    )))
                }
                other => compiler.resolve(other, &value),
            };
            let write = step.write.unwrap_or_else(|| value.clone());
            let suppose = step.suppose.unwrap_or_else(|| write.clone());

            for state in &states {
                compiler.emit(&value, state, &write, &next, step.action)?;
            }

            compiler.cursor.set(ValueCondition::single(suppose, next));
            Ok(compiler.cursor.peek().clone())
        })
    }

    /// Moves every state of a `Branch` cursor on its own.
    ///
    /// The cursor stays a `Branch` when every path expects the same value and
    /// becomes `Pairs` otherwise.
    pub fn branch_move(&mut self, step: BranchMove) -> Result<ValueCondition, TuringError> {
        self.atomic(|compiler| compiler.plan_branch_move(step))
    }

    fn plan_branch_move(&mut self, step: BranchMove) -> Result<ValueCondition, TuringError> {
        let (value, states) = self.cursor.branch("branch_move")?;
        let len = states.len();

        let writes = match &step.write {
            Some(spread) => spread.expand(len, "values to write")?,
            None => vec![value.clone(); len],
        };
        let supposed = match &step.suppose {
            Some(spread) => spread.expand(len, "supposed values")?,
            None => writes.clone(),
        };
        let nexts = match step.next {
            NextStates::Prev => states.clone(),
            NextStates::Auto => (0..len).map(|_| self.new_state()).collect(),
            NextStates::Named(named) => Spread::Each(named).expand(len, "next states")?,
        };

        for ((state, write), next) in states.iter().zip(&writes).zip(&nexts) {
            self.emit(&value, state, write, next, step.action)?;
        }

        let current = if len > 0 && supposed.iter().all(|v| *v == supposed[0]) {
            ValueCondition::branch(supposed[0].clone(), nexts)
        } else {
            ValueCondition::pairs(supposed, nexts)?
        };

        self.cursor.set(current);
        Ok(self.cursor.peek().clone())
    }

    /// Emits one rule from a `Single` cursor whose landing cell may hold any of `values`.
    ///
    /// The cursor becomes `Pairs(values, [next; n])`.
    pub fn parallelise_by_vals<I, S>(
        &mut self,
        step: Move,
        values: I,
    ) -> Result<ValueCondition, TuringError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        let values: Vec<Symbol> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(TuringError::Configuration(
                "parallelise_by_vals needs at least one value".into(),
            ));
        }

        self.atomic(|compiler| {
            let next = match compiler.single_move(step)? {
                ValueCondition::Single { state, .. } => state,
                other => return Err(TuringError::UndeterminedState(other.to_string())),
            };

            compiler.values.reserve(values.iter().cloned());
            let states = vec![next; values.len()];
            compiler.cursor.set(ValueCondition::pairs(values, states)?);
            Ok(compiler.cursor.peek().clone())
        })
    }

    /// Emits the halting rule for a `Single` cursor.
    pub fn stop(&mut self) -> Result<ValueCondition, TuringError> {
        self.atomic(|compiler| {
            let (value, state) = compiler.cursor.single("stop")?;

            compiler.emit(&value, &state, &value, &state, Action::Halt)?;
            Ok(compiler.cursor.peek().clone())
        })
    }

    /// Runs the compiled machine.
    pub fn run(&mut self) -> Step {
        self.machine.run()
    }
}
