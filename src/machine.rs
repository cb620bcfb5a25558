//! This module defines the `TuringMachine` struct, the interpreter that executes a
//! transition table over an unbounded tape. It owns the table, enforces that each
//! `(value, state)` key has a single outcome, and applies one rule per step.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::parser::{parse, parse_rules};
use crate::tape::Tape;
use crate::types::{Action, Program, Rule, Step, Symbol, Transition, TuringError};

/// Callback invoked with every rule the interpreter applies.
pub type StepHook = Box<dyn FnMut(&Rule)>;

type Key = (Symbol, Symbol);

/// A single-tape Turing machine.
///
/// The machine remembers the program it was built from so it can be reset,
/// while the rule table keeps growing as a compiler adds to it.
pub struct TuringMachine {
    tape: Tape,
    index: i64,
    state: Symbol,
    halted: bool,
    rules: HashMap<Key, Transition>,
    /// Keys in insertion order, for dumps and encodings.
    order: Vec<Key>,
    log: Vec<Rule>,
    step_count: usize,
    program: Program,
    hook: Option<StepHook>,
}

impl TuringMachine {
    /// Creates a machine from a `Program`.
    ///
    /// # Errors
    ///
    /// * `TuringError::Conflict` if the program holds two different rules for the same key.
    pub fn new(program: Program) -> Result<Self, TuringError> {
        let mut machine = Self {
            tape: Tape::new(program.tape.clone(), program.default.clone()),
            index: program.index,
            state: program.initial_state.clone(),
            halted: false,
            rules: HashMap::new(),
            order: Vec::new(),
            log: Vec::new(),
            step_count: 0,
            program,
            hook: None,
        };

        for rule in machine.program.rules.clone() {
            machine.add_rule(rule)?;
        }

        Ok(machine)
    }

    /// Creates a machine that reports every applied rule to `hook`.
    pub fn with_hook(program: Program, hook: StepHook) -> Result<Self, TuringError> {
        let mut machine = Self::new(program)?;
        machine.hook = Some(hook);
        Ok(machine)
    }

    /// Replaces the step hook.
    pub fn set_hook(&mut self, hook: Option<StepHook>) {
        self.hook = hook;
    }

    /// Adds `(value, state) -> (next_value, next_state, action)` to the table.
    ///
    /// Adding a rule that is already present is a no-op.
    ///
    /// # Errors
    ///
    /// * `TuringError::Conflict` if the key already leads somewhere else.
    pub fn set_rule(
        &mut self,
        value: &str,
        state: &str,
        next_value: &str,
        next_state: &str,
        action: Action,
    ) -> Result<(), TuringError> {
        self.add_rule(Rule::new(value, state, next_value, next_state, action))
    }

    /// Adds a complete rule to the table, see [`TuringMachine::set_rule`].
    pub fn add_rule(&mut self, rule: Rule) -> Result<(), TuringError> {
        let requested = rule.to_string();
        let (key, transition) = rule.into_parts();

        if let Some(existing) = self.rules.get(&key) {
            if *existing == transition {
                return Ok(());
            }

            return Err(TuringError::Conflict {
                existing: Self::render(&key, existing).to_string(),
                value: key.0,
                state: key.1,
                requested,
            });
        }

        self.order.push(key.clone());
        self.rules.insert(key, transition);
        Ok(())
    }

    /// Adds rules written as `value state -> next_value next_state action`,
    /// separated by commas or newlines. `DEF` stands for the default filler.
    pub fn rule_str(&mut self, rules: &str) -> Result<(), TuringError> {
        for rule in parse_rules(rules, self.tape.filler())? {
            self.add_rule(rule)?;
        }

        Ok(())
    }

    /// Looks up the transition for a key.
    pub fn rule(&self, value: &str, state: &str) -> Option<&Transition> {
        self.rules.get(&(value.to_string(), state.to_string()))
    }

    /// All rules in insertion order.
    pub fn rules(&self) -> Vec<Rule> {
        self.order
            .iter()
            .map(|key| Self::render(key, &self.rules[key]))
            .collect()
    }

    /// Number of rules in the table.
    pub fn rule_count(&self) -> usize {
        self.order.len()
    }

    /// Drops every rule added after the first `len`.
    pub(crate) fn truncate_rules(&mut self, len: usize) {
        for key in self.order.drain(len.min(self.order.len())..) {
            self.rules.remove(&key);
        }
    }

    fn render(key: &Key, transition: &Transition) -> Rule {
        Rule::new(
            key.0.clone(),
            key.1.clone(),
            transition.next_value.clone(),
            transition.next_state.clone(),
            transition.action,
        )
    }

    /// The whole table, one rule per line.
    fn table(&self) -> String {
        self.rules()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Applies the rule for the value under the head in the current state.
    ///
    /// # Returns
    ///
    /// * `Step::Continue` after a moving or staying rule.
    /// * `Step::Halted` after a halting rule, and on every call once halted.
    /// * `Step::Failed(TuringError::MissingRule)` if no rule matches. The tape,
    ///   head and state are left exactly as they were.
    pub fn step(&mut self) -> Step {
        if self.halted {
            return Step::Halted;
        }

        let key = (self.tape.get(self.index).clone(), self.state.clone());
        let transition = match self.rules.get(&key) {
            Some(t) => t.clone(),
            None => {
                tracing::warn!(value = %key.0, state = %key.1, index = self.index, "no rule");
                return Step::Failed(TuringError::MissingRule {
                    value: key.0,
                    state: key.1,
                    table: self.table(),
                });
            }
        };

        let rule = Self::render(&key, &transition);
        tracing::trace!(step = self.step_count, index = self.index, %rule, "apply");
        if let Some(hook) = self.hook.as_mut() {
            hook(&rule);
        }

        self.tape.set(self.index, transition.next_value);
        self.state = transition.next_state;

        match transition.action {
            Action::Left => {
                self.index -= 1;
                self.tape.get(self.index);
            }
            Action::Right => {
                self.index += 1;
                self.tape.get(self.index);
            }
            Action::Stay => {}
            Action::Halt => self.halted = true,
        }

        self.log.push(rule);
        self.step_count += 1;

        if self.halted {
            Step::Halted
        } else {
            Step::Continue
        }
    }

    /// Steps until the machine halts or no rule matches.
    ///
    /// A program that never halts keeps this looping.
    pub fn run(&mut self) -> Step {
        loop {
            match self.step() {
                Step::Continue => continue,
                end => return end,
            }
        }
    }

    /// Restores the tape, head and state of the initial program. The rule table is kept.
    pub fn reset(&mut self) {
        self.tape = Tape::new(self.program.tape.clone(), self.program.default.clone());
        self.index = self.program.index;
        self.state = self.program.initial_state.clone();
        self.halted = false;
        self.log.clear();
        self.step_count = 0;
    }

    /// Returns the current state.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Returns the head position.
    pub fn index(&self) -> i64 {
        self.index
    }

    /// Returns the value under the head.
    pub fn symbol(&self) -> &Symbol {
        self.tape.peek(self.index)
    }

    /// Returns the default filler.
    pub fn default(&self) -> &Symbol {
        self.tape.filler()
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Returns the total number of rules applied.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Every rule applied so far, in order.
    pub fn log(&self) -> &[Rule] {
        &self.log
    }

    /// The program this machine was created from.
    pub fn initial_program(&self) -> &Program {
        &self.program
    }

    /// Captures the current tape, head, state and table as a `Program`.
    pub fn to_program(&self) -> Program {
        Program {
            tape: self.tape.cells().cloned().collect(),
            index: self.index - self.tape.leftmost(),
            default: self.tape.filler().clone(),
            initial_state: self.state.clone(),
            rules: self.rules(),
        }
    }

    /// The dump without the rule list.
    pub fn view(&self) -> String {
        let tape: Vec<String> = (self.tape.leftmost()..=self.tape.rightmost())
            .map(|i| {
                let cell = self.tape.peek(i);
                if i == self.index {
                    format!("[{cell}]")
                } else {
                    cell.clone()
                }
            })
            .collect();

        format!(
            "Index: {}\nState: {}\nDefault: {}\nOrigin: {}\nTape: {}\n",
            self.index,
            self.state,
            self.tape.filler(),
            self.tape.origin(),
            tape.join(", ")
        )
    }
}

impl FromStr for TuringMachine {
    type Err = TuringError;

    /// Builds a machine from the textual encoding, see [`crate::parser::parse`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(parse(s)?)
    }
}

impl fmt::Display for TuringMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TuringMachine(")?;
        write!(f, "{}", self.view())?;
        writeln!(f, "Rules:")?;
        for rule in self.rules() {
            writeln!(f, "{rule}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn create_program() -> Program {
        Program::new(["1", "2", "3"], "q1")
    }

    #[test]
    fn test_machine_creation() {
        let machine = TuringMachine::new(create_program()).unwrap();

        assert_eq!(machine.state(), "q1");
        assert_eq!(machine.index(), 0);
        assert_eq!(machine.symbol(), "1");
        assert_eq!(machine.step_count(), 0);
        assert!(!machine.is_halted());
    }

    #[test]
    fn test_set_rule_is_idempotent() {
        let mut machine = TuringMachine::new(create_program()).unwrap();

        machine.set_rule("1", "q1", "0", "q1", Action::Left).unwrap();
        machine.set_rule("1", "q1", "0", "q1", Action::Left).unwrap();

        assert_eq!(machine.rule_count(), 1);
    }

    #[test]
    fn test_set_rule_conflict() {
        let mut machine = TuringMachine::new(create_program()).unwrap();
        machine.set_rule("1", "q1", "0", "q1", Action::Left).unwrap();

        let error = machine
            .set_rule("1", "q1", "0", "q2", Action::Left)
            .unwrap_err();

        match error {
            TuringError::Conflict { value, state, .. } => {
                assert_eq!(value, "1");
                assert_eq!(state, "q1");
            }
            other => panic!("Expected a conflict, got {other:?}"),
        }
        assert_eq!(machine.rule("1", "q1").unwrap().next_state, "q1");
    }

    #[test]
    fn test_step_and_halt() {
        let mut machine = TuringMachine::new(create_program()).unwrap();
        machine
            .rule_str("1 q1 -> 0 q1 R,2 q1 -> 1 q2 L,0 q2 -> 0 q2 STOP")
            .unwrap();

        assert_eq!(machine.step(), Step::Continue);
        assert_eq!(machine.index(), 1);
        assert_eq!(machine.step(), Step::Continue);
        assert_eq!(machine.state(), "q2");
        assert_eq!(machine.index(), 0);
        assert_eq!(machine.step(), Step::Halted);
        assert!(machine.is_halted());

        // Halting is permanent
        assert_eq!(machine.step(), Step::Halted);
        assert_eq!(machine.step_count(), 3);
        assert_eq!(machine.tape().trimmed(), vec!["0", "1", "3"]);
    }

    #[test]
    fn test_move_left_grows_tape() {
        let mut machine = TuringMachine::new(create_program().with_default("_")).unwrap();
        machine
            .rule_str("1 q1 -> x q1 L,_ q1 -> y q1 STOP")
            .unwrap();

        assert_eq!(machine.run(), Step::Halted);
        assert_eq!(machine.index(), -1);
        assert_eq!(machine.tape().origin(), 1);
        assert_eq!(machine.tape().trimmed(), vec!["y", "x", "2", "3"]);
    }

    #[test]
    fn test_default_sign_in_rules() {
        let mut machine = TuringMachine::new(Program::new(["1"], "q1")).unwrap();
        machine.rule_str("1 q1 -> 1 q1 R,DEF q1 -> 2 q2 STOP").unwrap();

        assert_eq!(machine.run(), Step::Halted);
        assert_eq!(machine.tape().trimmed(), vec!["1", "2"]);
        assert!(machine.rule("", "q1").is_some());
    }

    #[test]
    fn test_missing_rule_freezes_machine() {
        let mut machine = TuringMachine::new(create_program()).unwrap();
        machine.rule_str("1 q1 -> 0 q1 R").unwrap();

        match machine.run() {
            Step::Failed(TuringError::MissingRule { value, state, table }) => {
                assert_eq!(value, "2");
                assert_eq!(state, "q1");
                assert!(table.contains("1 q1 -> 0 q1 R"));
            }
            other => panic!("Expected a missing rule, got {other:?}"),
        }

        assert_eq!(machine.index(), 1);
        assert_eq!(machine.step_count(), 1);
        assert_eq!(machine.log().len(), 1);
        assert_eq!(machine.tape().trimmed(), vec!["0", "2", "3"]);
        assert!(!machine.is_halted());
    }

    #[test]
    fn test_step_hook_sees_every_rule() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let hook: StepHook = Box::new(move |rule: &Rule| sink.borrow_mut().push(rule.to_string()));

        let mut machine = TuringMachine::with_hook(create_program(), hook).unwrap();
        machine.rule_str("1 q1 -> 0 q1 R,2 q1 -> 2 q1 STOP").unwrap();
        machine.run();

        assert_eq!(
            *seen.borrow(),
            vec!["1 q1 -> 0 q1 R".to_string(), "2 q1 -> 2 q1 STOP".to_string()]
        );
    }

    #[test]
    fn test_reset_keeps_rules() {
        let mut machine = TuringMachine::new(create_program()).unwrap();
        machine.rule_str("1 q1 -> 0 q2 R,2 q2 -> 2 q2 STOP").unwrap();
        machine.run();

        machine.reset();
        assert_eq!(machine.state(), "q1");
        assert_eq!(machine.index(), 0);
        assert_eq!(machine.tape().trimmed(), vec!["1", "2", "3"]);
        assert_eq!(machine.rule_count(), 2);
        assert!(!machine.is_halted());
        assert_eq!(machine.run(), Step::Halted);
    }

    #[test]
    fn test_to_program_after_left_growth() {
        let mut machine = TuringMachine::new(create_program().with_default("_")).unwrap();
        machine.rule_str("1 q1 -> 1 q2 L,_ q2 -> _ q3 STOP").unwrap();
        machine.run();

        let program = machine.to_program();
        assert_eq!(program.tape, vec!["_", "1", "2", "3"]);
        assert_eq!(program.index, 0);
        assert_eq!(program.initial_state, "q3");
        assert_eq!(program.rules.len(), 2);
    }

    #[test]
    fn test_dump() {
        let mut machine = TuringMachine::new(create_program()).unwrap();
        machine.rule_str("1 q1 -> 0 q1 R").unwrap();
        machine.step();

        let dump = machine.to_string();
        assert!(dump.starts_with("TuringMachine(\nIndex: 1\nState: q1\n"));
        assert!(dump.contains("Tape: 0, [2], 3"));
        assert!(dump.contains("Rules:\n1 q1 -> 0 q1 R\n)"));
        assert!(!machine.view().contains("Rules"));
    }

    #[test]
    fn test_from_str() {
        let machine: TuringMachine = "1,2,3:1:_:q1:2 q1 -> 0 q2 R".parse().unwrap();

        assert_eq!(machine.index(), 1);
        assert_eq!(machine.default(), "_");
        assert_eq!(machine.rule_count(), 1);
    }
}
