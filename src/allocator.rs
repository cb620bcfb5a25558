//! Generation of fresh, never-repeating symbols for states and tape values.
//!
//! The default generator walks every combination of the alphabet in order of
//! length (`a`, `b`, ..., `z`, `aa`, `ab`, ...), skipping combinations that
//! start with a digit. A template (`q43`) switches to `letter + counter`
//! names (`q44`, `q45`, ...). Either way, anything already reserved is skipped.

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::{Symbol, TuringError, DEFAULT_ALPHABET};

lazy_static! {
    static ref LABEL: Regex = Regex::new(r"^([a-zA-Z]+)([0-9]*)$").unwrap();
}

/// Splits a template label into its letters and numeric suffix (`0` when absent).
fn split_label(label: &str) -> Option<(&str, u64)> {
    let captures = LABEL.captures(label)?;
    let letter = captures.get(1)?.as_str();
    let suffix = captures.get(2).map_or("", |m| m.as_str());
    let counter = if suffix.is_empty() {
        0
    } else {
        suffix.parse().ok()?
    };

    Some((letter, counter))
}

/// Resumable position in the combinatorial sequence.
///
/// `digits[0]` indexes into the non-digit characters, the rest into the whole alphabet.
#[derive(Debug, Clone)]
struct Odometer {
    digits: Vec<usize>,
}

impl Odometer {
    fn new() -> Self {
        Self { digits: vec![0] }
    }

    fn current(&self, leading: &[char], alphabet: &[char]) -> Symbol {
        self.digits
            .iter()
            .enumerate()
            .map(|(i, &d)| if i == 0 { leading[d] } else { alphabet[d] })
            .collect()
    }

    fn advance(&mut self, leading: usize, alphabet: usize) {
        for i in (0..self.digits.len()).rev() {
            let base = if i == 0 { leading } else { alphabet };
            self.digits[i] += 1;
            if self.digits[i] < base {
                return;
            }
            self.digits[i] = 0;
        }

        // Every combination of this length is used up
        self.digits.push(0);
    }
}

#[derive(Debug, Clone)]
enum Mode {
    Combinatorial,
    Template(String),
}

/// Hands out symbols that were never handed out or reserved before.
#[derive(Debug, Clone)]
pub struct SymbolAllocator {
    alphabet: Vec<char>,
    leading: Vec<char>,
    odometer: Odometer,
    mode: Mode,
    /// Last counter issued per template letter.
    templates: HashMap<String, u64>,
    /// Highest label reserved by seeding, per template letter.
    floors: HashMap<String, u64>,
    reserved: HashSet<Symbol>,
}

impl Default for SymbolAllocator {
    fn default() -> Self {
        Self::build(DEFAULT_ALPHABET.chars().collect())
    }
}

impl SymbolAllocator {
    /// Creates an allocator over [`DEFAULT_ALPHABET`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an allocator over a custom alphabet.
    ///
    /// The alphabet needs at least one character that is not a digit, since
    /// generated names never start with one.
    pub fn with_alphabet(alphabet: &str) -> Result<Self, TuringError> {
        let mut chars: Vec<char> = Vec::new();
        for c in alphabet.chars() {
            if !chars.contains(&c) {
                chars.push(c);
            }
        }

        if !chars.iter().any(|c| !c.is_ascii_digit()) {
            return Err(TuringError::Configuration(format!(
                "Alphabet '{alphabet}' has no character a name can start with"
            )));
        }

        Ok(Self::build(chars))
    }

    fn build(alphabet: Vec<char>) -> Self {
        let leading = alphabet
            .iter()
            .copied()
            .filter(|c| !c.is_ascii_digit())
            .collect();

        Self {
            alphabet,
            leading,
            odometer: Odometer::new(),
            mode: Mode::Combinatorial,
            templates: HashMap::new(),
            floors: HashMap::new(),
            reserved: HashSet::new(),
        }
    }

    /// Returns a fresh symbol and reserves it.
    pub fn pop(&mut self) -> Symbol {
        loop {
            let candidate = match &self.mode {
                Mode::Combinatorial => {
                    let candidate = self.odometer.current(&self.leading, &self.alphabet);
                    self.odometer
                        .advance(self.leading.len(), self.alphabet.len());
                    Some(candidate)
                }
                Mode::Template(letter) => {
                    let counter = self.templates.entry(letter.clone()).or_insert(0);
                    counter.checked_add(1).map(|next| {
                        *counter = next;
                        format!("{letter}{next}")
                    })
                }
            };

            // An exhausted template falls back to the default generator
            let Some(candidate) = candidate else {
                self.mode = Mode::Combinatorial;
                continue;
            };

            if !self.is_reserved(&candidate) {
                self.reserved.insert(candidate.clone());
                return candidate;
            }
        }
    }

    /// Marks symbols as unavailable without consuming them.
    pub fn reserve<I, S>(&mut self, symbols: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        self.reserved.extend(symbols.into_iter().map(Into::into));
    }

    /// Checks whether `symbol` was already handed out or reserved.
    pub fn is_reserved(&self, symbol: &str) -> bool {
        if self.reserved.contains(symbol) {
            return true;
        }

        // Labels at or below a template's counter belong to that template
        match split_label(symbol) {
            Some((letter, counter)) if counter > 0 => self
                .floors
                .get(letter)
                .is_some_and(|&floor| counter <= floor),
            _ => false,
        }
    }

    /// Switches generation to `letter + counter` names continuing after `label`.
    ///
    /// `q43` continues with `q44`, `q` with `q1`. Every label up to and including
    /// `label` is reserved, so going back to the default generator can never
    /// produce one of them. Seeding a letter that was used before resumes from
    /// whichever counter is further along.
    pub fn set_template(&mut self, label: &str) -> Result<(), TuringError> {
        let (letter, counter) = split_label(label).ok_or_else(|| {
            TuringError::Configuration(format!("Disallowed template label: '{label}'"))
        })?;
        if counter == u64::MAX {
            return Err(TuringError::Configuration(format!(
                "Template label '{label}' has no successor"
            )));
        }

        let current = self.templates.entry(letter.to_string()).or_insert(0);
        *current = (*current).max(counter);
        let resume = *current;

        let floor = self.floors.entry(letter.to_string()).or_insert(0);
        *floor = (*floor).max(resume);

        self.reserved.insert(label.to_string());
        self.mode = Mode::Template(letter.to_string());

        tracing::debug!(label, letter, resume, "symbol template set");
        Ok(())
    }

    /// Resumes the default combinatorial generator where it stopped.
    pub fn clear_template(&mut self) {
        self.mode = Mode::Combinatorial;
    }

    /// Returns the letter of the active template, if any.
    pub fn template(&self) -> Option<&str> {
        match &self.mode {
            Mode::Template(letter) => Some(letter),
            Mode::Combinatorial => None,
        }
    }
}

impl Iterator for SymbolAllocator {
    type Item = Symbol;

    fn next(&mut self) -> Option<Symbol> {
        Some(self.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sequence() {
        let mut alloc = SymbolAllocator::new();
        let first: Vec<Symbol> = alloc.by_ref().take(3).collect();

        assert_eq!(first, vec!["a", "b", "c"]);

        // Single letters run out after 'z', then two-letter names follow
        let rest: Vec<Symbol> = alloc.by_ref().take(23).collect();
        assert_eq!(rest.last().unwrap(), "z");
        assert_eq!(alloc.pop(), "aa");
        assert_eq!(alloc.pop(), "ab");
    }

    #[test]
    fn test_never_starts_with_digit() {
        let alloc = SymbolAllocator::with_alphabet("1a").unwrap();
        let names: Vec<Symbol> = alloc.take(4).collect();

        assert_eq!(names, vec!["a", "a1", "aa", "a11"]);
    }

    #[test]
    fn test_reserved_are_skipped() {
        let mut alloc = SymbolAllocator::new();
        alloc.reserve(["a", "c"]);

        assert_eq!(alloc.pop(), "b");
        assert_eq!(alloc.pop(), "d");
        assert!(alloc.is_reserved("a"));
        assert!(alloc.is_reserved("d"));
        assert!(!alloc.is_reserved("e"));
    }

    #[test]
    fn test_template_continues_after_suffix() {
        let mut alloc = SymbolAllocator::new();
        alloc.set_template("q43").unwrap();
        assert_eq!(alloc.pop(), "q44");

        let mut alloc = SymbolAllocator::new();
        alloc.set_template("q").unwrap();
        assert_eq!(alloc.pop(), "q1");
        assert_eq!(alloc.template(), Some("q"));
    }

    #[test]
    fn test_template_reserves_lower_labels() {
        let mut alloc = SymbolAllocator::new();
        alloc.set_template("q43").unwrap();

        assert!(alloc.is_reserved("q1"));
        assert!(alloc.is_reserved("q43"));
        assert!(!alloc.is_reserved("q44"));
        assert!(!alloc.is_reserved("p1"));
    }

    #[test]
    fn test_template_skips_reserved() {
        let mut alloc = SymbolAllocator::new();
        alloc.set_template("q1").unwrap();
        alloc.reserve(["q2", "q3"]);

        assert_eq!(alloc.pop(), "q4");
    }

    #[test]
    fn test_clear_template_resumes_default() {
        let mut alloc = SymbolAllocator::new();
        alloc.set_template("q43").unwrap();
        alloc.pop();
        alloc.clear_template();

        assert_eq!(alloc.pop(), "a");
        assert_eq!(alloc.pop(), "b");
        assert_eq!(alloc.template(), None);
    }

    #[test]
    fn test_reseeding_resumes_furthest_counter() {
        let mut alloc = SymbolAllocator::new();
        alloc.set_template("q5").unwrap();
        alloc.pop();
        alloc.pop();
        alloc.set_template("q2").unwrap();

        assert_eq!(alloc.pop(), "q8");
    }

    #[test]
    fn test_combinatorial_skips_template_labels() {
        let mut alloc = SymbolAllocator::with_alphabet("q0123456789").unwrap();
        alloc.set_template("q3").unwrap();
        alloc.clear_template();

        let names: Vec<Symbol> = alloc.take(5).collect();
        assert_eq!(names, vec!["q", "qq", "q0", "q4", "q5"]);
    }

    #[test]
    fn test_template_counter_limit() {
        let mut alloc = SymbolAllocator::new();

        let error = alloc.set_template(&format!("q{}", u64::MAX)).unwrap_err();
        assert!(matches!(error, TuringError::Configuration(_)));
        assert_eq!(alloc.template(), None);

        alloc.set_template(&format!("q{}", u64::MAX - 1)).unwrap();
        assert_eq!(alloc.pop(), format!("q{}", u64::MAX));

        // Out of counters: back to plain names
        assert_eq!(alloc.pop(), "a");
        assert_eq!(alloc.template(), None);
    }

    #[test]
    fn test_invalid_labels() {
        let mut alloc = SymbolAllocator::new();

        for label in ["1q", "", "q-1", "_q"] {
            let error = alloc.set_template(label).unwrap_err();
            assert!(matches!(error, TuringError::Configuration(_)));
        }

        assert!(SymbolAllocator::with_alphabet("0123").is_err());
        assert!(SymbolAllocator::with_alphabet("").is_err());
    }
}
