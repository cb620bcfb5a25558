//! This crate provides a macro compiler for single-tape Turing machines.
//! Composable tape operations (moving to a value, painting or erasing a range,
//! copying or moving a range) are compiled into a deterministic transition table,
//! which the bundled interpreter executes. Programs have a textual encoding that
//! can be parsed, encoded and loaded from files.

pub mod allocator;
pub mod compiler;
pub mod cursor;
pub mod encoder;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod tape;
pub mod transfer;
pub mod traversal;
pub mod types;

/// Re-exports the `SymbolAllocator` struct from the allocator module.
pub use allocator::SymbolAllocator;
/// Re-exports the compiler and its move descriptions.
pub use compiler::{BranchMove, MacroCompiler, Move, NextState, NextStates, Spread};
/// Re-exports the cursor types.
pub use cursor::{Cursor, ValueCondition};
/// Re-exports the encoding functions from the encoder module.
pub use encoder::{decode, encode, encode_file};
/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::ProgramLoader;
/// Re-exports the interpreter and its step hook type.
pub use machine::{StepHook, TuringMachine};
/// Re-exports the parse functions from the parser module.
pub use parser::{parse, parse_rules};
pub use tape::Tape;
pub use transfer::RangeLayout;
/// Re-exports the traversal descriptor and its hook strategies.
pub use traversal::{Hooks, Identity, Paint, Relocate, Traversal};
/// Re-exports the core types.
pub use types::{
    Action, Program, Rule, Step, Symbol, Transition, TuringError, DEFAULT_ALPHABET,
    DEFAULT_FILLER, DEFAULT_SIGN,
};
