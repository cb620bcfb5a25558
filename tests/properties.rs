use std::collections::HashSet;

use proptest::prelude::*;
use tur_macro::{
    decode, encode, encode_file, Action, MacroCompiler, Program, Rule, Step, SymbolAllocator,
    Traversal,
};

#[derive(Debug, Clone)]
enum Op {
    Pop,
    Reserve(Vec<String>),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Pop),
        1 => prop::collection::vec("[a-e][a-e0-9]?", 1..4).prop_map(Op::Reserve),
    ]
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::Left),
        Just(Action::Right),
        Just(Action::Stay),
        Just(Action::Halt),
    ]
}

fn program() -> impl Strategy<Value = Program> {
    let symbol = "[a-z0-9]{0,3}";
    let state = "[a-z][a-z0-9]{0,3}";
    let rule = (symbol, state, symbol, state, action())
        .prop_map(|(v, s, nv, ns, a)| Rule::new(v, s, nv, ns, a));

    (
        prop::collection::vec(symbol, 1..6),
        -5i64..5,
        prop_oneof![Just(String::new()), Just("_".to_string()), Just("B".to_string())],
        state,
        prop::collection::vec(rule, 0..6),
    )
        .prop_map(|(tape, index, default, initial_state, rules)| Program {
            tape,
            index,
            default,
            initial_state,
            rules,
        })
}

/// Empty values only have a textual form when they are the filler.
fn encodable(program: &Program) -> bool {
    program.rules.iter().all(|rule| {
        [&rule.value, &rule.next_value]
            .iter()
            .all(|value| !value.is_empty() || **value == program.default)
    })
}

proptest! {
    /// Popped symbols are pairwise distinct and were never reserved before.
    #[test]
    fn allocator_never_repeats(ops in prop::collection::vec(op(), 1..200)) {
        let mut alloc = SymbolAllocator::new();
        let mut reserved = HashSet::new();
        let mut popped = HashSet::new();

        for op in ops {
            match op {
                Op::Pop => {
                    let symbol = alloc.pop();
                    prop_assert!(!reserved.contains(&symbol), "{} was reserved", symbol);
                    prop_assert!(popped.insert(symbol));
                }
                Op::Reserve(symbols) => {
                    reserved.extend(symbols.iter().cloned());
                    alloc.reserve(symbols);
                }
            }
        }
    }

    /// A template continues right after its own suffix.
    #[test]
    fn template_continues(letter in "[a-z]{1,2}", counter in 0u64..100_000) {
        let mut alloc = SymbolAllocator::new();
        alloc.set_template(&format!("{letter}{counter}")).unwrap();

        prop_assert_eq!(alloc.pop(), format!("{}{}", letter, counter + 1));
    }

    /// Decoding an encoded program gives the program back; a program without a
    /// textual form is refused up front.
    #[test]
    fn encoding_round_trip(program in program()) {
        prop_assert_eq!(encode(&program).is_ok(), encodable(&program));

        if let Ok(text) = encode(&program) {
            prop_assert_eq!(&decode(&text).unwrap(), &program);
            prop_assert_eq!(&decode(&encode_file(&program).unwrap()).unwrap(), &program);
        }
    }

    /// Compiling the same calls twice gives the same table and the same run.
    #[test]
    fn compilation_is_deterministic(cells in prop::collection::vec("[01]", 0..12)) {
        let build = || {
            let mut tape = vec!["a".to_string()];
            tape.extend(cells.iter().cloned());
            tape.push("b".to_string());

            let mut compiler = MacroCompiler::from_program(Program::new(tape, "q1")).unwrap();
            compiler
                .set_all_on_way(&Traversal::new(["0", "1"], ["b"], Action::Right), Some("x".into()))
                .unwrap();
            compiler.stop().unwrap();
            let step = compiler.run();
            (step, compiler.into_machine())
        };

        let (first_step, first) = build();
        let (second_step, second) = build();

        prop_assert_eq!(&first_step, &Step::Halted);
        prop_assert_eq!(first_step, second_step);
        prop_assert_eq!(first.rules(), second.rules());
        prop_assert_eq!(first.tape(), second.tape());
        prop_assert_eq!(first.index(), cells.len() as i64 + 1);
    }
}
