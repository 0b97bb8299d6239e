#![no_main]
//! A round-trip property, exercised over randomly generated grammars instead
//! of the single fixed fixture in `pegc-core/tests/grammar_language.rs`:
//! generate a well-formed `Grammar` (`pegc-fuzzgen`), render it to text
//! (`pegc-emit`), re-parse that text, and assert the two trees are
//! structurally equal modulo source position.

use libfuzzer_sys::fuzz_target;
use log::debug;
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let _ = env_logger::try_init();

    let (grammar, text) = match pegc_fuzz::generate_grammar(data) {
        Ok(pair) => pair,
        Err(_) => return,
    };
    debug!("=== generated grammar text ===\n{text}");

    let reparsed = match pegc_core::parse_grammar_source(&text) {
        Ok(g) => g,
        Err(err) => panic!("generated grammar text did not reparse: {err}\n{text}"),
    };

    let original = strip_positions(&grammar);
    let round_tripped = strip_positions(&reparsed);
    similar_asserts::assert_eq!(
        original,
        round_tripped,
        "grammar changed shape across emit -> reparse\nsource text:\n{text}"
    );
});

fn strip_positions(grammar: &pegc_core::model::Grammar) -> Value {
    let mut value = serde_json::to_value(grammar).expect("Grammar always serializes");
    scrub(&mut value);
    value
}

fn scrub(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.remove("pos");
            for v in map.values_mut() {
                scrub(v);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(scrub),
        _ => {}
    }
}
