#![no_main]
//! Feeds completely arbitrary text straight into the grammar meta-parser —
//! not a well-formed grammar, just "anything a human might paste" — to find
//! panics, infinite loops, or out-of-bounds slicing in the buffer/combinator
//! layer itself rather than in any particular grammar construct.

use std::panic;

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let _ = env_logger::try_init();

    // A crash or hang here would be a real bug; an `Err` is an entirely
    // expected outcome for arbitrary text and is not itself interesting.
    let result = panic::catch_unwind(|| pegc_core::parse_grammar_source(data));
    if let Err(payload) = result {
        panic::resume_unwind(payload);
    }
});
