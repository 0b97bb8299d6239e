#![no_main]
//! Runs `pegc-compiler`'s reference-resolution validator over a randomly
//! generated grammar and, when it reports errors, renders them with
//! `ariadne` — both must never panic, regardless of what shape of grammar
//! the generator produces.

use libfuzzer_sys::fuzz_target;
use log::debug;

fuzz_target!(|data: &[u8]| {
    let _ = env_logger::try_init();

    let (grammar, text) = match pegc_fuzz::generate_grammar(data) {
        Ok(pair) => pair,
        Err(_) => return,
    };
    debug!("=== generated grammar text ===\n{text}");

    if let Err(errors) = pegc_compiler::Validator::validate(&grammar) {
        let report = pegc_compiler::render_report(&text, &errors);
        debug!("=== validation report ===\n{report}");
    }
});
