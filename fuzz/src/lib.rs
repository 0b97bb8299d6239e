use libfuzzer_sys::arbitrary::{Result, Unstructured};
use pegc_core::model::Grammar;

/// Generates an arbitrary well-formed grammar and its rendered source text,
/// the way `apollo-rs`'s fuzz crate generates an arbitrary valid GraphQL
/// document from raw fuzzer bytes before handing it to a real target.
pub fn generate_grammar(input: &[u8]) -> Result<(Grammar, String)> {
    drop(env_logger::try_init());

    let mut u = Unstructured::new(input);
    let grammar = pegc_fuzzgen::arbitrary_grammar(&mut u)?;
    let text = pegc_emit::emit(&grammar);
    Ok((grammar, text))
}
