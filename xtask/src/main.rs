//! Dev task runner for this workspace: a plain `StructOpt` dispatch over
//! `xshell::cmd!` invocations, pared down to the one task this workspace
//! actually needs — driving the `fuzz/` crate's libFuzzer targets for a
//! bounded amount of time. Generating target-language object-model classes
//! from a grammar is explicitly out of scope, so it has no counterpart here.

mod utils;

use std::path::PathBuf;

use anyhow::{bail, Result};
use structopt::StructOpt;
use xshell::cmd;

use utils::project_root;

fn main() -> Result<()> {
    Xtask::from_args().run()
}

#[derive(Debug, StructOpt)]
#[structopt(name = "xtask", about = "pegc development workflows")]
struct Xtask {
    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Run one of `fuzz/fuzz_targets/*.rs` under cargo-fuzz for a bounded
    /// amount of time: the round-trip and validation properties are also
    /// exercised this way, beyond the fixed unit/integration fixtures.
    Fuzz(Fuzz),
}

#[derive(Debug, StructOpt)]
struct Fuzz {
    /// Name of a `[[bin]]` declared in `fuzz/Cargo.toml` (`parse_raw`,
    /// `roundtrip`, or `validate`).
    target: String,

    /// Wall-clock budget in seconds, forwarded to libFuzzer's
    /// `-max_total_time`. Runs until the first crash if unset.
    #[structopt(long)]
    seconds: Option<u64>,
}

impl Xtask {
    fn run(&self) -> Result<()> {
        match &self.command {
            Command::Fuzz(fuzz) => fuzz.run(),
        }
    }
}

impl Fuzz {
    fn run(&self) -> Result<()> {
        let root = project_root();
        let target = &self.target;
        let known = known_fuzz_targets(&root)?;
        if !known.contains(target) {
            bail!(
                "unknown fuzz target {target:?}; fuzz/Cargo.toml declares: {}",
                known.join(", ")
            );
        }
        let _cwd = xshell::pushd(&root)?;
        match self.seconds {
            Some(seconds) => {
                let max_total_time = seconds.to_string();
                cmd!("cargo fuzz run {target} -- -max_total_time={max_total_time}").run()?
            }
            None => cmd!("cargo fuzz run {target}").run()?,
        }
        Ok(())
    }
}

/// The `[[bin]] name = "..."` entries declared in `fuzz/Cargo.toml`, so a
/// typo'd target name fails fast with the real list instead of whatever
/// `cargo fuzz` itself reports.
fn known_fuzz_targets(root: &PathBuf) -> Result<Vec<String>> {
    let manifest = std::fs::read_to_string(root.join("fuzz/Cargo.toml"))?;
    let mut names = Vec::new();
    for line in manifest.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("name = \"") {
            if let Some(name) = rest.strip_suffix('"') {
                names.push(name.to_string());
            }
        }
    }
    // The package's own `name = "pegc-fuzz"` line is not a `[[bin]]` target;
    // every other `name = "..."` line in this manifest is.
    names.retain(|n| n != "pegc-fuzz");
    Ok(names)
}
