//! ngc: compile an Angular project described by a tsconfig.json.

use std::process;

use anyhow::Context;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cwd = std::env::current_dir().context("cannot determine the working directory")?;
    let code = tsc_wrapped::main_entry::main(&args, &cwd.to_string_lossy());
    process::exit(code);
}
