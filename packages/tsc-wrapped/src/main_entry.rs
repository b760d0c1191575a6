// Main Entry Point
//
// Command line front of the pipeline: parses arguments, reads the project,
// runs the compilation against the real file system and reports diagnostics
// on stderr.

use clap::{Arg, ArgAction, ArgMatches, Command};
use ts::path::join;
use ts::NodeCompilerHost;

use crate::codegen::FactoryCompiler;
use crate::diagnostics::format_diagnostics;
use crate::logging::ConsoleLogger;
use crate::perform_compile::{perform_compilation, read_configuration};

pub fn command() -> Command {
    Command::new("ngc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Angular template compiler wrapping the TypeScript compiler")
        .arg(
            Arg::new("project")
                .short('p')
                .long("project")
                .value_name("PATH")
                .help("Path to tsconfig.json or to a directory containing one"),
        )
        .arg(
            Arg::new("base-path")
                .long("base-path")
                .value_name("PATH")
                .help("Overrides angularCompilerOptions.basePath"),
        )
        .arg(
            Arg::new("trace")
                .long("trace")
                .action(ArgAction::SetTrue)
                .help("Log every pipeline stage"),
        )
}

fn run(matches: &ArgMatches, cwd: &str) -> i32 {
    let project = matches.get_one::<String>("project").map(String::as_str).unwrap_or(".");
    let mut config = read_configuration(&join(cwd, project));
    if let Some(base_path) = matches.get_one::<String>("base-path") {
        config.base_path = join(cwd, base_path);
    }
    let trace = matches.get_flag("trace") || config.angular_options.trace;

    let host = NodeCompilerHost::new(cwd);
    let logger = ConsoleLogger::for_trace(trace);
    let compiler = FactoryCompiler::new();
    let result = perform_compilation(&config, &host, Some(&compiler), &logger);

    if !result.diagnostics.is_empty() {
        eprint!("{}", format_diagnostics(&result.diagnostics, &host));
    }
    result.exit_code()
}

/// Run `ngc` with `args` (program name first) from `cwd`. Returns the exit code.
pub fn main(args: &[String], cwd: &str) -> i32 {
    match command().try_get_matches_from(args) {
        Ok(matches) => run(&matches, cwd),
        Err(error) => {
            let _ = error.print();
            if error.use_stderr() {
                1
            } else {
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_project_and_flags() {
        let matches = command()
            .try_get_matches_from(["ngc", "-p", "src/tsconfig.json", "--base-path", "src", "--trace"])
            .unwrap();
        assert_eq!(matches.get_one::<String>("project").map(String::as_str), Some("src/tsconfig.json"));
        assert_eq!(matches.get_one::<String>("base-path").map(String::as_str), Some("src"));
        assert!(matches.get_flag("trace"));
    }

    #[test]
    fn should_default_trace_off() {
        let matches = command().try_get_matches_from(["ngc"]).unwrap();
        assert!(!matches.get_flag("trace"));
        assert!(matches.get_one::<String>("project").is_none());
    }

    #[test]
    fn should_reject_unknown_arguments() {
        let args: Vec<String> = ["ngc", "--bogus"].iter().map(|a| a.to_string()).collect();
        assert_eq!(main(&args, "/"), 1);
    }

    #[test]
    fn should_fail_for_missing_project() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = dir.path().to_string_lossy().to_string();
        let args: Vec<String> = ["ngc", "-p", "nope.json"].iter().map(|a| a.to_string()).collect();
        assert_eq!(main(&args, &cwd), 1);
    }
}
