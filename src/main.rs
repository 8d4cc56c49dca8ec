//! # prop-theory
//!
//! Command-line front end for the `prop_theory` library. Each subcommand
//! builds one of the bundled theories, compiles it and reports on it.
//!
//! ## Subcommands
//!
//! 1.  **`coins`**: order coins by value from pairwise observations.
//!     ```sh
//!     prop-theory coins -n 4 --less 3<2 --less 2<1 --likelihoods
//!     ```
//!
//! 2.  **`tasks`**: schedule tasks into slots respecting dependencies.
//!     ```sh
//!     prop-theory tasks -n 3 --slots 4 --dep 3>2 --pprint
//!     ```
//!
//! 3.  **`completions`**: print a shell completion script.
//!     ```sh
//!     prop-theory completions bash > prop-theory.bash
//!     ```
//!
//! ## Common Options
//!
//! -   `-d, --debug`: debug logging on stderr. `RUST_LOG` overrides it.
//! -   `-s, --stats`: problem and search statistics, with memory usage.
//! -   `-p, --print-solution`: every proposition of the solution, not only the true ones.
//! -   `-l, --likelihoods`: likelihood of each placement proposition.
//! -   `--negate`: whether the negated theory is satisfiable.
//! -   `--pprint`: the constraints marked `+`/`-` under the solution.
//! -   `--export-dimacs <PATH>`: write the compiled clauses to a DIMACS file.
//! -   `--selector <fixed|vsids>`: branching heuristic (default: `fixed`).

use crate::command_line::cli::{Cli, Commands, CommonOptions, run_coins, run_tasks};
use clap::{CommandFactory, Parser};
use std::io;
use std::process::ExitCode;

mod command_line;

/// Global allocator using `tikv-jemallocator`, which also provides the
/// memory statistics reported with `--stats`.
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn init_logger(common: &CommonOptions) {
    let level = if common.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Coins {
            coins,
            less,
            common,
        } => {
            init_logger(&common);
            run_coins(coins, &less, &common)
        }
        Commands::Tasks {
            tasks,
            slots,
            deps,
            common,
        } => {
            init_logger(&common);
            run_tasks(tasks, slots, &deps, &common)
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "prop-theory", &mut io::stdout());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
