#![allow(clippy::cast_precision_loss)]

use clap::{Args, Parser, Subcommand, ValueEnum};
use prop_theory::coins::ordering::{Coin, CoinOrdering};
use prop_theory::sat::solver::{DefaultConfig, SolutionStats, VsidsConfig};
use prop_theory::tasks::schedule::{Task, TaskSchedule};
use prop_theory::{Assignment, Encoding, Error, Proposition, Theory, Var};
use std::fmt::Display;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tikv_jemalloc_ctl::{epoch, stats};

/// Defines the command-line interface.
///
/// Uses `clap` for parsing arguments.
#[derive(Parser, Debug)]
#[command(
    name = "prop-theory",
    version,
    about = "Build and query small propositional theories"
)]
pub(crate) struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Order coins by value from pairwise comparisons.
    Coins {
        /// Number of coins (and positions).
        #[arg(short = 'n', long, default_value_t = 4)]
        coins: u8,

        /// An observed comparison `a<b`: coin a is worth less than coin b.
        /// Repeat for several observations.
        #[arg(long = "less", value_parser = parse_less, default_values = ["3<2", "2<1"])]
        less: Vec<(Coin, Coin)>,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Schedule tasks into slots so that dependencies run first.
    Tasks {
        /// Number of tasks.
        #[arg(short = 'n', long, default_value_t = 3)]
        tasks: u8,

        /// Number of slots.
        #[arg(long, default_value_t = 4)]
        slots: u8,

        /// A dependency `a>b`: task a depends on task b.
        /// Repeat for several dependencies.
        #[arg(long = "dep", value_parser = parse_dependency, default_values = ["3>2"])]
        deps: Vec<(Task, Task)>,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Generate shell completion scripts.
    Completions {
        /// The shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Branching heuristic for the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub(crate) enum SelectorType {
    /// Registration order.
    #[default]
    Fixed,
    /// Conflict-driven activity.
    Vsids,
}

/// Options shared by the theory subcommands.
#[derive(Args, Debug, Default, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct CommonOptions {
    /// Enable debug logging.
    #[arg(short, long, default_value_t = false)]
    pub(crate) debug: bool,

    /// Print problem and search statistics.
    #[arg(short, long, default_value_t = false)]
    pub(crate) stats: bool,

    /// Print every proposition of the solution with its value, not only the
    /// true ones.
    #[arg(short, long, default_value_t = false)]
    pub(crate) print_solution: bool,

    /// Print the likelihood of each placement proposition.
    #[arg(short, long, default_value_t = false)]
    pub(crate) likelihoods: bool,

    /// Also report whether the negated theory is satisfiable.
    #[arg(long, default_value_t = false)]
    pub(crate) negate: bool,

    /// List the constraints, marked with their value under the solution.
    #[arg(long, default_value_t = false)]
    pub(crate) pprint: bool,

    /// Write the compiled clauses in DIMACS format to this file.
    #[arg(long)]
    pub(crate) export_dimacs: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = SelectorType::Fixed)]
    pub(crate) selector: SelectorType,
}

fn parse_pair(s: &str, sep: char) -> Result<(u8, u8), String> {
    let (a, b) = s
        .split_once(sep)
        .ok_or_else(|| format!("expected `a{sep}b`, got `{s}`"))?;
    let parse = |x: &str| {
        x.trim()
            .trim_start_matches(['c', 't'])
            .parse::<u8>()
            .map_err(|e| format!("`{x}`: {e}"))
    };
    Ok((parse(a)?, parse(b)?))
}

pub(crate) fn parse_less(s: &str) -> Result<(Coin, Coin), String> {
    parse_pair(s, '<')
}

pub(crate) fn parse_dependency(s: &str) -> Result<(Task, Task), String> {
    parse_pair(s, '>')
}

/// Everything measured while querying a theory.
#[derive(Debug, Default)]
struct Report {
    compile_time: Duration,
    solve_time: Duration,
    count_time: Duration,
    count: u64,
    search: SolutionStats,
}

/// Builds and queries the coin-ordering theory.
///
/// # Errors
///
/// If a coin index is out of range or the theory cannot be built.
pub(crate) fn run_coins(
    num_coins: u8,
    less: &[(Coin, Coin)],
    common: &CommonOptions,
) -> Result<(), String> {
    if let Some(&(a, b)) = less
        .iter()
        .find(|(a, b)| !(1..=num_coins).contains(a) || !(1..=num_coins).contains(b))
    {
        return Err(format!("comparison c{a}<c{b} names a coin outside 1..={num_coins}"));
    }

    let time = Instant::now();
    let mut ordering = CoinOrdering::new(num_coins).map_err(|e| e.to_string())?;
    for &(a, b) in less {
        ordering.assert_less(a, b).map_err(|e| e.to_string())?;
    }
    let theory = ordering.compile().map_err(|e| e.to_string())?;
    let compile_time = time.elapsed();

    query(
        ordering.encoding(),
        &theory,
        &ordering.placements(),
        common,
        compile_time,
        |solution| {
            for (p, coin) in ordering.positions().zip(ordering.decode(solution)) {
                match coin {
                    Some(c) => println!("pos {p}: coin {c}"),
                    None => println!("pos {p}: -"),
                }
            }
        },
    )
}

/// Builds and queries the task-scheduling theory.
///
/// # Errors
///
/// If a task index is out of range or the theory cannot be built.
pub(crate) fn run_tasks(
    num_tasks: u8,
    num_slots: u8,
    deps: &[(Task, Task)],
    common: &CommonOptions,
) -> Result<(), String> {
    if let Some(&(a, b)) = deps
        .iter()
        .find(|(a, b)| !(1..=num_tasks).contains(a) || !(1..=num_tasks).contains(b))
    {
        return Err(format!("dependency t{a}>t{b} names a task outside 1..={num_tasks}"));
    }

    let time = Instant::now();
    let mut schedule = TaskSchedule::new(num_tasks, num_slots).map_err(|e| e.to_string())?;
    for &(a, b) in deps {
        schedule.add_dependency(a, b).map_err(|e| e.to_string())?;
    }
    let theory = schedule.compile().map_err(|e| e.to_string())?;
    let compile_time = time.elapsed();

    query(
        schedule.encoding(),
        &theory,
        &schedule.placements(),
        common,
        compile_time,
        |solution| {
            let holding = schedule
                .dependencies(solution)
                .iter()
                .map(|(a, b)| format!("t{a}>t{b}"))
                .collect::<Vec<_>>();
            println!("Dependencies: {}", holding.join("   "));
            let slots = schedule.decode(solution);
            let row = |cells: Vec<String>| cells.iter().map(|c| format!("{c:<5}")).collect::<String>();
            println!("Position:     {}", row(schedule.slots().map(|p| p.to_string()).collect()));
            println!(
                "Task:         {}",
                row(slots
                    .iter()
                    .map(|t| t.map_or_else(|| "_".to_string(), |t| t.to_string()))
                    .collect())
            );
        },
    )
}

/// The queries both subcommands run, in the order the reports print them:
/// satisfiability, model count, one solution, likelihoods, negation.
fn query<K: Proposition, F: Fn(&Assignment)>(
    encoding: &Encoding<K>,
    theory: &Theory,
    placements: &[Var],
    common: &CommonOptions,
    compile_time: Duration,
    decode: F,
) -> Result<(), String> {
    let mut report = Report {
        compile_time,
        ..Report::default()
    };

    if let Some(path) = &common.export_dimacs {
        std::fs::write(path, theory.to_dimacs())
            .map_err(|e| format!("unable to write {}: {e}", path.display()))?;
        println!("DIMACS written to: {}", path.display());
    }

    let time = Instant::now();
    let (solution, search) = match common.selector {
        SelectorType::Fixed => theory.solve_with_stats::<DefaultConfig>(),
        SelectorType::Vsids => theory.solve_with_stats::<VsidsConfig>(),
    };
    report.search = search;
    report.solve_time = time.elapsed();

    println!("\nsatisfiable? {}", solution.is_some());

    let time = Instant::now();
    report.count = theory.count_solutions();
    report.count_time = time.elapsed();
    println!("#solutions: {}", report.count);

    match &solution {
        Some(s) if common.print_solution => print!("{s:#}"),
        Some(s) => print!("{s}"),
        None => println!("no solution"),
    }

    if let Some(s) = &solution {
        decode(s);
    }

    if common.pprint {
        println!("\n{}", encoding.pprint(theory, solution.as_ref()));
    }

    if common.likelihoods {
        println!("\nlikelihood that specific atomic proposition is true:");
        for &var in placements {
            let label = encoding.label(var).unwrap_or_default();
            match theory.likelihood(var) {
                Ok(p) => println!(" {label}: {p:.2}"),
                Err(Error::UndefinedLikelihood) => println!(" {label}: undefined"),
                Err(e) => return Err(e.to_string()),
            }
        }
    }

    if common.negate {
        println!("\nnegating theory...");
        let negation = theory.negate().map_err(|e| e.to_string())?;
        println!("negation satisfiable: {}", negation.satisfiable());
    }

    if common.stats {
        print_stats(theory, &report);
    }

    Ok(())
}

/// Allocated and resident memory in MiB, if jemalloc reports them.
fn memory_usage() -> Option<(f64, f64)> {
    epoch::advance().ok()?;
    let allocated = stats::allocated::mib().ok()?.read().ok()?;
    let resident = stats::resident::mib().ok()?.read().ok()?;
    Some((
        allocated as f64 / (1024.0 * 1024.0),
        resident as f64 / (1024.0 * 1024.0),
    ))
}

/// Helper function to print a single statistic line in a formatted table row.
pub(crate) fn stat_line(label: &str, value: impl Display) {
    println!("|  {label:<28} {value:>18}  |");
}

/// Like [`stat_line`], with a per-second rate in a second column.
pub(crate) fn stat_line_with_rate(label: &str, value: usize, elapsed: Duration) {
    let secs = elapsed.as_secs_f64();
    let rate = if secs > 0.0 { value as f64 / secs } else { 0.0 };
    println!("|  {label:<20} {value:>12} ({rate:>9.0} /sec)  |");
}

fn print_stats(theory: &Theory, report: &Report) {
    println!("\n=======================[ Problem Statistics ]=========================");
    stat_line("Compile time (s)", format!("{:.3}", report.compile_time.as_secs_f64()));
    stat_line("Propositions", theory.vocabulary().len());
    stat_line("Auxiliary variables", theory.num_aux());
    stat_line("Clauses", theory.cnf().len());
    stat_line("Literals", theory.cnf().num_literals());

    println!("========================[ Search Statistics ]========================");
    stat_line("Solve time (s)", format!("{:.3}", report.solve_time.as_secs_f64()));
    stat_line_with_rate("Decisions", report.search.decisions, report.solve_time);
    stat_line_with_rate("Propagations", report.search.propagations, report.solve_time);
    stat_line("Conflicts", report.search.conflicts);
    stat_line("Pure literals", report.search.pure_literals);
    stat_line("Count time (s)", format!("{:.3}", report.count_time.as_secs_f64()));
    stat_line("Models", report.count);
    if let Some((allocated, resident)) = memory_usage() {
        stat_line("Memory usage (MiB)", format!("{allocated:.2}"));
        stat_line("Resident memory (MiB)", format!("{resident:.2}"));
    }
    println!("=====================================================================");
}
