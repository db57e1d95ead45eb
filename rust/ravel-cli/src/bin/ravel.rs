//! `ravel` — serve, enumerate, and list routines over integer lists.

use std::io::{self, Write};

use clap::{Parser as ClapParser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

use ravel_cli::dispatch;
use ravel_engine::{generate_examples, EnumerateOptions, Registry};

// ANSI color helpers
fn green(s: &str) -> String {
    format!("\x1b[32m{}\x1b[0m", s)
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{}\x1b[0m", s)
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{}\x1b[0m", s)
}

#[derive(ClapParser)]
#[command(
    name = "ravel",
    version,
    about = "Typed routine synthesis over integer lists",
    long_about = "Ravel checks, runs, and synthesizes routines — typed DAG \
                  pipelines of primitive subroutines over integers and \
                  integer lists.\n\n\
                  Without a subcommand it serves the line-framed JSON \
                  protocol on stdin/stdout."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the line-framed JSON protocol on stdin/stdout (the default)
    Serve {
        /// PRNG seed for reproducible generation
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Enumerate behaviorally distinct routines as JSON lines
    Enumerate {
        /// How many distinct routines to produce
        #[arg(long, default_value_t = 10)]
        bound: usize,

        /// PRNG seed for reproducible enumeration
        #[arg(long)]
        seed: Option<u64>,

        /// Magnitude limit for sampled static values
        #[arg(long, default_value_t = 10)]
        rand_limit: i64,

        /// Example pairs to attach per routine
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
    /// List the registered subroutines
    List,
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let registry = Registry::global();

    match cli.command.unwrap_or(Commands::Serve { seed: None }) {
        Commands::Serve { seed } => {
            let mut rng = rng_from(seed);
            let stdin = io::stdin();
            let stdout = io::stdout();
            dispatch::serve(registry, &mut rng, stdin.lock(), stdout.lock())?;
        }
        Commands::Enumerate {
            bound,
            seed,
            rand_limit,
            count,
        } => {
            let mut rng = rng_from(seed);
            let options = EnumerateOptions { bound, rand_limit };
            let routines = ravel_engine::enumerate(registry, &options, &mut rng);
            if routines.len() < bound {
                eprintln!(
                    "{} produced {} of {} requested routines",
                    yellow("warning:"),
                    routines.len(),
                    bound
                );
            }
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for routine in &routines {
                let examples = generate_examples(registry, routine, count, &mut rng)
                    .map(|pairs| {
                        pairs
                            .iter()
                            .map(|(input, output)| {
                                serde_json::Value::Array(vec![input.to_json(), output.to_json()])
                            })
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();
                let line = serde_json::json!({
                    "routine": routine.to_string(),
                    "examples": examples,
                });
                writeln!(out, "{}", line)?;
            }
            eprintln!("{} {} routines", green("enumerated"), routines.len());
        }
        Commands::List => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for sub in registry.iter() {
                writeln!(out, "{} {}", bold(&format!("{:<12}", sub.name)), sub.description)?;
            }
        }
    }
    Ok(())
}
