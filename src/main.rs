use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, WrapErr};
use quicktest as qt;
use qt::{evaluator::EvalEnv, host::Registry};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Inspect QuickTest assertion and argument expressions
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print one token per line
    Tokenize { filename: PathBuf },
    /// Print the expression tree
    Parse { filename: PathBuf },
    /// Evaluate an expression that needs no receiver
    Evaluate { filename: PathBuf },
}

fn read_source(filename: &Path) -> miette::Result<String> {
    fs::read_to_string(filename)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read file: {}", filename.display()))
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Tokenize { filename } => {
            let file_contents = read_source(&filename)?;
            let mut any_error = false;

            for token in qt::Lexer::new(&file_contents) {
                match token {
                    Ok(token) => println!("{token}"),
                    Err(e) => {
                        any_error = true;
                        eprintln!("{e:?}");
                    }
                }
            }
            println!("EOF");

            if any_error {
                std::process::exit(65);
            }
        }

        Commands::Parse { filename } => {
            let file_contents = read_source(&filename)?;

            match qt::Parser::new(&file_contents).parse() {
                Ok(expr) => println!("{expr}"),
                Err(e) => {
                    eprintln!("{e:?}");
                    std::process::exit(65);
                }
            }
        }

        Commands::Evaluate { filename } => {
            let file_contents = read_source(&filename)?;

            let expr = match qt::Parser::new(&file_contents).parse() {
                Ok(expr) => expr,
                Err(e) => {
                    eprintln!("{e:?}");
                    std::process::exit(65);
                }
            };

            let registry = Registry::new();
            match expr.eval(&EvalEnv::empty(&registry)) {
                Ok(value) => println!("{value} ({})", value.type_name()),
                Err(e) => {
                    eprintln!("{e:?}");
                    std::process::exit(70);
                }
            }
        }
    }

    Ok(())
}
