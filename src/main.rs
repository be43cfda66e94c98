use clap::Parser;
use clap::Subcommand;
use expression_parser::{Expression, LexError, Lexer, SyntaxError};
use miette::{WrapErr, miette};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser, Debug)]
#[command(about = "Evaluate infix math expressions")]
struct Args {
    /// Log pipeline steps to stderr (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print every lexeme with its category
    Tokenize { expression: String },
    /// Print the postfix form and the variables it reads
    Rpn { expression: String },
    /// Evaluate once
    Eval {
        expression: String,
        /// Variable binding, e.g. `--var x=2.5`
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_binding)]
        vars: Vec<(String, f64)>,
        /// Fail instead of treating unset variables as zero
        #[arg(long)]
        strict: bool,
    },
    /// Sweep one variable over a range
    Table {
        expression: String,
        #[arg(long = "var", value_name = "NAME")]
        var: String,
        #[arg(long, allow_negative_numbers = true)]
        from: f64,
        #[arg(long, allow_negative_numbers = true)]
        to: f64,
        #[arg(long, default_value_t = 1.0)]
        step: f64,
    },
}

fn parse_binding(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{s}`"))?;
    let value = value
        .trim()
        .parse()
        .map_err(|e| format!("bad value for `{name}`: {e}"))?;
    Ok((name.trim().to_string(), value))
}

const MAX_ROWS: u64 = 100_000;

/// Points of a `table` sweep, `from` up to and including `to`.
fn sweep(from: f64, to: f64, step: f64) -> miette::Result<impl Iterator<Item = f64>> {
    for (name, value) in [("from", from), ("to", to), ("step", step)] {
        if !value.is_finite() {
            return Err(miette!("--{name} must be a finite number, got {value}"));
        }
    }
    if step <= 0.0 {
        return Err(miette!("step must be positive, got {step}"));
    }
    let steps = ((to - from) / step).floor();
    if steps < 0.0 {
        return Err(miette!("empty range {from}..={to}"));
    }
    if steps >= MAX_ROWS as f64 {
        return Err(miette!(
            help = "use a larger --step or a narrower range",
            "sweep would print more than {MAX_ROWS} rows"
        ));
    }
    Ok((0..=steps as u64).map(move |i| from + i as f64 * step))
}

fn build(expression: &str) -> miette::Result<Expression> {
    match Expression::new(expression) {
        Ok(expression) => Ok(expression),
        Err(e) => {
            if e.downcast_ref::<LexError>().is_some() || e.downcast_ref::<SyntaxError>().is_some() {
                eprintln!("{e:?}");
                std::process::exit(65);
            }
            Err(e)
        }
    }
}

fn main() -> miette::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(match args.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        })
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Commands::Tokenize { expression } => {
            let source = expression.to_lowercase();
            for token in Lexer::new(None, &source) {
                let token = match token {
                    Ok(token) => token,
                    Err(e) => {
                        if let Some(lex_error) = e.downcast_ref::<LexError>() {
                            eprintln!(
                                "[offset {}] Error: Unknown characters: {}",
                                lex_error.offset(),
                                lex_error.unmatched
                            );
                            eprintln!("{e:?}");

                            std::process::exit(65);
                        }
                        return Err(e);
                    }
                };
                println!("{token}");
            }
        }
        Commands::Rpn { expression } => {
            let expression = build(&expression)?;
            println!("{}", expression.postfix());
            let variables: Vec<_> = expression.variables().collect();
            if !variables.is_empty() {
                println!("variables: {}", variables.join(", "));
            }
        }
        Commands::Eval {
            expression,
            vars,
            strict,
        } => {
            let mut expression = build(&expression)?;
            for (name, value) in vars {
                expression.set_value(&name, value)?;
            }
            let value = if strict {
                expression.evaluate_strict()?
            } else {
                expression.evaluate()?
            };
            println!("{value}");
        }
        Commands::Table {
            expression,
            var,
            from,
            to,
            step,
        } => {
            let points = sweep(from, to, step)?;
            let mut expression = build(&expression)?;
            for x in points {
                expression
                    .set_value(&var, x)
                    .wrap_err_with(|| format!("sweeping `{var}` failed"))?;
                let value = expression.evaluate()?;
                println!("{x} -> {value}");
            }
        }
    }
    Ok(())
}
