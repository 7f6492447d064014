use std::io::{self, IsTerminal, Read};
use std::process::ExitCode;

use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use feelxp::environment::Environment;
use feelxp::{evaluator, json, parser};

/// Evaluates a FEEL expression and prints the result as JSON.
///
/// With no EXPR or FILE the expression is read from stdin; on a terminal an
/// interactive session starts instead. Set FEEL_LOG (e.g. FEEL_LOG=trace) to
/// control diagnostics on stderr.
#[derive(Parser, Debug)]
#[command(name = "feel", version, about, long_about = None)]
struct Cli {
    /// Evaluate EXPR
    #[arg(short = 'c', value_name = "EXPR", conflicts_with = "file")]
    expr: Option<String>,

    /// Print the parse tree instead of evaluating
    #[arg(long)]
    ast: bool,

    /// A JSON object whose keys become variables
    #[arg(long, value_name = "JSON")]
    scope: Option<String>,

    /// File holding the expression
    file: Option<String>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("FEEL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let mut env = Environment::new();
    if let Some(scope) = &cli.scope {
        env.push(json::parse_scope(scope).map_err(|e| format!("--scope: {e}"))?);
    }

    let source = match (&cli.expr, &cli.file) {
        (Some(expr), _) => expr.clone(),
        (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| format!("{path}: {e}"))?,
        (None, None) if io::stdin().is_terminal() => return repl(&mut env),
        (None, None) => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).map_err(|e| e.to_string())?;
            buf
        }
    };

    let node = parser::parse(&source).map_err(|e| e.to_string())?;
    if cli.ast {
        println!("{node}");
        return Ok(());
    }
    let value = evaluator::eval(&node, &mut env).map_err(|e| e.to_string())?;
    let text = serde_json::to_string_pretty(&value.to_json()).map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}

fn repl(env: &mut Environment) -> Result<(), String> {
    println!("feel {}", env!("CARGO_PKG_VERSION"));
    println!("Type expressions to evaluate them, :help for commands.");
    println!();

    let mut rl = DefaultEditor::new().map_err(|e| e.to_string())?;
    loop {
        match rl.readline("feel> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                match line {
                    ":help" => {
                        print_help();
                        continue;
                    }
                    ":scope" => {
                        print_scope(env);
                        continue;
                    }
                    ":quit" | ":exit" => break,
                    _ => {}
                }

                match parser::parse(line) {
                    Ok(node) => match evaluator::eval(&node, env) {
                        Ok(value) => println!("{value}"),
                        Err(e) => println!("Error: {e}"),
                    },
                    Err(e) => println!("Error: {e}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted. Use Ctrl+D or :quit to exit.");
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.to_string()),
        }
    }
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  :help    - Show this help message");
    println!("  :scope   - Show variables bound in this session");
    println!("  :quit    - Exit");
    println!();
    println!("Examples:");
    println!("  bind(\"rate\", 0.2)");
    println!("  for x in [1, 2, 3] return x * rate");
    println!("  5 in [1..10)");
    println!("  date(\"2024-02-10\") + duration(\"P1M\")");
    println!("  help(substring)");
}

fn print_scope(env: &Environment) {
    let bindings = env.bindings();
    if bindings.is_empty() {
        println!("(no variables)");
    }
    for (name, value) in bindings {
        println!("  {name} = {value}");
    }
}
