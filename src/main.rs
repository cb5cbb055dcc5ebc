// ABOUTME: Command-line entry point: mode dispatch, exit codes, and the REPL

mod ast;
mod builtins;
mod env;
mod error;
mod eval;
mod highlighter;
mod parser;
mod printer;
mod scanner;
mod token;
mod value;

use eval::Interpreter;
use highlighter::LoxHelper;
use parser::Parser;
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};
use scanner::Scanner;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

// sysexits.h codes used by the Lox family of interpreters
const EX_DATAERR: u8 = 65;
const EX_SOFTWARE: u8 = 70;

/// Tree-walking Lox interpreter
#[derive(clap::Parser, Debug)]
#[command(name = "rlox")]
#[command(version)]
#[command(about = "A tree-walking interpreter for the Lox language")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Print the token stream for a source file
    Tokenize { file: PathBuf },
    /// Print the parenthesized syntax tree of the first expression
    Parse { file: PathBuf },
    /// Evaluate the first expression and print its value
    Evaluate { file: PathBuf },
    /// Execute a program, or start a REPL when no file is given
    Run { file: Option<PathBuf> },
}

fn main() -> ExitCode {
    let args = <CliArgs as clap::Parser>::parse();

    match args.command {
        Command::Tokenize { file } => with_source(&file, tokenize),
        Command::Parse { file } => with_source(&file, parse),
        Command::Evaluate { file } => with_source(&file, evaluate),
        Command::Run { file: Some(file) } => with_source(&file, run),
        Command::Run { file: None } => repl(),
    }
}

/// Reads the source file and hands it to the mode handler
fn with_source(path: &Path, mode: fn(&str) -> ExitCode) -> ExitCode {
    match std::fs::read_to_string(path) {
        Ok(source) => mode(&source),
        Err(err) => {
            eprintln!("Error reading file {}: {}", path.display(), err);
            ExitCode::FAILURE
        }
    }
}

fn tokenize(source: &str) -> ExitCode {
    let (tokens, had_error) = Scanner::new(source).scan_tokens();
    for token in &tokens {
        println!("{token}");
    }
    if had_error {
        ExitCode::from(EX_DATAERR)
    } else {
        ExitCode::SUCCESS
    }
}

fn parse(source: &str) -> ExitCode {
    let (tokens, had_error) = Scanner::new(source).scan_tokens();
    if had_error {
        return ExitCode::from(EX_DATAERR);
    }
    let mut parser = Parser::new(tokens);
    match parser.parse_expression() {
        Some(expr) if !parser.had_error() => {
            println!("{}", printer::print(&expr));
            ExitCode::SUCCESS
        }
        _ => ExitCode::from(EX_DATAERR),
    }
}

fn evaluate(source: &str) -> ExitCode {
    let (tokens, had_error) = Scanner::new(source).scan_tokens();
    if had_error {
        return ExitCode::from(EX_DATAERR);
    }
    let mut parser = Parser::new(tokens);
    let Some(expr) = parser.parse_expression() else {
        return ExitCode::from(EX_DATAERR);
    };
    if parser.had_error() {
        return ExitCode::from(EX_DATAERR);
    }
    match Interpreter::new().interpret_expr(&expr) {
        Ok(value) => {
            println!("{value}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(EX_SOFTWARE)
        }
    }
}

fn run(source: &str) -> ExitCode {
    let (tokens, had_error) = Scanner::new(source).scan_tokens();
    if had_error {
        return ExitCode::from(EX_DATAERR);
    }
    let mut parser = Parser::new(tokens);
    let statements = parser.parse();
    if parser.had_error() {
        return ExitCode::from(EX_DATAERR);
    }
    match Interpreter::new().interpret(&statements) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(EX_SOFTWARE)
        }
    }
}

/// Interactive loop against a persistent interpreter. Errors are
/// reported and the session continues.
fn repl() -> ExitCode {
    let config = Config::builder().auto_add_history(true).build();
    let mut rl = match Editor::with_config(config) {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("Failed to initialize REPL: {err}");
            return ExitCode::FAILURE;
        }
    };
    rl.set_helper(Some(LoxHelper));

    let history_file = ".rlox_history";
    let _ = rl.load_history(history_file);

    println!("rlox {}", env!("CARGO_PKG_VERSION"));
    println!("Type Lox statements; Ctrl-D exits.");

    let mut interpreter = Interpreter::new();
    loop {
        match rl.readline("> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                run_line(&line, &mut interpreter);
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
    ExitCode::SUCCESS
}

fn run_line(line: &str, interpreter: &mut Interpreter) {
    let (tokens, had_error) = Scanner::new(line).scan_tokens();
    if had_error {
        return;
    }
    let mut parser = Parser::new(tokens);
    let statements = parser.parse();
    if parser.had_error() {
        return;
    }
    if let Err(err) = interpreter.interpret(&statements) {
        eprintln!("{err}");
    }
}
