use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use zinc as zn;

use zn::ast::IdGen;
use zn::ast_printer::AstPrinter;
use zn::error::ZincError;
use zn::parser::Parser;
use zn::scanner::{scan_tokens, Scanner};
use zn::session::Session;

#[derive(ClapParser, Debug)]
#[command(version, about = "Zinc language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to zinc.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the token stream as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parses a file and prints each statement's syntax tree
    Parse {
        filename: PathBuf,

        /// Print the statements as JSON
        #[arg(long)]
        json: bool,
    },

    /// Runs a file as a Zinc program
    Run { filename: PathBuf },

    /// Starts an interactive session
    Repl,
}

/// Maps a script into memory and checks it is UTF‑8.
fn read_file(filename: &PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;

    let len = file
        .metadata()
        .context(format!("Failed to stat file {:?}", filename))?
        .len();

    // Zero-length files cannot be mapped.
    if len == 0 {
        return Ok(String::new());
    }

    // SAFETY: the map is read once, copied out and dropped before returning.
    let map = unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;

    let source = std::str::from_utf8(&map)
        .map_err(ZincError::from)
        .context(format!("File {:?} is not valid UTF-8", filename))?
        .to_owned();

    info!("Read {} bytes from {:?}", source.len(), filename);

    Ok(source)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("zinc.log").context("Failed to create zinc.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("zinc::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to zinc.log");
    Ok(())
}

fn tokenize(filename: PathBuf, json: bool) -> Result<()> {
    info!("Running Tokenize subcommand");
    let source = read_file(&filename)?;

    if json {
        let (tokens, errors) = scan_tokens(&source);
        for e in &errors {
            eprintln!("{}", e);
        }
        println!("{}", serde_json::to_string_pretty(&tokens)?);

        if !errors.is_empty() {
            std::process::exit(65);
        }
        return Ok(());
    }

    let mut tokenized = true;

    for token in Scanner::new(&source) {
        match token {
            Ok(token) => {
                debug!("Scanned token: {}", token);
                println!("{}", token);
            }

            Err(e) => {
                tokenized = false;
                debug!("Tokenization debug: {}", e);
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code 65");
        std::process::exit(65);
    }

    info!("Tokenization completed successfully");
    Ok(())
}

fn parse(filename: PathBuf, json: bool) -> Result<()> {
    info!("Running Parse subcommand");
    let source = read_file(&filename)?;

    let (tokens, mut errors) = scan_tokens(&source);
    let mut ids = IdGen::new();

    match Parser::new(&tokens, &mut ids).parse() {
        Ok(statements) if errors.is_empty() => {
            if json {
                println!("{}", serde_json::to_string_pretty(&statements)?);
            } else {
                for stmt in &statements {
                    let ast_str = AstPrinter::print_stmt(stmt);
                    debug!("AST: {}", ast_str);
                    println!("{}", ast_str);
                }
            }
        }

        Ok(_) => {}

        Err(parse_errors) => errors.extend(parse_errors),
    }

    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{}", e);
        }
        std::process::exit(65);
    }

    info!("Parse subcommand completed");
    Ok(())
}

fn run(filename: PathBuf) -> Result<()> {
    info!("Running Run subcommand");
    let source = read_file(&filename)?;

    let mut session = Session::new();

    if let Err(e) = session.run(&source) {
        debug!("Run failed: {}", e);
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }

    info!("Program executed successfully");
    Ok(())
}

const REPL_HELP: &str = "\
.exit   leave the session
.reset  forget every definition
.help   show this message";

/// Net count of unclosed `{` in `text`.
fn open_braces(text: &str) -> i64 {
    text.chars().fold(0, |depth, c| match c {
        '{' => depth + 1,
        '}' => depth - 1,
        _ => depth,
    })
}

fn repl() -> Result<()> {
    info!("Starting REPL");

    let mut session = Session::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut buffer = String::new();

    loop {
        print!("{}", if buffer.is_empty() { ">>> " } else { "... " });
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line.context("Failed to read from stdin")?;

        if buffer.is_empty() {
            match line.trim() {
                ".exit" => break,
                ".reset" => {
                    session.reset();
                    println!("Session reset.");
                    continue;
                }
                ".help" => {
                    println!("{}", REPL_HELP);
                    continue;
                }
                "" => continue,
                _ => {}
            }
        }

        buffer.push_str(&line);
        buffer.push('\n');

        if open_braces(&buffer) > 0 {
            continue;
        }

        let source = std::mem::take(&mut buffer);
        if let Err(e) = session.run(&source) {
            eprintln!("{}", e);
        }
    }

    info!("REPL finished");
    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => tokenize(filename, json),
        Commands::Parse { filename, json } => parse(filename, json),
        Commands::Run { filename } => run(filename),
        Commands::Repl => repl(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_braces() {
        assert_eq!(open_braces("fun f() {"), 1);
        assert_eq!(open_braces("fun f() {\n  return 1;\n}"), 0);
        assert_eq!(open_braces("}"), -1);
    }
}
