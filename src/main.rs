mod monkey;

use anyhow::{bail, Result};
use clap::{Parser as ClapParser, ValueEnum};
use monkey::environment::Environment;
use monkey::evaluator::eval_program;
use monkey::lexer::Lexer;
use monkey::parser::{Parser, ParserError};
use monkey::token::TokenType;
use std::cell::RefCell;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Stage {
    Lex,
    Parse,
    Eval,
}

#[derive(ClapParser, Debug)]
struct Args {
    file: Option<PathBuf>,
    /// Stop after the given stage: print tokens, the parsed AST, or evaluate.
    #[arg(short, long, value_enum, default_value = "eval")]
    run: Stage,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    if let Err(why) = match args.file {
        Some(pbuf) => run_file(pbuf, args.run),
        None => run_prompt(args.run),
    } {
        eprintln!("ERROR: {}", why);
    }
}

fn run_file(path: PathBuf, stage: Stage) -> Result<()> {
    if !path.exists() || !path.is_file() {
        bail!("Path does not exist or is not a valid file.");
    }
    let content = match std::fs::read(&path) {
        Ok(c) => c,
        Err(_) => bail!("Failed to read file."),
    };
    let source = match std::str::from_utf8(&content) {
        Ok(s) => s,
        Err(_) => bail!("Failed to decode unicode."),
    };
    let env = Environment::new();
    run(source, stage, &env)
}

fn print_prompt() -> Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if let Err(why) = handle.write(b"\n>> ") {
        bail!("Failed to write prompt to console.\n\nCaused by:\n{:#?}", why);
    }
    if let Err(why) = handle.flush() {
        bail!("Failed to flush prompt to console.\n\nCaused by:\n{:#?}", why);
    }
    Ok(())
}

fn run_prompt(stage: Stage) -> Result<()> {
    println!("Running monkey interpreter ({:?} stage)...", stage);
    // One environment for the whole session, so bindings survive across lines.
    let env = Environment::new();
    let stdin = std::io::stdin();
    print_prompt()?;
    for line in stdin.lock().lines() {
        println!();
        match line {
            Ok(l) => run(&l, stage, &env)?,
            Err(_) => bail!("Failed to read line"),
        }
        print_prompt()?;
    }
    Ok(())
}

fn run(source: &str, stage: Stage, env: &Rc<RefCell<Environment>>) -> Result<()> {
    match stage {
        Stage::Lex => run_lexer(source),
        Stage::Parse => run_parser(source),
        Stage::Eval => run_evaluator(source, env),
    }
}

fn run_lexer(source: &str) -> Result<()> {
    let mut lexer = Lexer::new(source);
    loop {
        let token = lexer.next_token();
        if token.token_type == TokenType::Eof {
            break;
        }
        println!("{:?}", token);
    }
    Ok(())
}

fn run_parser(source: &str) -> Result<()> {
    let mut parser = Parser::new(Lexer::new(source));
    let (program, errors) = parser.parse_program();
    if !errors.is_empty() {
        report_parse_errors(&errors);
        return Ok(());
    }
    println!("{}", program);
    Ok(())
}

fn run_evaluator(source: &str, env: &Rc<RefCell<Environment>>) -> Result<()> {
    let mut parser = Parser::new(Lexer::new(source));
    let (program, errors) = parser.parse_program();
    // A partial AST is not worth evaluating; report the batch and move on.
    if !errors.is_empty() {
        report_parse_errors(&errors);
        return Ok(());
    }
    let evaluated = eval_program(&program, env);
    println!("{}", evaluated.inspect());
    Ok(())
}

fn report_parse_errors(errors: &[ParserError]) {
    println!("parser has {} errors:", errors.len());
    for error in errors {
        println!("parser error: {}", error);
    }
}
