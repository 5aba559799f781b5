mod ast;
mod builtins;
mod config;
mod control;
mod env;
mod error;
mod machine;
mod parser;
mod scanner;
mod standardize;
mod value;

use clap::Parser as ClapParser;
use control::ControlBuilder;
use env::Environment;
use machine::Machine;
use std::path::PathBuf;
use std::process::ExitCode;

/// A tree-standardizing, control-stack-environment interpreter for RPAL.
#[derive(ClapParser, Debug)]
#[command(name = "rpal")]
#[command(version = config::VERSION)]
#[command(about = "RPAL interpreter: standardize, compile to control structures, evaluate")]
struct CliArgs {
    /// RPAL source file to interpret
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Print the source verbatim before evaluation
    #[arg(short = 'l', long = "lex")]
    lex: bool,

    /// Print the surface AST (post-parse, pre-standardization) and exit
    #[arg(short = 'a', long = "ast")]
    ast: bool,

    /// Print the standardized AST and exit
    #[arg(short = 's', long = "st")]
    standardized_tree: bool,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let source = match std::fs::read_to_string(&args.input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("rpal: cannot read {}: {}", args.input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    match run(&source, &args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("rpal: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(source: &str, args: &CliArgs) -> Result<(), error::InterpError> {
    if args.lex {
        print!("{}", source);
    }

    let tokens = scanner::scan(source)?;
    let surface_ast = parser::Parser::new(tokens).parse()?;
    if args.ast {
        print!("{}", surface_ast.print_tree());
        return Ok(());
    }

    let standardized = standardize::standardize(surface_ast)?;
    if args.standardized_tree {
        print!("{}", standardized.print_tree());
        return Ok(());
    }

    let delta0 = ControlBuilder::new().build(standardized);
    let root_env = Environment::new();
    builtins::register_all(&root_env);

    let mut stdout = std::io::stdout();
    let machine = Machine::new(root_env, &mut stdout);
    machine.run(delta0)?;
    Ok(())
}
