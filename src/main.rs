//! Catalyst Compiler CLI
//!
//! The `catc` command reads a Catalyst source file, parses it, lowers it
//! to IR and prints the textual IR to stdout (or writes it to a file
//! with `-o`). Malformed source never aborts the run: lexer, parser and
//! lowering diagnostics go to stderr and compilation carries on with
//! whatever survived.

use clap::Parser as ClapParser;
use std::fs;
use std::path::PathBuf;

use catalyst::ir::{self, Lowerer};
use catalyst::parser::Parser;
use catalyst::span::Position;
use catalyst::{lexer, VERSION};

#[derive(ClapParser)]
#[command(name = "catc")]
#[command(version = VERSION)]
#[command(about = "The Catalyst compiler front end", long_about = None)]
struct Cli {
    /// Source file to compile
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Write the IR to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Emit tokens (for debugging)
    #[arg(long)]
    emit_tokens: bool,

    /// Emit AST (for debugging)
    #[arg(long)]
    emit_ast: bool,
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let source = fs::read_to_string(&cli.input)
        .map_err(|e| miette::miette!("failed to read {}: {}", cli.input.display(), e))?;

    let (tokens, lex_errors) = lexer::lex(&source);
    for err in &lex_errors {
        eprintln!("lexer error: {}", err);
    }

    if cli.emit_tokens {
        for token in &tokens {
            println!(
                "{:>4}..{:<4} {:16} {:?}",
                token.span.start,
                token.span.end,
                format!("{:?}", token.kind),
                token.text(&source)
            );
        }
    }

    let mut parser = Parser::new(&source, tokens);
    let ast = parser.parse_module();
    for err in parser.errors() {
        let pos = Position::locate(&source, err.span.start);
        eprintln!("parse error at {}: {}", pos, err);
    }

    if cli.emit_ast {
        println!("{:#?}", ast);
    }

    let module_name = cli
        .input
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let module = Lowerer::new(module_name).lower_module(&ast);

    // Backend-side structural check; a broken function is reported but
    // the module is still emitted
    for err in ir::verify_module(&module) {
        eprintln!("error: {}", err);
    }

    match cli.output {
        Some(path) => ir::write_module(&module, &path)
            .map_err(|e| miette::miette!("could not open {} for writing: {}", path.display(), e))?,
        None => print!("{}", ir::print_module(&module)),
    }

    Ok(())
}
