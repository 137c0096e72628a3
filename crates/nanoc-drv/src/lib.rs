//! nanoc-drv — the compiler driver.
//!
//! Parses CLI arguments, runs the pipeline (lex, parse, TAC, legalized
//! assembly, text emission) stage by stage, and either writes the
//! resulting assembly or dumps whichever intermediate form `--print-*`
//! named and stops early. Library crates only ever emit `tracing` events;
//! this is the only crate that owns stdout/stderr framing.

use std::io::Read as _;
use std::path::PathBuf;

use clap::Parser as ClapParser;
use tracing::{debug, info};

/// Command-line surface for the `nanoc` binary.
#[derive(Debug, ClapParser)]
#[command(name = "nanoc", version, about = "A subset-of-C to x86-64 compiler")]
pub struct Cli {
    /// Path to a preprocessed C source file; "-" reads standard input
    pub input: PathBuf,

    /// Write assembly here instead of standard output
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// "linux" or "macos" (default: host OS)
    #[arg(long, value_name = "TARGET")]
    pub target: Option<String>,

    /// Dump the token stream and stop
    #[arg(long)]
    pub print_tokens: bool,

    /// Dump the parsed AST and stop
    #[arg(long)]
    pub print_ast: bool,

    /// Dump the TAC program and stop
    #[arg(long)]
    pub print_tacky: bool,

    /// Dump the legalized assembly IR and stop
    #[arg(long)]
    pub print_asm_ast: bool,

    /// Emit a trace of each pass to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Fully resolved configuration for one compilation.
#[derive(Debug, Clone)]
pub struct Config {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub target: nanoc_gen::Target,
    pub stop_after: Option<PrintStage>,
    pub verbose: bool,
}

/// Which `--print-*` flag (if any) was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintStage {
    Tokens,
    Ast,
    Tacky,
    AsmAst,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Config> {
        let target = match &cli.target {
            Some(name) => nanoc_gen::Target::parse(name)
                .ok_or_else(|| anyhow::anyhow!("unknown target \"{name}\" (expected \"linux\" or \"macos\")"))?,
            None => nanoc_gen::Target::host(),
        };

        let stop_after = if cli.print_tokens {
            Some(PrintStage::Tokens)
        } else if cli.print_ast {
            Some(PrintStage::Ast)
        } else if cli.print_tacky {
            Some(PrintStage::Tacky)
        } else if cli.print_asm_ast {
            Some(PrintStage::AsmAst)
        } else {
            None
        };

        Ok(Config { input: cli.input.clone(), output: cli.output.clone(), target, stop_after, verbose: cli.verbose })
    }
}

/// Initializes the global `tracing` subscriber. `-v`/`--verbose` raises the
/// default filter from `warn` to `info`.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn read_input(path: &std::path::Path) -> anyhow::Result<String> {
    if path == std::path::Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

fn write_output(output: &Option<PathBuf>, text: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => std::fs::write(path, text)?,
        None => print!("{text}"),
    }
    Ok(())
}

/// Runs the full pipeline for one `Config`, returning the text that would
/// be written (assembly, or a `Debug` dump if a `--print-*` flag stopped
/// the pipeline early).
pub fn compile(config: &Config) -> anyhow::Result<String> {
    let source = read_input(&config.input)?;

    debug!(stage = "lex", "starting");
    let tokens = nanoc_lex::Lexer::tokenize(&source).map_err(anyhow::Error::from)?;
    info!(stage = "lex", tokens = tokens.len(), "finished");
    if config.stop_after == Some(PrintStage::Tokens) {
        return Ok(format!("{tokens:#?}\n"));
    }

    debug!(stage = "parse", "starting");
    let ast = nanoc_par::parse(tokens).map_err(anyhow::Error::from)?;
    info!(stage = "parse", "finished");
    if config.stop_after == Some(PrintStage::Ast) {
        return Ok(format!("{ast:#?}\n"));
    }

    debug!(stage = "tac", "starting");
    let tac = nanoc_tac::generate(&ast).map_err(anyhow::Error::from)?;
    info!(stage = "tac", functions = tac.functions.len(), "finished");
    if config.stop_after == Some(PrintStage::Tacky) {
        return Ok(format!("{tac:#?}\n"));
    }

    debug!(stage = "lir", "starting");
    let asm_ir = nanoc_lir::generate(&tac);
    info!(stage = "lir", "finished");
    if config.stop_after == Some(PrintStage::AsmAst) {
        return Ok(format!("{asm_ir:#?}\n"));
    }

    debug!(stage = "gen", target = ?config.target, "starting");
    let text = nanoc_gen::emit(&asm_ir, config.target);
    info!(stage = "gen", "finished");
    Ok(text)
}

/// Entry point shared by `main` and the integration tests that drive the
/// library directly rather than spawning the `nanoc` binary.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    init_tracing(cli.verbose);
    let config = Config::from_cli(&cli)?;
    let text = compile(&config)?;
    write_output(&config.output, &text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(src_path: PathBuf, stop_after: Option<PrintStage>) -> Config {
        Config { input: src_path, output: None, target: nanoc_gen::Target::Linux, stop_after, verbose: false }
    }

    fn write_source(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn compiles_a_trivial_program_to_assembly_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(&dir, "main.c", "int main(void) { return 2; }");
        let text = compile(&config(path, None)).expect("compilation should succeed");
        assert!(text.contains("main:"));
        assert!(text.contains("ret"));
    }

    #[test]
    fn print_tacky_stops_before_assembly_generation() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(&dir, "main.c", "int main(void) { return 0; }");
        let text = compile(&config(path, Some(PrintStage::Tacky))).expect("should succeed");
        assert!(!text.contains(".globl"));
    }

    #[test]
    fn lexical_error_surfaces_as_a_stage_prefixed_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(&dir, "bad.c", "int main(void) { return `; }");
        let err = compile(&config(path, None)).expect_err("should fail to lex");
        assert!(err.to_string().contains("Lexer Error"));
    }

    #[test]
    fn semantic_error_surfaces_as_a_stage_prefixed_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(&dir, "bad.c", "int main(void) { return undeclared_thing; }");
        let err = compile(&config(path, None)).expect_err("should fail semantic analysis");
        assert!(err.to_string().contains("Semantic Error"));
    }
}
