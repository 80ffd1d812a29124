use clap::Parser;
use clap::error::ErrorKind;
use glint_core::{CompilationStats, Compiler, ShaderStage};
use log::info;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use thiserror::Error;

#[derive(Parser)]
#[command(name = "glint")]
#[command(about = "Shader compiler: glint DSL to SPIR-V", long_about = None)]
struct Cli {
    /// Input shader file in the glint DSL
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output SPIR-V file
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Shader type: 'vertex' or 'fragment'
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    shader_type: ShaderStage,

    /// Disable optimization passes
    #[arg(long)]
    no_opt: bool,

    /// Print detailed compilation statistics
    #[arg(long)]
    stats: bool,

    /// Print per-phase progress output
    #[arg(short, long)]
    verbose: bool,

    /// Print the generated GLSL to stdout
    #[arg(long)]
    glsl: bool,
}

#[derive(Debug, Error)]
enum DriverError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("[{} error] {0}", .0.stage())]
    Compilation(#[from] glint_core::CompilerError),
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = err.print();
            process::exit(code);
        }
    };

    // --verbose lifts the default log level so the library's per-phase
    // progress lines show up without RUST_LOG being set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(
        if cli.verbose { "info" } else { "warn" },
    ))
    .init();

    if let Err(err) = run(&cli) {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), DriverError> {
    println!("=== glint shader compiler ===");
    println!("Input:  {}", cli.input.display());
    println!("Output: {}", cli.output.display());
    println!("Type:   {}", cli.shader_type);
    println!(
        "Optimization: {}",
        if cli.no_opt { "disabled" } else { "enabled" }
    );
    println!();

    if cli.verbose {
        info!("Compiling {}...", cli.input.display());
    }

    let mut compiler = Compiler::new();
    compiler.set_optimization_enabled(!cli.no_opt);
    compiler.set_verbose(cli.verbose);

    let words = compiler.compile_file(&cli.input, cli.shader_type)?;

    let mut file = fs::File::create(&cli.output)?;
    for word in &words {
        file.write_all(&word.to_le_bytes())?;
    }

    println!(
        "Wrote {} ({} bytes, {} words)",
        cli.output.display(),
        words.len() * 4,
        words.len()
    );

    if cli.glsl {
        println!("\n=== Generated GLSL ===");
        print!("{}", compiler.generated_glsl());
        println!("======================");
    }

    if cli.stats {
        print_stats(compiler.stats(), !cli.no_opt);
    }

    Ok(())
}

fn print_stats(stats: &CompilationStats, optimized: bool) {
    println!("\n=== Compilation statistics ===");
    println!("Timing:");
    println!("  Total:        {:.3} ms", stats.total_time_ms);
    println!("  Lexing:       {:.3} ms", stats.lexing_time_ms);
    println!("  Parsing:      {:.3} ms", stats.parsing_time_ms);
    println!("  Optimization: {:.3} ms", stats.optimization_time_ms);
    println!("  Code gen:     {:.3} ms", stats.codegen_time_ms);
    println!("Tokens: {}", stats.token_count);
    println!("AST nodes: {}", stats.ast_node_count);

    if optimized {
        println!("Optimizer:");
        println!("  Passes: {}", stats.optimization_passes);
        println!("  Constants folded: {}", stats.constants_folded);
        println!(
            "  Algebraic simplifications: {}",
            stats.algebraic_simplifications
        );
        println!("  Dead code eliminated: {}", stats.dead_code_eliminated);
        print!(
            "  Statements: {} -> {}",
            stats.original_statement_count, stats.optimized_statement_count
        );
        let removed = stats
            .original_statement_count
            .saturating_sub(stats.optimized_statement_count);
        if removed > 0 {
            let percent = 100.0 * removed as f64 / stats.original_statement_count as f64;
            print!(" ({} removed, {:.1}% reduction)", removed, percent);
        }
        println!();
    } else {
        println!("Statements: {}", stats.original_statement_count);
    }

    println!(
        "SPIR-V: {} bytes, {} words",
        stats.spirv_size_bytes, stats.spirv_instruction_count
    );
}
