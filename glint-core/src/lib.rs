pub mod ast;
pub mod codegen;
pub mod error;
pub mod lexer;
pub mod optimizer;
pub mod parser;
pub mod spirv;


pub use ast::ShaderStage;
pub use error::{CompilerError, Result, Stage};

use codegen::CodeGenerator;
use log::info;
use optimizer::Optimizer;
use parser::Parser;
use std::fs;
use std::path::Path;
use std::time::Instant;

/// Flat record of per-compilation metrics. Partially populated when a
/// compilation fails part-way through.
#[derive(Debug, Default, Clone)]
pub struct CompilationStats {
    pub token_count: usize,
    pub ast_node_count: usize,
    pub original_statement_count: usize,
    pub optimized_statement_count: usize,
    pub constants_folded: usize,
    pub dead_code_eliminated: usize,
    pub algebraic_simplifications: usize,
    pub optimization_passes: usize,
    pub spirv_size_bytes: usize,
    pub spirv_instruction_count: usize,
    pub lexing_time_ms: f64,
    pub parsing_time_ms: f64,
    pub optimization_time_ms: f64,
    pub codegen_time_ms: f64,
    pub total_time_ms: f64,
}

/// Drives the pipeline: lexing, parsing, optimization, code generation.
///
/// Each compilation owns its compiler instance; the only process-global
/// state is the temp-file counter inside the spirv module.
pub struct Compiler {
    optimization_enabled: bool,
    verbose: bool,
    stats: CompilationStats,
    generated_glsl: String,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Compiler {
            optimization_enabled: true,
            verbose: false,
            stats: CompilationStats::default(),
            generated_glsl: String::new(),
        }
    }

    pub fn set_optimization_enabled(&mut self, enabled: bool) {
        self.optimization_enabled = enabled;
    }

    pub fn set_verbose(&mut self, enabled: bool) {
        self.verbose = enabled;
    }

    pub fn stats(&self) -> &CompilationStats {
        &self.stats
    }

    /// GLSL text produced by the most recent successful emission.
    pub fn generated_glsl(&self) -> &str {
        &self.generated_glsl
    }

    /// Compile DSL source to SPIR-V words for the requested stage.
    pub fn compile(&mut self, source: &str, stage: ShaderStage) -> Result<Vec<u32>> {
        let total_start = Instant::now();
        let glsl = self.run_front_end(source, stage)?;

        let start = Instant::now();
        let words = spirv::assemble(&glsl, stage)?;
        self.stats.codegen_time_ms += elapsed_ms(start);

        self.stats.spirv_size_bytes = words.len() * 4;
        self.stats.spirv_instruction_count = words.len();
        self.stats.total_time_ms = elapsed_ms(total_start);

        if self.verbose {
            info!(
                "code generation complete: {} bytes of SPIR-V ({} words)",
                self.stats.spirv_size_bytes, self.stats.spirv_instruction_count
            );
        }

        Ok(words)
    }

    /// Run the pipeline up to GLSL emission, skipping the external
    /// assembler. Useful for inspecting the intermediate form.
    pub fn compile_to_glsl(&mut self, source: &str, stage: ShaderStage) -> Result<String> {
        let total_start = Instant::now();
        let glsl = self.run_front_end(source, stage)?;
        self.stats.total_time_ms = elapsed_ms(total_start);
        Ok(glsl)
    }

    pub fn compile_file(&mut self, path: &Path, stage: ShaderStage) -> Result<Vec<u32>> {
        if self.verbose {
            info!("loading shader from {}", path.display());
        }

        let source = fs::read_to_string(path)?;
        if source.is_empty() {
            return Err(CompilerError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("shader file is empty: {}", path.display()),
            )));
        }

        self.compile(&source, stage)
    }

    fn run_front_end(&mut self, source: &str, stage: ShaderStage) -> Result<String> {
        self.stats = CompilationStats::default();
        self.generated_glsl.clear();

        let start = Instant::now();
        let tokens = lexer::tokenize(source)?;
        self.stats.lexing_time_ms = elapsed_ms(start);
        self.stats.token_count = tokens.len();
        if self.verbose {
            info!("lexing complete: {} tokens", self.stats.token_count);
        }

        let start = Instant::now();
        let mut program = Parser::new(tokens).parse()?;
        self.stats.parsing_time_ms = elapsed_ms(start);
        self.stats.ast_node_count = program.node_count();
        self.stats.original_statement_count = program.statement_count();
        if self.verbose {
            info!(
                "parsing complete: {} AST nodes, {} statements",
                self.stats.ast_node_count, self.stats.original_statement_count
            );
        }

        if self.optimization_enabled {
            let start = Instant::now();
            let mut optimizer = Optimizer::new();
            optimizer.optimize(&mut program);
            self.stats.optimization_time_ms = elapsed_ms(start);

            let opt_stats = optimizer.stats();
            self.stats.constants_folded = opt_stats.constants_folded;
            self.stats.dead_code_eliminated = opt_stats.dead_code_removed;
            self.stats.algebraic_simplifications = opt_stats.algebraic_simplifications;
            self.stats.optimization_passes = opt_stats.total_passes;
            self.stats.optimized_statement_count = program.statement_count();
            if self.verbose {
                info!(
                    "optimization complete: {} passes, {} folded, {} simplified, {} removed",
                    opt_stats.total_passes,
                    opt_stats.constants_folded,
                    opt_stats.algebraic_simplifications,
                    opt_stats.dead_code_removed
                );
            }
        } else {
            if self.verbose {
                info!("optimization disabled, skipping");
            }
            self.stats.optimized_statement_count = self.stats.original_statement_count;
        }

        let start = Instant::now();
        let mut codegen = CodeGenerator::new();
        let glsl = codegen.generate_glsl(&program, stage)?;
        self.stats.codegen_time_ms = elapsed_ms(start);
        self.generated_glsl = glsl.clone();

        Ok(glsl)
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
