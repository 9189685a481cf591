pub mod error;
pub mod types;
pub mod config;
pub mod memory;
pub mod lexer;
pub mod trace;
pub mod semantic;
pub mod codegen;

use codegen::{ProgramArtifact, QuadGenerator};
use config::CompilerConfig;
use error::QuadraResult;

pub struct Compiler {
    config: CompilerConfig,
}

impl Compiler {
    pub fn new() -> Self {
        Self::with_config(CompilerConfig::default())
    }

    pub fn with_config(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Replays an action trace and returns the program artifact.
    pub fn compile(&self, source: &str) -> QuadraResult<ProgramArtifact> {
        // 0. Check the address layout
        self.config.layout.validate()?;

        // 1. Lex
        let tokens = lexer::lex(source)?;
        log::debug!("{} tokens", tokens.len());

        // 2. Parse actions
        let lines = trace::parse(tokens)?;

        // 3. Semantic analysis and quadruple generation
        let mut generator = QuadGenerator::with_layout(self.config.layout.clone());
        trace::replay(&mut generator, &lines)?;

        // 4. Output
        Ok(generator.into_artifact())
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}
