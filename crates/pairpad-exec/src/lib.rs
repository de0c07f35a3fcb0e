//! Execution dispatcher: runs the mirrored session code in the runtime
//! matching its language and returns captured textual output.
//!
//! Two adapters ship by default: an in-process JavaScript evaluator and a
//! lazily-initialized embedded Python interpreter. Execution is local to the
//! requesting client; there is no timeout and no sandbox beyond the embedded
//! engines themselves.

mod js;
mod python;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use pairpad_common::Language;

pub use js::ScriptRuntime;
pub use python::PythonRuntime;

/// Execution failures as shown to the requesting user.
///
/// All of these are terminal at the output panel: they never affect the
/// session or other participants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("python runtime is still loading")]
    RuntimeLoading,

    #[error("python runtime failed to initialize: {0}")]
    RuntimeInit(String),

    #[error("{0}")]
    Execution(String),
}

/// A pluggable executor for one supported language.
#[async_trait]
pub trait RuntimeAdapter: Send + Sync {
    /// Run `code` to completion and return its textual output.
    async fn run(&self, code: &str) -> Result<String, ExecError>;
}

/// Routes execution requests to the adapter registered for the language.
pub struct Dispatcher {
    adapters: HashMap<Language, Arc<dyn RuntimeAdapter>>,
}

impl Dispatcher {
    /// Dispatcher with the default JavaScript and Python adapters.
    pub fn new() -> Self {
        let mut dispatcher = Self {
            adapters: HashMap::new(),
        };
        dispatcher.register(Language::Javascript, Arc::new(ScriptRuntime::new()));
        dispatcher.register(Language::Python, Arc::new(PythonRuntime::new()));
        dispatcher
    }

    /// Register (or replace) the adapter for a language.
    pub fn register(&mut self, language: Language, adapter: Arc<dyn RuntimeAdapter>) {
        self.adapters.insert(language, adapter);
    }

    /// Start the Python interpreter bootstrap without running anything.
    /// Idempotent; useful at UI startup so the first Run is ready sooner.
    pub fn warm_up(&self) {
        PythonRuntime::warm_up();
    }

    /// Execute `code` in the runtime for `language`.
    ///
    /// Output is normalized: trailing whitespace trimmed, `undefined`/`None`
    /// results rendered as an empty string.
    pub async fn execute(&self, code: &str, language: &Language) -> Result<String, ExecError> {
        let adapter = self
            .adapters
            .get(language)
            .ok_or_else(|| ExecError::UnsupportedLanguage(language.as_str().to_string()))?;
        let output = adapter.run(code).await?;
        Ok(output.trim_end().to_string())
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
