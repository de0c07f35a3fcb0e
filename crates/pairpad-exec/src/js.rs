//! In-process JavaScript evaluation.

use async_trait::async_trait;
use boa_engine::{Context, Source};

use crate::{ExecError, RuntimeAdapter};

/// Evaluates JavaScript with an embedded engine, one fresh context per run.
///
/// The script's completion value is coerced to text; `undefined` and `null`
/// render as an empty string. Parse and throw both surface as
/// [`ExecError::Execution`]. There is no timeout: a `while(true){}` runs
/// until the caller gives up.
pub struct ScriptRuntime;

impl ScriptRuntime {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ScriptRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RuntimeAdapter for ScriptRuntime {
    async fn run(&self, code: &str) -> Result<String, ExecError> {
        let code = code.to_owned();
        // Context is not Send; build and drop it inside the blocking task.
        tokio::task::spawn_blocking(move || eval_source(&code))
            .await
            .map_err(|e| ExecError::Execution(format!("execution task failed: {e}")))?
    }
}

fn eval_source(code: &str) -> Result<String, ExecError> {
    let mut context = Context::default();
    match context.eval(Source::from_bytes(code)) {
        Ok(value) if value.is_undefined() || value.is_null() => Ok(String::new()),
        Ok(value) => value
            .to_string(&mut context)
            .map(|s| s.to_std_string_escaped())
            .map_err(|e| ExecError::Execution(e.to_string())),
        Err(e) => Err(ExecError::Execution(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn expression_value_is_coerced_to_text() {
        let runtime = ScriptRuntime::new();
        assert_eq!(runtime.run("2+2").await.unwrap(), "4");
        assert_eq!(runtime.run("'a' + 'b'").await.unwrap(), "ab");
        assert_eq!(runtime.run("[1,2,3].length").await.unwrap(), "3");
    }

    #[tokio::test]
    async fn undefined_and_null_render_empty() {
        let runtime = ScriptRuntime::new();
        assert_eq!(runtime.run("undefined").await.unwrap(), "");
        assert_eq!(runtime.run("null").await.unwrap(), "");
        assert_eq!(runtime.run("let x = 1;").await.unwrap(), "");
    }

    #[tokio::test]
    async fn thrown_errors_surface_as_messages() {
        let runtime = ScriptRuntime::new();
        let err = runtime.run("throw new Error('boom')").await.unwrap_err();
        match err {
            ExecError::Execution(msg) => assert!(msg.contains("boom")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn syntax_errors_surface_as_messages() {
        let runtime = ScriptRuntime::new();
        assert!(matches!(
            runtime.run("function {").await.unwrap_err(),
            ExecError::Execution(_)
        ));
    }

    #[tokio::test]
    async fn state_does_not_leak_between_runs() {
        let runtime = ScriptRuntime::new();
        runtime.run("var leak = 42;").await.unwrap();
        // Fresh context per run: the binding is gone.
        assert!(runtime.run("leak").await.is_err());
    }
}
