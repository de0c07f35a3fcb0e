//! Embedded Python execution.
//!
//! The interpreter is heavyweight, so it is bootstrapped lazily and exactly
//! once per process: the worker handle lives in a `OnceLock` (single-flight
//! creation) and readiness is published on a `watch` channel every caller
//! observes. Until the bootstrap finishes, `run` answers immediately with
//! [`ExecError::RuntimeLoading`] instead of blocking.
//!
//! Each run executes the user code with an empty top-level namespace while
//! stdout is swapped for a capture buffer. The interpreter itself is shared
//! across runs, so its own global state (anything hung off `sys`, imported
//! module caches) persists between executions.

use std::sync::OnceLock;

use async_trait::async_trait;
use rustpython_vm::builtins::PyBaseExceptionRef;
use rustpython_vm::{compiler, Interpreter, VirtualMachine};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info};

use crate::{ExecError, RuntimeAdapter};

static RUNTIME: OnceLock<RuntimeHandle> = OnceLock::new();

/// Adapter front for the process-wide Python worker.
pub struct PythonRuntime;

impl PythonRuntime {
    pub fn new() -> Self {
        Self
    }

    /// Start the interpreter bootstrap if it has not started yet.
    pub fn warm_up() {
        handle();
    }

    /// Wait until the interpreter is ready (or failed). Only useful for
    /// callers that prefer blocking over a retryable loading error.
    pub async fn wait_ready() {
        let mut ready = handle().ready.clone();
        loop {
            if !matches!(*ready.borrow(), ReadyState::Loading) {
                return;
            }
            if ready.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for PythonRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RuntimeAdapter for PythonRuntime {
    async fn run(&self, code: &str) -> Result<String, ExecError> {
        run_on(handle(), code).await
    }
}

fn handle() -> &'static RuntimeHandle {
    RUNTIME.get_or_init(RuntimeHandle::spawn)
}

// ---------------------------------------------------------------------------
// Worker Handle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum ReadyState {
    Loading,
    Ready,
    Failed(String),
}

struct Job {
    code: String,
    reply: oneshot::Sender<Result<String, ExecError>>,
}

struct RuntimeHandle {
    jobs: mpsc::Sender<Job>,
    ready: watch::Receiver<ReadyState>,
}

impl RuntimeHandle {
    /// Spawn the dedicated interpreter thread. Returns immediately; the
    /// watch channel reports when the bootstrap completes or fails.
    fn spawn() -> Self {
        let (job_tx, job_rx) = mpsc::channel::<Job>(32);
        let (ready_tx, ready_rx) = watch::channel(ReadyState::Loading);

        let spawned = std::thread::Builder::new()
            .name("pairpad-python".into())
            .spawn(move || worker_loop(job_rx, ready_tx));
        if let Err(e) = spawned {
            error!(error = %e, "Failed to spawn python worker thread");
            // ready_tx went down with the closure; publish the failure on a
            // fresh channel. Receivers keep the last value after the sender
            // drops.
            let (_failed_tx, failed_rx) = watch::channel(ReadyState::Failed(e.to_string()));
            return Self {
                jobs: job_tx,
                ready: failed_rx,
            };
        }

        Self {
            jobs: job_tx,
            ready: ready_rx,
        }
    }
}

/// Gate + round-trip shared by the adapter and the tests.
async fn run_on(handle: &RuntimeHandle, code: &str) -> Result<String, ExecError> {
    let state = handle.ready.borrow().clone();
    match state {
        ReadyState::Loading => return Err(ExecError::RuntimeLoading),
        ReadyState::Failed(msg) => return Err(ExecError::RuntimeInit(msg)),
        ReadyState::Ready => {}
    }

    let (reply_tx, reply_rx) = oneshot::channel();
    handle
        .jobs
        .send(Job {
            code: code.to_string(),
            reply: reply_tx,
        })
        .await
        .map_err(|_| ExecError::RuntimeInit("python worker is gone".into()))?;
    reply_rx
        .await
        .map_err(|_| ExecError::Execution("python worker dropped the job".into()))?
}

// ---------------------------------------------------------------------------
// Worker Thread
// ---------------------------------------------------------------------------

fn worker_loop(mut jobs: mpsc::Receiver<Job>, ready: watch::Sender<ReadyState>) {
    info!("Bootstrapping embedded python interpreter");
    let interpreter = Interpreter::without_stdlib(Default::default());

    // Sanity run; a broken bootstrap fails every caller with the same error.
    if let Err(msg) = run_capture(&interpreter, "pass") {
        error!(error = %msg, "Python interpreter failed its bootstrap check");
        let _ = ready.send(ReadyState::Failed(msg));
        return;
    }

    info!("Python interpreter ready");
    let _ = ready.send(ReadyState::Ready);

    while let Some(job) = jobs.blocking_recv() {
        let result = run_capture(&interpreter, &job.code).map_err(ExecError::Execution);
        if job.reply.send(result).is_err() {
            debug!("Python caller went away before the result");
        }
    }
}

/// Run user code with stdout captured and an empty top-level namespace.
fn run_capture(interpreter: &Interpreter, code: &str) -> Result<String, String> {
    // Embed the user code as a Python string literal. JSON string escaping
    // is a valid subset of Python's, so this survives quotes and newlines.
    let literal = match serde_json::to_string(code) {
        Ok(l) => l,
        Err(e) => return Err(format!("failed to encode source: {e}")),
    };

    let wrapper = format!(
        r#"
import sys

class _PairpadBuffer:
    def __init__(self):
        self.chunks = []
    def write(self, text):
        self.chunks.append(str(text))
    def flush(self):
        pass

_pairpad_buf = _PairpadBuffer()
_pairpad_prev = getattr(sys, "stdout", None)
sys.stdout = _pairpad_buf
try:
    exec(compile({literal}, "<session>", "exec"), {{}})
finally:
    sys.stdout = _pairpad_prev
"#
    );

    interpreter.enter(|vm| {
        let scope = vm.new_scope_with_builtins();

        let exec_result = vm
            .compile(&wrapper, compiler::Mode::Exec, "<capture>".to_owned())
            .map_err(|err| vm.new_syntax_error(&err, Some(wrapper.as_str())))
            .and_then(|code_obj| vm.run_code_obj(code_obj, scope.clone()));
        if let Err(exc) = exec_result {
            return Err(format_exception(vm, &exc));
        }

        // The buffer survives in the wrapper scope; join it there.
        let collect = r#""".join(_pairpad_buf.chunks)"#;
        let captured = vm
            .compile(collect, compiler::Mode::Eval, "<capture>".to_owned())
            .map_err(|err| vm.new_syntax_error(&err, Some(collect)))
            .and_then(|code_obj| vm.run_code_obj(code_obj, scope))
            .and_then(|value| value.str(vm));
        match captured {
            Ok(text) => Ok(text.as_str().to_owned()),
            Err(exc) => Err(format_exception(vm, &exc)),
        }
    })
}

fn format_exception(vm: &VirtualMachine, exc: &PyBaseExceptionRef) -> String {
    let mut out = String::new();
    if vm.write_exception(&mut out, exc).is_err() {
        out = "python execution failed".to_string();
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Handle whose bootstrap never completes.
    fn loading_handle() -> (RuntimeHandle, watch::Sender<ReadyState>) {
        let (job_tx, _job_rx) = mpsc::channel(1);
        let (ready_tx, ready_rx) = watch::channel(ReadyState::Loading);
        (
            RuntimeHandle {
                jobs: job_tx,
                ready: ready_rx,
            },
            ready_tx,
        )
    }

    #[tokio::test]
    async fn run_before_bootstrap_returns_loading_error() {
        let (handle, _ready_tx) = loading_handle();
        let err = run_on(&handle, "print(1)").await.unwrap_err();
        assert_eq!(err, ExecError::RuntimeLoading);
    }

    #[tokio::test]
    async fn failed_bootstrap_fails_every_caller() {
        let (handle, ready_tx) = loading_handle();
        ready_tx
            .send(ReadyState::Failed("download failed".into()))
            .unwrap();
        for _ in 0..3 {
            let err = run_on(&handle, "print(1)").await.unwrap_err();
            assert_eq!(err, ExecError::RuntimeInit("download failed".into()));
        }
    }

    #[tokio::test]
    async fn print_output_is_captured() {
        PythonRuntime::warm_up();
        PythonRuntime::wait_ready().await;
        let runtime = PythonRuntime::new();

        let out = runtime.run("print(2+2)").await.unwrap();
        assert_eq!(out.trim_end(), "4");
    }

    #[tokio::test]
    async fn multiple_prints_concatenate_in_order() {
        PythonRuntime::wait_ready().await;
        let runtime = PythonRuntime::new();

        let out = runtime.run("print('a')\nprint('b')").await.unwrap();
        assert_eq!(out, "a\nb\n");
    }

    #[tokio::test]
    async fn exceptions_surface_as_messages() {
        PythonRuntime::wait_ready().await;
        let runtime = PythonRuntime::new();

        let err = runtime.run("boom").await.unwrap_err();
        match err {
            ExecError::Execution(msg) => assert!(msg.contains("NameError")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn each_run_starts_with_an_empty_namespace() {
        PythonRuntime::wait_ready().await;
        let runtime = PythonRuntime::new();

        runtime.run("leaked = 1").await.unwrap();
        let err = runtime.run("print(leaked)").await.unwrap_err();
        assert!(matches!(err, ExecError::Execution(_)));
    }

    #[tokio::test]
    async fn expressions_without_prints_produce_empty_output() {
        PythonRuntime::wait_ready().await;
        let runtime = PythonRuntime::new();

        assert_eq!(runtime.run("2+2").await.unwrap(), "");
    }
}
