use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;

use crate::error::ToolError;

/// One external command: program, arguments, working directory, extra env.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new(program: &str, args: Vec<String>) -> Self {
        Self {
            program: program.to_owned(),
            args,
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_owned(), value.to_owned()));
        self
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    fn command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd.envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        cmd
    }

    fn spawn_error(&self, source: std::io::Error) -> ToolError {
        ToolError::Spawn {
            program: self.program.clone(),
            source,
        }
    }

    fn failed(&self, stderr: String) -> ToolError {
        ToolError::CommandFailed {
            command: self.to_string(),
            stderr,
        }
    }
}

/// `program arg1 arg2 ...`; env values are left out.
impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Abstraction over external command execution for testability.
///
/// Production code uses [`RealExecutor`], tests use mockall-generated mocks.
#[allow(async_fn_in_trait)]
pub trait CommandExecutor: Send + Sync {
    /// Run a command and capture stdout.
    async fn exec(&self, invocation: &Invocation) -> Result<String, ToolError>;

    /// Run a command, streaming output to the terminal.
    async fn exec_streaming(&self, invocation: &Invocation) -> Result<(), ToolError>;

    /// Run a command with data piped to stdin.
    async fn exec_with_stdin(
        &self,
        invocation: &Invocation,
        stdin_data: &[u8],
    ) -> Result<String, ToolError>;
}

/// Executor that spawns real processes.
pub struct RealExecutor;

impl CommandExecutor for RealExecutor {
    async fn exec(&self, invocation: &Invocation) -> Result<String, ToolError> {
        tracing::debug!(command = %invocation, "exec");
        let output = invocation
            .command()
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| invocation.spawn_error(e))?;

        if output.status.success() {
            String::from_utf8(output.stdout).map_err(|e| ToolError::InvalidUtf8 { source: e })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            Err(invocation.failed(stderr))
        }
    }

    async fn exec_streaming(&self, invocation: &Invocation) -> Result<(), ToolError> {
        tracing::debug!(command = %invocation, "exec (streaming)");
        let status = invocation
            .command()
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| invocation.spawn_error(e))?;

        if status.success() {
            Ok(())
        } else {
            Err(invocation.failed(format!("exit code: {status}")))
        }
    }

    async fn exec_with_stdin(
        &self,
        invocation: &Invocation,
        stdin_data: &[u8],
    ) -> Result<String, ToolError> {
        use tokio::io::AsyncWriteExt;

        tracing::debug!(command = %invocation, "exec (stdin)");
        let mut child = invocation
            .command()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| invocation.spawn_error(e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(stdin_data)
                .await
                .map_err(|e| ToolError::StdinWrite { source: e })?;
            stdin
                .shutdown()
                .await
                .map_err(|e| ToolError::StdinWrite { source: e })?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| invocation.spawn_error(e))?;

        if output.status.success() {
            String::from_utf8(output.stdout).map_err(|e| ToolError::InvalidUtf8 { source: e })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            Err(invocation.failed(stderr))
        }
    }
}
