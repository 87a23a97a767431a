use std::collections::HashMap;
use std::path::Path;
use std::process::Output;

use tokio::process::Command;

use crate::errors::NixpinError;

/// Builder for constructing and executing external processes asynchronously.
///
/// Provides a fluent API for setting program, arguments, environment variables,
/// and working directory. Execution awaits process completion; these awaits are
/// the resolver's suspension points.
pub struct CommandBuilder {
    program: String,
    args: Vec<String>,
    env: HashMap<String, String>,
    cwd: Option<String>,
}

impl CommandBuilder {
    /// Create a new builder for the given program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: HashMap::new(),
            cwd: None,
        }
    }

    /// Append a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child process.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the working directory for the child process.
    pub fn cwd(mut self, dir: impl Into<String>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Execute the command and return its raw output.
    pub async fn output(&self) -> Result<Output, NixpinError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (k, v) in &self.env {
            cmd.env(k, v);
        }
        if let Some(ref dir) = self.cwd {
            cmd.current_dir(Path::new(dir));
        }
        cmd.kill_on_drop(true);
        cmd.output().await.map_err(NixpinError::from)
    }

    /// Execute the command, requiring a zero exit status.
    ///
    /// Returns captured stdout on success; on non-zero exit the child's
    /// stderr is folded into the error message.
    pub async fn check_output(&self) -> Result<Vec<u8>, NixpinError> {
        let output = self.output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NixpinError::Generic {
                message: format!(
                    "`{}` exited with {}: {}",
                    self.program,
                    output.status,
                    stderr.trim()
                ),
            });
        }
        Ok(output.stdout)
    }
}
