use std::process::Stdio;

use async_trait::async_trait;
use tokio::{io::AsyncWriteExt, process::Command};
use tracing::instrument;

use crate::{Generator, LlmError};

/// Runs the model as a subprocess per prompt: `ollama run <model>`, prompt on stdin, answer on
/// stdout.
///
/// The child is killed if the returned future is dropped, so a timeout around
/// [`Generator::generate`] does not leave stray processes behind.
#[derive(Debug, Clone)]
pub struct OllamaCli {
    program: String,
    args: Vec<String>,
}

impl OllamaCli {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            program: "ollama".to_string(),
            args: vec!["run".to_string(), model.into()],
        }
    }

    /// Use an arbitrary program and argument list instead of `ollama run`.
    pub fn with_command(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl Generator for OllamaCli {
    #[instrument(skip_all, fields(command = %self.command_line(), prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| LlmError::Spawn {
                command: self.command_line(),
                message: e.to_string(),
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| LlmError::Io("child stdin was not captured".to_string()))?;
        let prompt = prompt.to_owned();
        let write = async move {
            stdin.write_all(prompt.as_bytes()).await?;
            stdin.shutdown().await
        };

        let (written, output) = tokio::join!(write, child.wait_with_output());
        let output = output.map_err(|e| LlmError::Io(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(status = ?output.status.code(), %stderr, "model process failed");
            return Err(LlmError::Invocation {
                status: output.status.code(),
                stderr,
            });
        }
        written.map_err(|e| LlmError::Io(e.to_string()))?;

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        tracing::debug!(response_len = text.len(), "model process finished");
        Ok(text)
    }
}
