//! External search delegate
//!
//! Semantic search is not done in-process. A separate program (usually a
//! Python script holding the embedding model and vector index) is run once
//! per query and must print a JSON array of file names on stdout.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

use crate::core::process::{run_with_timeout, RunError};
use crate::core::utils::truncate_chars;

/// How much of the child's stderr is kept in an error
const STDERR_TAIL_CHARS: usize = 300;

/// Failure modes of a delegated search
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("failed to start search process: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("search timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("search process exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },

    #[error("search returned invalid output: {0}")]
    InvalidOutput(String),
}

/// Narrow request/response interface: query in, ranked file names out.
#[async_trait]
pub trait SearchDelegate: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError>;
}

/// Runs `<command> <script> <query>` and parses its stdout.
#[derive(Debug, Clone)]
pub struct ScriptSearch {
    command: String,
    script: String,
    upload_dir: PathBuf,
    api_key: Option<String>,
    timeout: Duration,
}

impl ScriptSearch {
    pub fn new(
        command: impl Into<String>,
        script: impl Into<String>,
        upload_dir: impl Into<PathBuf>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            script: script.into(),
            upload_dir: upload_dir.into(),
            api_key,
            timeout,
        }
    }

    fn build_command(&self, query: &str) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.arg(&self.script)
            .arg(query)
            .env("UPLOAD_FOLDER", &self.upload_dir)
            .stdin(std::process::Stdio::null());
        if let Some(ref key) = self.api_key {
            cmd.env("SEARCH_API_KEY", key);
        }
        cmd
    }
}

#[async_trait]
impl SearchDelegate for ScriptSearch {
    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError> {
        let mut cmd = self.build_command(query);
        log::info!("Running search delegate: {} {} {:?}", self.command, self.script, query);

        let output = run_with_timeout(&mut cmd, self.timeout).await.map_err(|e| match e {
            RunError::Io(err) => SearchError::Spawn(err),
            RunError::TimedOut(after) => SearchError::Timeout(after),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = {
                let trimmed = stderr.trim();
                let skip = trimmed.chars().count().saturating_sub(STDERR_TAIL_CHARS);
                trimmed.chars().skip(skip).collect()
            };
            return Err(SearchError::Exit {
                status: output.status.to_string(),
                stderr: tail,
            });
        }

        parse_search_output(&output.stdout)
    }
}

/// Parses delegate stdout: a JSON array of strings.
///
/// Non-string entries inside the array are rejected, not skipped.
pub fn parse_search_output(stdout: &[u8]) -> Result<Vec<String>, SearchError> {
    let text = String::from_utf8_lossy(stdout);
    let value: serde_json::Value = serde_json::from_str(text.trim())
        .map_err(|e| SearchError::InvalidOutput(format!("not JSON ({}): {}", e, truncate_chars(text.trim(), 80))))?;

    let serde_json::Value::Array(items) = value else {
        return Err(SearchError::InvalidOutput("expected a JSON array".to_string()));
    };

    items
        .into_iter()
        .map(|item| match item {
            serde_json::Value::String(name) => Ok(name),
            other => Err(SearchError::InvalidOutput(format!("expected file names, got {}", other))),
        })
        .collect()
}
