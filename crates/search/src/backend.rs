//! External search tools run as subprocesses.
//!
//! Windows uses `findstr`, everything else `grep`. The search text is always
//! passed as its own argv element; no shell is involved.

use crate::error::SearchError;
use crate::types::Invocation;
use async_trait::async_trait;
use std::ffi::OsString;
use std::process::Stdio;
use std::str::FromStr;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTool {
    Grep,
    Findstr,
}

impl SearchTool {
    pub fn platform_default() -> Self {
        if cfg!(windows) { SearchTool::Findstr } else { SearchTool::Grep }
    }

    pub fn program(&self) -> &'static str {
        match self {
            SearchTool::Grep => "grep",
            SearchTool::Findstr => "findstr",
        }
    }

    /// Recursive, line-numbered, literal match of the invocation's text.
    pub fn args(&self, invocation: &Invocation) -> Vec<OsString> {
        match self {
            SearchTool::Grep => vec![
                "-r".into(),
                "-n".into(),
                "-F".into(),
                "-I".into(),
                "--color=never".into(),
                format!("--include=*.{}", invocation.extension).into(),
                "--".into(),
                invocation.search_text.clone().into(),
                invocation.root.clone().into_os_string(),
            ],
            SearchTool::Findstr => {
                let mut pattern = invocation.root.clone().into_os_string();
                pattern.push(format!("\\*.{}", invocation.extension));
                vec![
                    "/s".into(),
                    "/n".into(),
                    "/l".into(),
                    format!("/c:{}", invocation.search_text).into(),
                    pattern,
                ]
            }
        }
    }

    pub fn is_available(&self) -> bool {
        which::which(self.program()).is_ok()
    }
}

impl FromStr for SearchTool {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "grep" => Ok(SearchTool::Grep),
            "findstr" => Ok(SearchTool::Findstr),
            other => Err(SearchError::InvalidArgument(format!("Unknown search tool: {}", other))),
        }
    }
}

/// Source of raw `path:line:content` output for one invocation.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Name used in logs and warnings.
    fn tool_name(&self) -> &str;

    fn is_available(&self) -> bool {
        true
    }

    /// Runs one invocation. `Err(Cancelled)` once `cancel` fires.
    async fn run(&self, invocation: &Invocation, cancel: &CancellationToken) -> Result<String, SearchError>;
}

pub struct ProcessBackend {
    tool: SearchTool,
}

impl ProcessBackend {
    pub fn new(tool: SearchTool) -> Self {
        Self { tool }
    }
}

impl Default for ProcessBackend {
    fn default() -> Self {
        Self::new(SearchTool::platform_default())
    }
}

#[async_trait]
impl SearchBackend for ProcessBackend {
    fn tool_name(&self) -> &str {
        self.tool.program()
    }

    fn is_available(&self) -> bool {
        self.tool.is_available()
    }

    async fn run(&self, invocation: &Invocation, cancel: &CancellationToken) -> Result<String, SearchError> {
        let mut cmd = Command::new(self.tool.program());
        cmd.args(self.tool.args(invocation))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SearchError::ToolMissing(self.tool.program().to_string())
            } else {
                failure(invocation, format!("Failed to start {}: {}", self.tool.program(), e))
            }
        })?;

        // Dropping the wait future drops the child, and kill_on_drop reaps it.
        let output = tokio::select! {
            res = child.wait_with_output() => res.map_err(|e| failure(invocation, e.to_string()))?,
            _ = cancel.cancelled() => {
                debug!("Invocation #{} cancelled", invocation.index);
                return Err(SearchError::Cancelled);
            }
        };

        interpret_output(invocation, output.status.code(), &output.stdout, &output.stderr)
    }
}

/// Maps a finished process to its output text.
///
/// Exit code 1 is "no matches" for both grep and findstr. Any other non-zero
/// code, a signal, or stderr output is a failure.
pub fn interpret_output(
    invocation: &Invocation,
    code: Option<i32>,
    stdout: &[u8],
    stderr: &[u8],
) -> Result<String, SearchError> {
    let stderr = String::from_utf8_lossy(stderr);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return Err(failure(invocation, stderr.to_string()));
    }

    match code {
        Some(0) => Ok(String::from_utf8_lossy(stdout).replace("\r\n", "\n")),
        Some(1) => Ok(String::new()),
        Some(c) => Err(failure(invocation, format!("exit code {}", c))),
        None => Err(failure(invocation, "terminated by signal".to_string())),
    }
}

fn failure(invocation: &Invocation, reason: String) -> SearchError {
    SearchError::InvocationFailure {
        root: invocation.root.display().to_string(),
        extension: invocation.extension.clone(),
        reason,
    }
}
