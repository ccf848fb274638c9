//! Raw-text sources.
//!
//! Parsing itself never performs I/O. A [`CommandSource`] supplies the text
//! of one `show authentication sessions` invocation; the collect helpers
//! fetch and parse in a single call.
//!
//! # Example
//!
//! ```
//! use auth_session_parser::source::{SourceRequest, StaticSource, collect_summary};
//!
//! let source = StaticSource::new(
//!     "Gi1/0/5  000f.23c4.a401  mab  DATA  Authz Success  0A3462B10000000D24F80B58",
//! );
//! let sessions = collect_summary(&source, None).unwrap();
//! assert!(sessions.interface("GigabitEthernet1/0/5").is_some());
//! assert_eq!(
//!     SourceRequest::details("Gi1/0/5").command_line(),
//!     "show authentication sessions interface Gi1/0/5 details"
//! );
//! ```

use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use auth_session_core::{DetailSessions, RequiredFields, SessionForm, SummarySessions};
use thiserror::Error;
use tracing::debug;
use wait_timeout::ChildExt;

use crate::error::CollectError;

/// Default limit for one [`ProcessSource`] invocation.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Failures while obtaining raw command text.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("program not found: {0}")]
    NotFound(String),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {seconds}s")]
    Timeout { program: String, seconds: u64 },

    #[error("{program} exited with status {code:?}: {stderr}")]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Which command a source is asked to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRequest {
    /// `show authentication sessions [interface X]`
    Summary { interface: Option<String> },
    /// `show authentication sessions interface X details`
    Details { interface: String },
}

impl SourceRequest {
    pub fn summary(interface: Option<&str>) -> Self {
        Self::Summary {
            interface: interface.map(str::to_string),
        }
    }

    pub fn details(interface: &str) -> Self {
        Self::Details {
            interface: interface.to_string(),
        }
    }

    pub fn form(&self) -> SessionForm {
        match self {
            Self::Summary { .. } => SessionForm::Summary,
            Self::Details { .. } => SessionForm::Details,
        }
    }

    pub fn interface(&self) -> Option<&str> {
        match self {
            Self::Summary { interface } => interface.as_deref(),
            Self::Details { interface } => Some(interface),
        }
    }

    /// Renders the device command line.
    pub fn command_line(&self) -> String {
        match self {
            Self::Summary { interface: None } => "show authentication sessions".to_string(),
            Self::Summary {
                interface: Some(name),
            } => format!("show authentication sessions interface {name}"),
            Self::Details { interface } => {
                format!("show authentication sessions interface {interface} details")
            }
        }
    }
}

/// Supplies raw command text.
pub trait CommandSource {
    fn fetch(&self, request: &SourceRequest) -> Result<String, SourceError>;
}

/// Returns the same text for every request.
#[derive(Debug, Clone)]
pub struct StaticSource {
    text: String,
}

impl StaticSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl CommandSource for StaticSource {
    fn fetch(&self, _request: &SourceRequest) -> Result<String, SourceError> {
        Ok(self.text.clone())
    }
}

/// Reads a previously captured output file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CommandSource for FileSource {
    fn fetch(&self, _request: &SourceRequest) -> Result<String, SourceError> {
        let bytes = std::fs::read(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Runs a local program (typically an SSH or console wrapper) with the
/// device command line as its final argument and returns its stdout.
#[derive(Debug, Clone)]
pub struct ProcessSource {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ProcessSource {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Arguments placed before the command line.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl CommandSource for ProcessSource {
    fn fetch(&self, request: &SourceRequest) -> Result<String, SourceError> {
        let command_line = request.command_line();
        debug!(program = %self.program, command = %command_line, "Running session source");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(&command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| {
                if source.kind() == ErrorKind::NotFound {
                    SourceError::NotFound(self.program.clone())
                } else {
                    SourceError::Spawn {
                        program: self.program.clone(),
                        source,
                    }
                }
            })?;

        // Drain both pipes in the background so a chatty child cannot block
        // on a full pipe buffer before it exits.
        let stdout_thread = child.stdout.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                let result = pipe.read_to_end(&mut buf);
                (buf, result)
            })
        });
        let stderr_thread = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                let result = pipe.read_to_end(&mut buf);
                (buf, result)
            })
        });

        let status = match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                debug!(program = %self.program, timeout_secs = self.timeout.as_secs(), "Session source timed out, killing process");
                let _ = child.kill();
                let _ = child.wait();
                return Err(SourceError::Timeout {
                    program: self.program.clone(),
                    seconds: self.timeout.as_secs(),
                });
            }
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SourceError::Spawn {
                    program: self.program.clone(),
                    source,
                });
            }
        };

        let stdout = join_pipe(stdout_thread, &self.program, "stdout");
        let stderr = join_pipe(stderr_thread, &self.program, "stderr");

        if !status.success() {
            return Err(SourceError::Failed {
                program: self.program.clone(),
                code: status.code(),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

type PipeThread = std::thread::JoinHandle<(Vec<u8>, std::io::Result<usize>)>;

fn join_pipe(thread: Option<PipeThread>, program: &str, name: &str) -> Vec<u8> {
    thread
        .and_then(|t| t.join().ok())
        .map(|(buf, res)| {
            if let Err(e) = res {
                debug!(program = %program, pipe = name, error = %e, "Failed to read pipe");
            }
            buf
        })
        .unwrap_or_default()
}

/// Fetches summary output from `source` and parses it.
pub fn collect_summary(
    source: &dyn CommandSource,
    interface: Option<&str>,
) -> Result<SummarySessions, CollectError> {
    let text = source.fetch(&SourceRequest::summary(interface))?;
    Ok(crate::parse_summary(&text, interface)?)
}

/// Fetches detail output for `interface` from `source` and parses it.
pub fn collect_details(
    source: &dyn CommandSource,
    interface: &str,
    required: &RequiredFields,
) -> Result<DetailSessions, CollectError> {
    let text = source.fetch(&SourceRequest::details(interface))?;
    Ok(crate::parse_details_with_fields(&text, interface, required)?)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_command_lines() {
        assert_eq!(
            SourceRequest::summary(None).command_line(),
            "show authentication sessions"
        );
        assert_eq!(
            SourceRequest::summary(Some("GigabitEthernet1/7/35")).command_line(),
            "show authentication sessions interface GigabitEthernet1/7/35"
        );
        assert_eq!(SourceRequest::details("Gi1/0/1").form(), SessionForm::Details);
    }

    #[test]
    fn test_file_source_reads_capture() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Gi1/0/5  000f.23c4.a401  mab  DATA  Authz Success  0A3462B10000000D24F80B58").unwrap();

        let source = FileSource::new(file.path());
        let sessions = collect_summary(&source, Some("Gi1/0/5")).unwrap();
        assert_eq!(sessions.client_count(), 1);
    }

    #[test]
    fn test_missing_file_is_source_error() {
        let source = FileSource::new("/nonexistent/capture.txt");
        assert!(matches!(
            collect_summary(&source, None),
            Err(CollectError::Source(SourceError::Io { .. }))
        ));
    }

    #[test]
    fn test_empty_capture_is_parse_error() {
        let source = StaticSource::new("   \n");
        assert!(matches!(
            collect_details(&source, "Gi1/0/1", &RequiredFields::default()),
            Err(CollectError::Parse(ref e)) if e.is_empty_result()
        ));
    }

    #[test]
    fn test_missing_program_is_not_found() {
        let source = ProcessSource::new("definitely-not-a-real-program-authsess");
        assert!(matches!(
            source.fetch(&SourceRequest::summary(None)),
            Err(SourceError::NotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_process_source_passes_command_line_last() {
        let source = ProcessSource::new("echo").with_args(["prefix"]);
        let text = source.fetch(&SourceRequest::details("Gi1/0/1")).unwrap();
        assert_eq!(
            text.trim(),
            "prefix show authentication sessions interface Gi1/0/1 details"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_process_source_timeout() {
        // The command line lands in $0 and is ignored.
        let source = ProcessSource::new("sh")
            .with_args(["-c", "sleep 5"])
            .with_timeout(Duration::from_millis(100));
        assert!(matches!(
            source.fetch(&SourceRequest::summary(None)),
            Err(SourceError::Timeout { .. })
        ));
    }
}
