//! Parallel parsing of captured outputs.
//!
//! Each capture file is read, parsed and rendered independently on a
//! `rayon` pool; one rendered file per successful capture is written to the
//! output directory and every capture gets a [`BatchEntry`] in the returned
//! [`BatchReport`].

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use auth_session_core::RequiredFields;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::output::{OutputFormat, format_sessions};
use crate::report::{BatchEntry, BatchReport};
use crate::source::{CommandSource, FileSource, SourceRequest};

/// Failures that abort a whole batch run.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Settings shared by every capture in a batch.
#[derive(Debug, Clone)]
pub struct BatchJob {
    /// Layout and interface each capture is parsed with.
    pub request: SourceRequest,
    pub required: RequiredFields,
    pub format: OutputFormat,
    pub output_dir: PathBuf,
    /// Worker threads; `None` uses one per CPU.
    pub jobs: Option<usize>,
}

/// Expands `paths` into capture files. Directories contribute their regular
/// files, sorted by name; files are taken as given.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>, BatchError> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            let entries = fs::read_dir(path).map_err(|source| BatchError::Io {
                path: path.clone(),
                source,
            })?;
            let mut files: Vec<PathBuf> = entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|p| p.is_file())
                .collect();
            files.sort();
            inputs.extend(files);
        } else {
            inputs.push(path.clone());
        }
    }
    Ok(inputs)
}

/// Output file names, one per input, unique within the batch.
fn output_names(inputs: &[PathBuf], extension: &str) -> Vec<String> {
    let mut used = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "capture".to_string());
            let mut name = format!("{stem}.{extension}");
            let mut n = 2;
            while !used.insert(name.clone()) {
                name = format!("{stem}-{n}.{extension}");
                n += 1;
            }
            name
        })
        .collect()
}

/// Parses every capture in `inputs` and writes rendered outputs.
pub fn run_batch(inputs: &[PathBuf], job: &BatchJob) -> Result<BatchReport, BatchError> {
    fs::create_dir_all(&job.output_dir).map_err(|source| BatchError::Io {
        path: job.output_dir.clone(),
        source,
    })?;

    let names = output_names(inputs, job.format.extension());
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = job.jobs.filter(|jobs| *jobs > 0) {
        builder = builder.num_threads(jobs);
    }
    let pool = builder.build()?;

    info!(
        captures = inputs.len(),
        form = %job.request.form(),
        "Starting batch parse"
    );

    let entries: Vec<BatchEntry> = pool.install(|| {
        inputs
            .par_iter()
            .zip(names.par_iter())
            .map(|(input, name)| parse_one(input, name, job))
            .collect()
    });

    let report = BatchReport::new(job.request.form(), entries);
    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        "Finished batch parse"
    );
    Ok(report)
}

fn parse_one(input: &Path, name: &str, job: &BatchJob) -> BatchEntry {
    let mut entry = BatchEntry {
        input: input.display().to_string(),
        output: None,
        error: None,
        report: None,
    };

    let text = match FileSource::new(input).fetch(&job.request) {
        Ok(text) => text,
        Err(e) => {
            debug!(input = %input.display(), error = %e, "Failed to read capture");
            entry.error = Some(e.to_string());
            return entry;
        }
    };

    let run = crate::parse_request(&job.request, &text, &job.required);
    if let Ok(sessions) = &run.result {
        let path = job.output_dir.join(name);
        let written = format_sessions(sessions, job.format)
            .and_then(|rendered| fs::write(&path, rendered).map_err(|e| e.to_string()));
        match written {
            Ok(()) => entry.output = Some(name.to_string()),
            Err(e) => entry.error = Some(format!("failed to write {}: {e}", path.display())),
        }
    }
    entry.report = Some(run.report);
    entry
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY: &str = "Gi1/0/5  000f.23c4.a401  mab  DATA  Authz Success  0A3462B10000000D24F80B58\n";

    #[test]
    fn test_output_names_are_unique() {
        let inputs = vec![
            PathBuf::from("a/sw1.txt"),
            PathBuf::from("b/sw1.txt"),
            PathBuf::from("sw2.log"),
        ];
        assert_eq!(
            output_names(&inputs, "json"),
            vec!["sw1.json", "sw1-2.json", "sw2.json"]
        );
    }

    #[test]
    fn test_run_batch_writes_outputs_and_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let captures = dir.path().join("captures");
        fs::create_dir(&captures).unwrap();
        fs::write(captures.join("sw1.txt"), SUMMARY).unwrap();
        fs::write(captures.join("sw2.txt"), "   \n").unwrap();

        let inputs = collect_inputs(&[captures, dir.path().join("missing.txt")]).unwrap();
        assert_eq!(inputs.len(), 3);

        let job = BatchJob {
            request: SourceRequest::summary(None),
            required: RequiredFields::default(),
            format: OutputFormat::Json,
            output_dir: dir.path().join("out"),
            jobs: Some(2),
        };
        let report = run_batch(&inputs, &job).unwrap();

        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 2);
        assert_eq!(report.failure_codes.get("empty_result"), Some(&1));
        assert!(dir.path().join("out/sw1.json").exists());
        assert!(!dir.path().join("out/sw2.json").exists());
        assert!(report.entries[2].error.is_some());
    }
}
