//! Batch run over an input directory.

use crate::cleaning::CleaningController;
use crate::config::{AppConfig, PathsConfig};
use crate::detect::{ColumnDetector, ColumnMap};
use crate::error::{Result, ResultExt as _, ScrubError};
use crate::io::{InputFormat, load_df, save_csv};
use crate::mailer::Deliver;
use crate::summary::{SummaryRecord, append_summary};
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};

/// What happened to one input file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub log: Option<PathBuf>,
    pub summary: SummaryRecord,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub files: Vec<FileOutcome>,
    pub attachments: Vec<PathBuf>,
    pub sent: usize,
}

/// Lists supported files directly inside `dir`, sorted by path.
///
/// # Errors
///
/// Returns [`ScrubError::NoInputFiles`] if `dir` is missing or holds no
/// supported file.
pub fn discover_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ScrubError::NoInputFiles(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && InputFormat::from_path(&path).is_some() {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(ScrubError::NoInputFiles(dir.to_path_buf()));
    }
    files.sort();
    Ok(files)
}

pub fn output_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("cleaned_{stem}.csv"))
}

pub fn log_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("log_{stem}.txt"))
}

#[derive(Debug)]
pub struct Driver {
    paths: PathsConfig,
    include_logs: bool,
    detector: ColumnDetector,
    controller: CleaningController,
}

impl Driver {
    pub fn new(
        paths: PathsConfig,
        include_logs: bool,
        detector: ColumnDetector,
        controller: CleaningController,
    ) -> Self {
        Self {
            paths,
            include_logs,
            detector,
            controller,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.paths.clone(),
            config.include_logs,
            ColumnDetector::new(config.keywords.clone()),
            CleaningController::default(),
        )
    }

    /// Cleans every input file, then hands all outputs to `deliverer` in a
    /// single call. Any failure aborts the run before delivery.
    ///
    /// # Errors
    ///
    /// Returns the first discovery, processing or delivery error.
    pub fn run(&self, deliverer: &dyn Deliver) -> Result<RunReport> {
        let inputs = discover_inputs(&self.paths.input)?;
        tracing::info!(
            "Found {} file(s) in {}",
            inputs.len(),
            self.paths.input.display()
        );

        std::fs::create_dir_all(&self.paths.output).with_context(|| {
            format!("Failed to create {}", self.paths.output.display())
        })?;
        if self.include_logs {
            std::fs::create_dir_all(&self.paths.summary).with_context(|| {
                format!("Failed to create {}", self.paths.summary.display())
            })?;
        }

        let mut files = Vec::with_capacity(inputs.len());
        for input in &inputs {
            if let Some(outcome) = self.process_file(input)? {
                files.push(outcome);
            }
        }

        let mut attachments: Vec<PathBuf> = files.iter().map(|f| f.output.clone()).collect();
        attachments.extend(files.iter().filter_map(|f| f.log.clone()));

        let sent = deliverer.deliver(&attachments)?;
        Ok(RunReport {
            files,
            attachments,
            sent,
        })
    }

    /// Loads, cleans and writes one file. Unsupported extensions are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, cleaned or written.
    pub fn process_file(&self, input: &Path) -> Result<Option<FileOutcome>> {
        if InputFormat::from_path(input).is_none() {
            tracing::warn!("Skipping unsupported file {}", input.display());
            return Ok(None);
        }

        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ScrubError::InvalidPath(format!("{} has no file stem", input.display()))
            })?;
        let df = load_df(input)?;
        let columns = self.detect(&df);
        tracing::info!("Processing {}: detected {columns}", input.display());

        let mut cleaned = self.controller.clean(&df, &columns)?;
        let output = output_path(&self.paths.output, &stem);
        save_csv(&mut cleaned, &output)?;
        tracing::info!(
            "Wrote {} ({} -> {} rows)",
            output.display(),
            df.height(),
            cleaned.height()
        );

        let summary = SummaryRecord {
            file_name: stem.clone(),
            columns,
            rows_before: df.height(),
            rows_after: cleaned.height(),
        };

        let log = if self.include_logs {
            let path = log_path(&self.paths.summary, &stem);
            append_summary(&path, &summary)?;
            Some(path)
        } else {
            None
        };

        Ok(Some(FileOutcome {
            input: input.to_path_buf(),
            output,
            log,
            summary,
        }))
    }

    fn detect(&self, df: &DataFrame) -> ColumnMap {
        let headers: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        self.detector.detect(&headers)
    }
}
