use crate::error::SubmitError;
use chrono::{DateTime, Utc};
use reflex_core::TestResults;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;

/// Receives the accumulated results once the session is over
pub trait ResultsSink {
    fn submit(&mut self, results: &TestResults) -> Result<(), SubmitError>;
}

#[derive(Serialize)]
struct Submission<'a> {
    submitted_at: DateTime<Utc>,
    #[serde(flatten)]
    results: &'a TestResults,
}

/// Writes results as pretty JSON to a file
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultsSink for JsonFileSink {
    fn submit(&mut self, results: &TestResults) -> Result<(), SubmitError> {
        let submission = Submission {
            submitted_at: Utc::now(),
            results,
        };
        let mut file = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut file, &submission)?;
        file.flush()?;
        info!("Results saved to {}", self.path.display());
        Ok(())
    }
}

/// Keeps submissions in memory; clones share the same store
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    submissions: Arc<Mutex<Vec<TestResults>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submissions(&self) -> Vec<TestResults> {
        match self.submissions.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ResultsSink for MemorySink {
    fn submit(&mut self, results: &TestResults) -> Result<(), SubmitError> {
        let mut guard = match self.submissions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(results.clone());
        Ok(())
    }
}
