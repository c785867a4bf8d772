//! Per-input job status as shown by the command-line shell.
//!
//! A job moves `Pending -> Processing -> Success | Failed`. A successful job
//! whose output already exists ends as `Skipped` instead. Each transition
//! consumes the job and returns the next snapshot.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::epub::Conversion;

/// Suffix appended to the input's file name to name the output archive.
pub const OUTPUT_SUFFIX: &str = "_images.zip";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pending,
    Processing,
    Success,
    Failed,
    /// Converted, but nothing was written: the output already existed.
    Skipped,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Status::Pending => "",
            Status::Processing => "Processing...",
            Status::Success => "Success",
            Status::Failed => "Failed",
            Status::Skipped => "Skipped",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Input as given on the command line: a path or an HTTP(S) URL.
    pub input: String,
    pub status: Status,
}

impl Job {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            status: Status::Pending,
        }
    }

    pub fn start(self) -> Self {
        Self {
            status: Status::Processing,
            ..self
        }
    }

    pub fn finish(self, conversion: &Conversion) -> Self {
        let status = if conversion.is_success() {
            Status::Success
        } else {
            Status::Failed
        };
        Self { status, ..self }
    }

    pub fn fail(self) -> Self {
        Self {
            status: Status::Failed,
            ..self
        }
    }

    pub fn skip(self) -> Self {
        Self {
            status: Status::Skipped,
            ..self
        }
    }

    pub fn is_remote(&self) -> bool {
        is_http_url(&self.input)
    }

    /// Display name: the file name of a path, or the last URL path segment.
    pub fn file_name(&self) -> String {
        let name = if self.is_remote() {
            let without_query = self.input.split(['?', '#']).next().unwrap_or_default();
            let after_scheme = without_query
                .split_once("://")
                .map(|(_, rest)| rest)
                .unwrap_or(without_query);
            // The authority alone is not a file name
            let decoded = after_scheme
                .split_once('/')
                .and_then(|(_, path)| path.rsplit('/').next())
                .and_then(|s| urlencoding::decode(s).ok())
                .unwrap_or_default();
            // Encoded separators must not reach the output path
            match decoded.rsplit(['/', '\\']).next().unwrap_or_default() {
                "." | ".." => String::new(),
                name => name.to_string(),
            }
        } else {
            Path::new(&self.input)
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default()
        };

        if name.is_empty() {
            "book".to_string()
        } else {
            name
        }
    }

    /// Output archive name, e.g. `novel.epub_images.zip`.
    pub fn output_file_name(&self) -> String {
        format!("{}{}", self.file_name(), OUTPUT_SUFFIX)
    }

    /// Where the output archive is written: `dir` joined with the output name.
    pub fn output_path(&self, dir: Option<&Path>) -> PathBuf {
        match dir {
            Some(dir) => dir.join(self.output_file_name()),
            None => PathBuf::from(self.output_file_name()),
        }
    }
}

pub fn is_http_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}
