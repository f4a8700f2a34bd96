//! Vectorizer backed by the external `primitive` command-line tool.
//!
//! Invoked once per image as
//! `primitive -i SRC -o DST.svg -n SHAPES -m 3 -r WORK_SIZE`
//! (mode 3 = ellipses only). The tool must be on `PATH` or configured via
//! `vector.primitive_bin`.

use super::backend::{BackendError, Vectorizer};
use super::params::VectorizeParams;
use std::path::PathBuf;
use std::process::Command;

/// Mode flag selecting ellipses.
const ELLIPSE_MODE: &str = "3";

pub struct PrimitiveVectorizer {
    program: PathBuf,
}

impl PrimitiveVectorizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, params: &VectorizeParams) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-i")
            .arg(&params.source)
            .arg("-o")
            .arg(&params.output)
            .arg("-n")
            .arg(params.shapes.to_string())
            .arg("-m")
            .arg(ELLIPSE_MODE)
            .arg("-r")
            .arg(params.work_size.to_string());
        cmd
    }
}

impl Vectorizer for PrimitiveVectorizer {
    fn vectorize(&self, params: &VectorizeParams) -> Result<(), BackendError> {
        let output = self.command(params).output().map_err(|e| {
            BackendError::ProcessingFailed(format!(
                "Failed to run {}: {}",
                self.program.display(),
                e
            ))
        })?;

        if !output.status.success() {
            return Err(BackendError::ProcessingFailed(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        if !params.output.is_file() {
            return Err(BackendError::ProcessingFailed(format!(
                "{} produced no output at {}",
                self.program.display(),
                params.output.display()
            )));
        }
        Ok(())
    }
}
