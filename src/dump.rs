//! Human-readable problem dumps.
//!
//! A dump is the problem's flat conic form plus variable metadata, written as
//! pretty-printed JSON.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constraints::Domain;
use crate::error::Result;
use crate::problem::Problem;
use crate::solver::ConicProblem;

/// Metadata of one declared variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDump {
    /// Declaration index.
    pub index: usize,
    /// Name, if any.
    pub name: Option<String>,
    /// Declared domain.
    pub domain: Domain,
    /// First column in the flat variable space.
    pub offset: usize,
}

/// Serializable snapshot of a problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDump {
    /// Problem name.
    pub name: Option<String>,
    /// Declared variables.
    pub variables: Vec<VariableDump>,
    /// Flat conic form.
    pub conic: ConicProblem,
}

impl ProblemDump {
    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a dump from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Problem {
    /// Snapshot of the problem's contents.
    pub fn dump(&self) -> ProblemDump {
        ProblemDump {
            name: self.name().map(String::from),
            variables: self
                .variables()
                .iter()
                .map(|v| VariableDump {
                    index: v.index(),
                    name: v.name().map(String::from),
                    domain: v.domain(),
                    offset: v.offset(),
                })
                .collect(),
            conic: self.conic_form(),
        }
    }

    /// Write the dump as pretty JSON to `path`.
    pub fn write_dump(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, &self.dump())?;
        writer.flush()?;
        info!(path = %path.display(), "wrote problem dump");
        Ok(())
    }
}
