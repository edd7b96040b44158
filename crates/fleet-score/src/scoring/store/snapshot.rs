use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

use super::csv_import::ImportError;
use crate::scoring::domain::{
    AssignmentRecord, ChecklistRecord, DocumentRecord, ExecutionRecord, Operative,
    RejectionRecord,
};

/// Point-in-time export of every collection the engine reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordSnapshot {
    pub operatives: Vec<Operative>,
    pub assignments: Vec<AssignmentRecord>,
    pub executions: Vec<ExecutionRecord>,
    pub rejections: Vec<RejectionRecord>,
    pub checklists: Vec<ChecklistRecord>,
    pub documents: Vec<DocumentRecord>,
}

impl RecordSnapshot {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ImportError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Append executions from a separate export, such as a CSV dump.
    pub fn with_executions(mut self, executions: Vec<ExecutionRecord>) -> Self {
        self.executions.extend(executions);
        self
    }
}
