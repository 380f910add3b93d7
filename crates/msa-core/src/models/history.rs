use serde::{Deserialize, Serialize};

use crate::models::{SessionId, TaskId, ToolId};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct NewHistoryRecord {
    pub session_id: SessionId,
    pub task_id: TaskId,
    pub tool: ToolId,
    pub input_file: String,
    pub output_file: String,
    pub timestamp: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: u64,
    pub session_id: SessionId,
    pub task_id: TaskId,
    pub tool: ToolId,
    pub input_file: String,
    pub output_file: String,
    pub timestamp: String,
}

impl HistoryRecord {
    pub fn input_name(&self) -> &str {
        base_name(&self.input_file)
    }

    pub fn output_name(&self) -> &str {
        base_name(&self.output_file)
    }
}

fn base_name(path: &str) -> &str {
    std::path::Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::HistoryRecord;
    use crate::models::{SessionId, TaskId, ToolId};

    #[test]
    fn names_strip_directory_prefixes() {
        let record = HistoryRecord {
            id: 1,
            session_id: SessionId::from_raw("s"),
            task_id: TaskId::from_raw("t"),
            tool: ToolId::Mafft,
            input_file: "/srv/msa/uploads/input_t_20240101_000000.fasta".to_string(),
            output_file: "results/result_t_20240101_000000.aln".to_string(),
            timestamp: "2024-01-01T00:00:00.000000Z".to_string(),
        };

        assert_eq!(record.input_name(), "input_t_20240101_000000.fasta");
        assert_eq!(record.output_name(), "result_t_20240101_000000.aln");
    }
}
