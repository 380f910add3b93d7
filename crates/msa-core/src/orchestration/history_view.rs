use std::fmt::{Display, Formatter};

use crate::models::{HistoryRecord, SessionId};

const HEADER: &str = "time\ttool\tinput file\toutput file";
const RULE_WIDTH: usize = 50;

/// Result of a history lookup, rendered as a tab-separated table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HistoryView {
    NoSession,
    Empty { session_id: SessionId },
    Rows {
        session_id: SessionId,
        records: Vec<HistoryRecord>,
    },
    Unavailable { message: String },
}

impl HistoryView {
    pub fn records(&self) -> &[HistoryRecord] {
        match self {
            Self::Rows { records, .. } => records,
            _ => &[],
        }
    }
}

impl Display for HistoryView {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSession => f.write_str("No history for this session."),
            Self::Empty { session_id } => write!(
                f,
                "No history for this session (ID: ...{}).",
                session_id.short_suffix()
            ),
            Self::Unavailable { message } => write!(f, "Could not load history: {message}"),
            Self::Rows { records, .. } => {
                writeln!(f, "{HEADER}")?;
                write!(f, "{}", "-".repeat(RULE_WIDTH))?;
                for record in records {
                    write!(
                        f,
                        "\n{}\t{}\t{}\t{}",
                        record.timestamp,
                        record.tool,
                        record.input_name(),
                        record.output_name()
                    )?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::HistoryView;
    use crate::models::{HistoryRecord, SessionId, TaskId, ToolId};

    fn record(id: u64, tool: ToolId) -> HistoryRecord {
        HistoryRecord {
            id,
            session_id: SessionId::from_raw("session"),
            task_id: TaskId::from_raw(format!("task{id}")),
            tool,
            input_file: format!("uploads/input_task{id}_20240101_00000{id}.fasta"),
            output_file: format!("results/result_task{id}_20240101_00000{id}.aln"),
            timestamp: format!("2024-01-01T00:00:0{id}.000000Z"),
        }
    }

    #[test]
    fn rows_render_as_tab_separated_table() {
        let view = HistoryView::Rows {
            session_id: SessionId::from_raw("session"),
            records: vec![record(2, ToolId::Muscle), record(1, ToolId::Mafft)],
        };

        let rendered = view.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "time\ttool\tinput file\toutput file");
        assert_eq!(lines[1], "-".repeat(50));
        assert_eq!(
            lines[2],
            "2024-01-01T00:00:02.000000Z\tMUSCLE\tinput_task2_20240101_000002.fasta\tresult_task2_20240101_000002.aln"
        );
        assert!(lines[3].starts_with("2024-01-01T00:00:01.000000Z\tMAFFT\t"));
    }

    #[test]
    fn empty_session_names_session_suffix() {
        let view = HistoryView::Empty {
            session_id: SessionId::from_raw("11111111-2222-3333-4444-555555abcdef"),
        };
        assert_eq!(view.to_string(), "No history for this session (ID: ...abcdef).");
        assert!(view.records().is_empty());
    }

    #[test]
    fn missing_session_has_explicit_message() {
        assert_eq!(
            HistoryView::NoSession.to_string(),
            "No history for this session."
        );
    }
}
