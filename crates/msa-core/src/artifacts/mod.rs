pub mod fs_store;

pub use fs_store::FsArtifactStore;

use std::path::{Path, PathBuf};

use crate::models::{CoreError, TaskId, TaskStamp};

pub type ArtifactResult<T> = Result<T, CoreError>;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArtifactLayout {
    pub inputs_dir: PathBuf,
    pub outputs_dir: PathBuf,
}

impl ArtifactLayout {
    pub fn new(inputs_dir: impl Into<PathBuf>, outputs_dir: impl Into<PathBuf>) -> Self {
        Self {
            inputs_dir: inputs_dir.into(),
            outputs_dir: outputs_dir.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ArtifactRole {
    Input,
    Output,
}

impl ArtifactRole {
    fn prefix(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "result",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Self::Input => "fasta",
            Self::Output => "aln",
        }
    }

    pub fn file_name(self, task_id: &TaskId, stamp: &TaskStamp) -> String {
        format!(
            "{}_{}_{}.{}",
            self.prefix(),
            task_id,
            stamp.file_component,
            self.extension()
        )
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ArtifactRef(PathBuf);

impl ArtifactRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn file_name(&self) -> String {
        self.0
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn display(&self) -> String {
        self.0.to_string_lossy().into_owned()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArtifactPaths {
    pub input: ArtifactRef,
    pub output: ArtifactRef,
}

pub trait ArtifactStore: Send + Sync {
    fn allocate(&self, task_id: &TaskId, stamp: &TaskStamp) -> ArtifactPaths;

    fn stage_input(&self, paths: &ArtifactPaths, bytes: &[u8]) -> ArtifactResult<ArtifactRef>;

    fn read_output(&self, output: &ArtifactRef) -> ArtifactResult<Vec<u8>>;

    /// Resolves a produced output by base name for download.
    fn resolve_output(&self, file_name: &str) -> Option<ArtifactRef>;
}

#[cfg(test)]
mod tests {
    use super::{ArtifactRef, ArtifactRole};
    use crate::models::{TaskId, TaskStamp};

    fn stamp() -> TaskStamp {
        TaskStamp {
            file_component: "20240102_030405".to_string(),
            iso8601: "2024-01-02T03:04:05.000000Z".to_string(),
        }
    }

    #[test]
    fn file_names_embed_task_and_stamp() {
        let task = TaskId::from_raw("0123abcd");
        assert_eq!(
            ArtifactRole::Input.file_name(&task, &stamp()),
            "input_0123abcd_20240102_030405.fasta"
        );
        assert_eq!(
            ArtifactRole::Output.file_name(&task, &stamp()),
            "result_0123abcd_20240102_030405.aln"
        );
    }

    #[test]
    fn artifact_ref_exposes_base_name() {
        let artifact = ArtifactRef::new("results/result_x_20240102_030405.aln");
        assert_eq!(artifact.file_name(), "result_x_20240102_030405.aln");
    }
}
