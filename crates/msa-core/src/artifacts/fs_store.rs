use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use crate::artifacts::{
    ArtifactLayout, ArtifactPaths, ArtifactRef, ArtifactResult, ArtifactRole, ArtifactStore,
};
use crate::models::{CoreError, CoreErrorKind, TaskId, TaskStamp};

pub struct FsArtifactStore {
    layout: ArtifactLayout,
}

impl FsArtifactStore {
    pub fn new(layout: ArtifactLayout) -> Self {
        Self { layout }
    }

    /// Creates both staging directories if they are missing.
    pub fn ensure_layout(&self) -> ArtifactResult<()> {
        for dir in [&self.layout.inputs_dir, &self.layout.outputs_dir] {
            fs::create_dir_all(dir).map_err(|error| {
                storage_error(format!(
                    "failed to create artifact directory '{}': {error}",
                    dir.display()
                ))
            })?;
        }
        Ok(())
    }
}

impl ArtifactStore for FsArtifactStore {
    fn allocate(&self, task_id: &TaskId, stamp: &TaskStamp) -> ArtifactPaths {
        ArtifactPaths {
            input: ArtifactRef::new(
                self.layout
                    .inputs_dir
                    .join(ArtifactRole::Input.file_name(task_id, stamp)),
            ),
            output: ArtifactRef::new(
                self.layout
                    .outputs_dir
                    .join(ArtifactRole::Output.file_name(task_id, stamp)),
            ),
        }
    }

    fn stage_input(&self, paths: &ArtifactPaths, bytes: &[u8]) -> ArtifactResult<ArtifactRef> {
        let path = paths.input.path();
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|error| write_error(path, error))?;
        file.write_all(bytes)
            .and_then(|()| file.sync_all())
            .map_err(|error| write_error(path, error))?;

        tracing::info!(path = %path.display(), bytes = bytes.len(), "staged input artifact");
        Ok(paths.input.clone())
    }

    fn read_output(&self, output: &ArtifactRef) -> ArtifactResult<Vec<u8>> {
        fs::read(output.path()).map_err(|error| {
            if error.kind() == ErrorKind::NotFound {
                CoreError::new(
                    CoreErrorKind::NotFound,
                    format!("output artifact '{}' does not exist", output.display()),
                )
            } else {
                storage_error(format!(
                    "failed to read output artifact '{}': {error}",
                    output.display()
                ))
            }
        })
    }

    fn resolve_output(&self, file_name: &str) -> Option<ArtifactRef> {
        let candidate = Path::new(file_name);
        let is_plain_name = candidate.file_name().and_then(|name| name.to_str()) == Some(file_name);
        if file_name.is_empty() || !is_plain_name || file_name.starts_with('.') {
            return None;
        }

        let path = self.layout.outputs_dir.join(file_name);
        path.is_file().then(|| ArtifactRef::new(path))
    }
}

fn write_error(path: &Path, error: std::io::Error) -> CoreError {
    storage_error(format!(
        "failed to write artifact '{}': {error}",
        path.display()
    ))
}

fn storage_error(message: String) -> CoreError {
    CoreError::new(CoreErrorKind::StorageFailure, message)
}
