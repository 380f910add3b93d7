use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::adapters::aligner::AlignerCommand;
use crate::adapters::detect_utils::which_executable;
use crate::adapters::muscle::{MuscleSyntax, parse_muscle_version};
use crate::adapters::process_utils::{run_and_collect_version_output, run_to_completion};
use crate::adapters::{AdapterResult, ToolAdapter, ToolRequest};
use crate::artifacts::ArtifactRef;
use crate::execution::{CommandSpec, ProcessExecutor, ProcessSpawnRequest};
use crate::models::{CoreError, CoreErrorKind, ToolId};

const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ToolAdapterConfig {
    /// Explicit executable per tool; bare names are searched like `PATH` entries.
    pub executables: BTreeMap<ToolId, PathBuf>,
    /// Directories searched before `PATH`.
    pub search_paths: Vec<PathBuf>,
    pub muscle_syntax: MuscleSyntax,
    /// Wall-clock limit per invocation; `None` runs to completion.
    pub timeout: Option<Duration>,
}

impl ToolAdapterConfig {
    pub fn executable(mut self, tool: ToolId, path: impl Into<PathBuf>) -> Self {
        self.executables.insert(tool, path.into());
        self
    }

    pub fn search_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_paths.push(dir.into());
        self
    }

    pub fn muscle_syntax(mut self, syntax: MuscleSyntax) -> Self {
        self.muscle_syntax = syntax;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

pub struct ProcessToolAdapter {
    executor: Arc<dyn ProcessExecutor>,
    config: ToolAdapterConfig,
    detected_muscle_syntax: OnceLock<MuscleSyntax>,
}

impl ProcessToolAdapter {
    pub fn new(executor: Arc<dyn ProcessExecutor>, config: ToolAdapterConfig) -> Self {
        Self {
            executor,
            config,
            detected_muscle_syntax: OnceLock::new(),
        }
    }

    fn resolve_executable(&self, tool: ToolId) -> AdapterResult<PathBuf> {
        let wanted = self
            .config
            .executables
            .get(&tool)
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or_else(|| tool.executable_name().to_string());

        which_executable(&wanted, &self.config.search_paths).ok_or_else(|| {
            tracing::error!(tool = %tool, executable = %wanted, "tool executable not found");
            CoreError::new(
                CoreErrorKind::ToolNotFound,
                format!(
                    "command '{wanted}' not found; make sure {tool} is installed and on PATH"
                ),
            )
            .with_tool(tool)
        })
    }

    fn aligner_for(&self, tool: ToolId, program: &Path) -> AlignerCommand {
        match tool {
            ToolId::Mafft => AlignerCommand::Mafft,
            ToolId::Muscle => AlignerCommand::Muscle(self.muscle_syntax(program)),
        }
    }

    fn muscle_syntax(&self, program: &Path) -> MuscleSyntax {
        if self.config.muscle_syntax != MuscleSyntax::Auto {
            return self.config.muscle_syntax;
        }
        if let Some(syntax) = self.detected_muscle_syntax.get() {
            return *syntax;
        }

        // Only a parsed version is cached; a failed detection is retried next run.
        match self.detect_muscle_syntax(program) {
            Some(syntax) => *self.detected_muscle_syntax.get_or_init(|| syntax),
            None => {
                tracing::warn!(
                    program = %program.display(),
                    "could not detect MUSCLE version; assuming v3 syntax (-in/-out)"
                );
                MuscleSyntax::V3
            }
        }
    }

    fn detect_muscle_syntax(&self, program: &Path) -> Option<MuscleSyntax> {
        let request = ProcessSpawnRequest::new(
            ToolId::Muscle,
            CommandSpec::new(program).arg("-version"),
        )
        .timeout(VERSION_CHECK_TIMEOUT);
        let output = run_and_collect_version_output(self.executor.as_ref(), request);

        let version = parse_muscle_version(&output)?;
        let syntax = MuscleSyntax::for_version(&version);
        tracing::info!(
            version = %version,
            syntax = syntax.as_str(),
            "detected MUSCLE version"
        );
        Some(syntax)
    }
}

impl ToolAdapter for ProcessToolAdapter {
    fn invoke(&self, request: ToolRequest) -> AdapterResult<ArtifactRef> {
        let ToolRequest {
            tool,
            task_id,
            input,
            output,
        } = request;

        let program = self
            .resolve_executable(tool)
            .map_err(|error| error.attribute(Some(tool), Some(&task_id)))?;
        let aligner = self.aligner_for(tool, &program);

        let mut spawn = ProcessSpawnRequest::new(
            tool,
            aligner.command(&program, input.path(), output.path()),
        )
        .task_id(task_id.clone());
        spawn.stdout = aligner.stdout_target(output.path());
        if let Some(timeout) = self.config.timeout {
            spawn = spawn.timeout(timeout);
        }

        tracing::info!(
            tool = %tool,
            task_id = task_id.as_str(),
            program = %program.display(),
            args = ?spawn.command.args,
            "running alignment tool"
        );

        let result = run_to_completion(self.executor.as_ref(), spawn)?;
        tracing::info!(
            tool = %tool,
            task_id = task_id.as_str(),
            stderr_bytes = result.stderr.len(),
            "alignment tool completed"
        );

        Ok(output)
    }
}
