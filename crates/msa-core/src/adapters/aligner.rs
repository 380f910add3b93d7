use std::path::Path;

use crate::adapters::muscle::MuscleSyntax;
use crate::execution::{CommandSpec, StdoutTarget};
use crate::models::ToolId;

/// One concrete aligner invocation shape.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AlignerCommand {
    /// `mafft --quiet <input>`, alignment on stdout.
    Mafft,
    /// MUSCLE writes the output path itself; flags depend on the dialect.
    Muscle(MuscleSyntax),
}

impl AlignerCommand {
    pub fn tool(self) -> ToolId {
        match self {
            Self::Mafft => ToolId::Mafft,
            Self::Muscle(_) => ToolId::Muscle,
        }
    }

    pub fn command(self, program: &Path, input: &Path, output: &Path) -> CommandSpec {
        let command = CommandSpec::new(program);
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();

        match self {
            Self::Mafft => command.args(["--quiet", &*input]),
            Self::Muscle(MuscleSyntax::V5) => {
                command.args(["-align", &*input, "-output", &*output])
            }
            Self::Muscle(MuscleSyntax::V3 | MuscleSyntax::Auto) => {
                command.args(["-in", &*input, "-out", &*output])
            }
        }
    }

    pub fn stdout_target(self, output: &Path) -> StdoutTarget {
        match self {
            Self::Mafft => StdoutTarget::File(output.to_path_buf()),
            Self::Muscle(_) => StdoutTarget::Capture,
        }
    }
}
