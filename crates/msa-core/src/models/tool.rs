use serde::{Deserialize, Serialize};

use crate::models::{CoreError, CoreErrorKind};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ToolId {
    Mafft,
    Muscle,
}

impl ToolId {
    pub const ALL: [ToolId; 2] = [ToolId::Mafft, ToolId::Muscle];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mafft => "MAFFT",
            Self::Muscle => "MUSCLE",
        }
    }

    pub fn executable_name(self) -> &'static str {
        match self {
            Self::Mafft => "mafft",
            Self::Muscle => "muscle",
        }
    }
}

impl std::fmt::Display for ToolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ToolId {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "MAFFT" => Ok(Self::Mafft),
            "MUSCLE" => Ok(Self::Muscle),
            _ => Err(CoreError::new(
                CoreErrorKind::InvalidTool,
                format!("unsupported alignment tool '{value}'"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ToolId;
    use crate::models::CoreErrorKind;

    #[test]
    fn parses_known_tools_case_insensitively() {
        assert_eq!("MAFFT".parse::<ToolId>().unwrap(), ToolId::Mafft);
        assert_eq!("muscle".parse::<ToolId>().unwrap(), ToolId::Muscle);
        assert_eq!(" Muscle ".parse::<ToolId>().unwrap(), ToolId::Muscle);
    }

    #[test]
    fn unknown_tool_is_invalid_tool_error() {
        let error = "clustalw".parse::<ToolId>().unwrap_err();
        assert_eq!(error.kind, CoreErrorKind::InvalidTool);
        assert!(error.message.contains("clustalw"));
    }

    #[test]
    fn as_str_round_trips_through_parse() {
        for tool in ToolId::ALL {
            assert_eq!(tool.as_str().parse::<ToolId>().unwrap(), tool);
        }
    }
}
