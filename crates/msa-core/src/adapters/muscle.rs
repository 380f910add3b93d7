use semver::Version;
use serde::{Deserialize, Serialize};

/// Command-line dialect spoken by the installed MUSCLE.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuscleSyntax {
    /// Ask `muscle -version` and pick the matching dialect.
    #[default]
    Auto,
    /// `-in <input> -out <output>`
    V3,
    /// `-align <input> -output <output>`
    V5,
}

impl MuscleSyntax {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::V3 => "v3",
            Self::V5 => "v5",
        }
    }

    pub fn for_version(version: &Version) -> Self {
        if version.major >= 5 { Self::V5 } else { Self::V3 }
    }
}

impl std::str::FromStr for MuscleSyntax {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "v3" | "3" => Ok(Self::V3),
            "v5" | "5" => Ok(Self::V5),
            other => Err(format!(
                "unknown MUSCLE syntax '{other}' (expected auto, v3 or v5)"
            )),
        }
    }
}

/// Extracts the version from `muscle -version` output.
///
/// Handles both `MUSCLE v3.8.31 by Robert C. Edgar` and `muscle 5.1.linux64 [12f0e2]`.
pub fn parse_muscle_version(output: &str) -> Option<Version> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| line.to_ascii_lowercase().contains("muscle"))
        .flat_map(str::split_whitespace)
        .find_map(parse_version_token)
}

fn parse_version_token(token: &str) -> Option<Version> {
    let token = token.strip_prefix(['v', 'V']).unwrap_or(token);
    if !token.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let numeric: Vec<u64> = token
        .split('.')
        .map_while(|part| {
            if !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()) {
                part.parse().ok()
            } else {
                None
            }
        })
        .take(3)
        .collect();

    match numeric.as_slice() {
        [major] => Some(Version::new(*major, 0, 0)),
        [major, minor] => Some(Version::new(*major, *minor, 0)),
        [major, minor, patch] => Some(Version::new(*major, *minor, *patch)),
        _ => None,
    }
}
