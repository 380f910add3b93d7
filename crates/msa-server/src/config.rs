//! Service configuration loaded from `MSA_*` environment variables.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use msa_core::adapters::{MuscleSyntax, ToolAdapterConfig};
use msa_core::artifacts::ArtifactLayout;
use msa_core::logging::LogFormat;
use msa_core::models::ToolId;

const DEFAULT_PORT: u16 = 7860;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
#[error("invalid configuration: {0}")]
pub struct ConfigError(String);

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Clone, Debug, PartialEq)]
pub struct ServiceConfig {
    pub host: IpAddr,
    pub port: u16,
    pub database_path: PathBuf,
    pub uploads_dir: PathBuf,
    pub results_dir: PathBuf,
    pub mafft_path: Option<PathBuf>,
    pub muscle_path: Option<PathBuf>,
    pub muscle_syntax: MuscleSyntax,
    pub tool_timeout: Option<Duration>,
    pub log_format: LogFormat,
    pub max_upload_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            database_path: PathBuf::from("msa_history.db"),
            uploads_dir: PathBuf::from("uploads"),
            results_dir: PathBuf::from("results"),
            mafft_path: None,
            muscle_path: None,
            muscle_syntax: MuscleSyntax::Auto,
            tool_timeout: None,
            log_format: LogFormat::Pretty,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env = Env(&lookup);
        let mut config = Self::default();

        if let Some(host) = env.string("MSA_HOST") {
            config.host = host
                .parse()
                .map_err(|e| ConfigError(format!("MSA_HOST must be an IP address: {e}")))?;
        }
        if let Some(port) = env.u16("MSA_PORT")? {
            config.port = port;
        }
        if let Some(path) = env.string("MSA_DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }
        if let Some(dir) = env.string("MSA_UPLOADS_DIR") {
            config.uploads_dir = PathBuf::from(dir);
        }
        if let Some(dir) = env.string("MSA_RESULTS_DIR") {
            config.results_dir = PathBuf::from(dir);
        }
        config.mafft_path = env.string("MSA_MAFFT_PATH").map(PathBuf::from);
        config.muscle_path = env.string("MSA_MUSCLE_PATH").map(PathBuf::from);
        if let Some(syntax) = env.string("MSA_MUSCLE_SYNTAX") {
            config.muscle_syntax = syntax
                .parse()
                .map_err(|e| ConfigError(format!("MSA_MUSCLE_SYNTAX: {e}")))?;
        }
        if let Some(secs) = env.u64("MSA_TOOL_TIMEOUT_SECS")? {
            if secs == 0 {
                return Err(ConfigError(
                    "MSA_TOOL_TIMEOUT_SECS must be greater than 0".to_string(),
                ));
            }
            config.tool_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(format) = env.string("MSA_LOG_FORMAT") {
            config.log_format = format
                .parse()
                .map_err(|e| ConfigError(format!("MSA_LOG_FORMAT: {e}")))?;
        }
        if let Some(bytes) = env.u64("MSA_MAX_UPLOAD_BYTES")? {
            config.max_upload_bytes = usize::try_from(bytes)
                .ok()
                .filter(|bytes| *bytes > 0)
                .ok_or_else(|| {
                    ConfigError("MSA_MAX_UPLOAD_BYTES must be a positive size".to_string())
                })?;
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn artifact_layout(&self) -> ArtifactLayout {
        ArtifactLayout::new(&self.uploads_dir, &self.results_dir)
    }

    pub fn adapter_config(&self) -> ToolAdapterConfig {
        let mut adapter = ToolAdapterConfig::default().muscle_syntax(self.muscle_syntax);
        if let Some(path) = &self.mafft_path {
            adapter = adapter.executable(ToolId::Mafft, path);
        }
        if let Some(path) = &self.muscle_path {
            adapter = adapter.executable(ToolId::Muscle, path);
        }
        if let Some(timeout) = self.tool_timeout {
            adapter = adapter.timeout(timeout);
        }
        adapter
    }
}

struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    fn string(&self, name: &str) -> Option<String> {
        (self.0)(name).and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    fn u16(&self, name: &str) -> Result<Option<u16>> {
        let Some(v) = self.string(name) else {
            return Ok(None);
        };
        v.parse::<u16>()
            .map(Some)
            .map_err(|e| ConfigError(format!("{name} must be a u16: {e}")))
    }

    fn u64(&self, name: &str) -> Result<Option<u64>> {
        let Some(v) = self.string(name) else {
            return Ok(None);
        };
        v.parse::<u64>()
            .map(Some)
            .map_err(|e| ConfigError(format!("{name} must be a u64: {e}")))
    }
}
