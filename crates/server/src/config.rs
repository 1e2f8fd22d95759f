use anyhow::{Context, Result};
use clap::Args;
use kube_mcp::DEFAULT_TOOLSETS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Options shared by every subcommand. Each can also come from a `K8S_*`
/// environment variable.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Comma-separated list of toolsets to enable
    #[arg(long, global = true, env = "K8S_TOOLSETS", value_delimiter = ',')]
    pub toolsets: Option<Vec<String>>,

    /// Restrict the server to read-only operations
    #[arg(long, global = true, env = "K8S_READ_ONLY")]
    pub read_only: bool,

    /// Path to the log file
    #[arg(long, global = true, env = "K8S_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Path to the kubeconfig file (default: $HOME/.kube/config)
    #[arg(long, global = true, env = "K8S_KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true, env = "K8S_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Contents of the optional configuration file. Every key may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileConfig {
    #[serde(default)]
    pub toolsets: Option<Vec<String>>,
    #[serde(default)]
    pub read_only: Option<bool>,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        toml::from_str(&content).context("Failed to parse configuration file")
    }
}

/// Settings for one server run
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub toolsets: Vec<String>,
    pub read_only: bool,
    pub log_file: Option<PathBuf>,
    pub kubeconfig: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            toolsets: DEFAULT_TOOLSETS.iter().map(|s| s.to_string()).collect(),
            read_only: false,
            log_file: None,
            kubeconfig: None,
        }
    }
}

impl RunConfig {
    /// Defaults, overlaid by the config file (if any), overlaid by flags and env.
    pub fn load(args: &GlobalArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Ok(Self::resolve(file, args))
    }

    pub fn resolve(file: FileConfig, args: &GlobalArgs) -> Self {
        let defaults = Self::default();

        Self {
            toolsets: args
                .toolsets
                .clone()
                .or(file.toolsets)
                .unwrap_or(defaults.toolsets),
            read_only: args.read_only || file.read_only.unwrap_or(defaults.read_only),
            log_file: args.log_file.clone().or(file.log_file),
            kubeconfig: args.kubeconfig.clone().or(file.kubeconfig),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = RunConfig::resolve(FileConfig::default(), &GlobalArgs::default());
        assert_eq!(config.toolsets, vec!["all".to_string()]);
        assert!(!config.read_only);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_file_values_apply_when_flags_absent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("kube-mcp.toml");
        std::fs::write(
            &path,
            "toolsets = [\"pods\"]\nread-only = true\nlog-file = \"/tmp/kube-mcp.log\"\n",
        )
        .unwrap();

        let args = GlobalArgs {
            config: Some(path),
            ..Default::default()
        };
        let config = RunConfig::load(&args).unwrap();

        assert_eq!(config.toolsets, vec!["pods".to_string()]);
        assert!(config.read_only);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/kube-mcp.log")));
    }

    #[test]
    fn test_flags_win_over_file() {
        let file = FileConfig {
            toolsets: Some(vec!["pods".to_string()]),
            kubeconfig: Some(PathBuf::from("/etc/kube/config")),
            ..Default::default()
        };
        let args = GlobalArgs {
            toolsets: Some(vec!["services".to_string()]),
            kubeconfig: Some(PathBuf::from("/home/me/.kube/dev")),
            ..Default::default()
        };

        let config = RunConfig::resolve(file, &args);
        assert_eq!(config.toolsets, vec!["services".to_string()]);
        assert_eq!(config.kubeconfig, Some(PathBuf::from("/home/me/.kube/dev")));
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let args = GlobalArgs {
            config: Some(PathBuf::from("/nonexistent/kube-mcp.toml")),
            ..Default::default()
        };
        assert!(RunConfig::load(&args).is_err());
    }
}
