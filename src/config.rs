use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::CliArgs;

const DEFAULT_KUBECTL: &str = "kubectl";
const BUNDLED_KUBECONFIG: &str = "k3s.kubeconfig";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub source: Option<String>,
    pub kubectl: String,
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
    pub namespace: Option<String>,
    pub save_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct KsakConfigFile {
    #[serde(default, alias = "kubectl_path")]
    kubectl: Option<String>,
    #[serde(default)]
    kubeconfig: Option<PathBuf>,
    #[serde(default)]
    context: Option<String>,
    #[serde(default, alias = "ns")]
    namespace: Option<String>,
    #[serde(default, alias = "download_dir")]
    save_dir: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            source: None,
            kubectl: DEFAULT_KUBECTL.to_string(),
            kubeconfig: None,
            context: None,
            namespace: None,
            save_dir: None,
        }
    }
}

impl RuntimeConfig {
    pub fn discover() -> Result<Self> {
        let env_path = std::env::var("KSAK_CONFIG").ok();
        let cwd = std::env::current_dir().unwrap_or_default();
        let home = std::env::var("HOME").ok().map(PathBuf::from);
        match discover_config_path(env_path.as_deref(), &cwd, home.as_deref()) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config {}", path.display()))?;
        Self::from_yaml(&raw, Some(path.display().to_string()))
            .with_context(|| format!("failed to parse runtime config {}", path.display()))
    }

    pub fn from_yaml(raw: &str, source: Option<String>) -> Result<Self> {
        let parsed: KsakConfigFile = if raw.trim().is_empty() {
            KsakConfigFile::default()
        } else {
            serde_yaml::from_str(raw)?
        };

        Ok(Self {
            source,
            kubectl: parsed
                .kubectl
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_KUBECTL.to_string()),
            kubeconfig: parsed.kubeconfig.map(expand_home),
            context: parsed.context.filter(|value| !value.trim().is_empty()),
            namespace: parsed.namespace.filter(|value| !value.trim().is_empty()),
            save_dir: parsed.save_dir.map(expand_home),
        })
    }

    /// Command-line flags win over file values.
    pub fn with_cli_overrides(mut self, args: &CliArgs) -> Self {
        if let Some(kubectl) = &args.kubectl {
            self.kubectl = kubectl.clone();
        }
        if let Some(kubeconfig) = &args.kubeconfig {
            self.kubeconfig = Some(kubeconfig.clone());
        }
        if let Some(context) = &args.context {
            self.context = Some(context.clone());
        }
        if let Some(namespace) = &args.namespace {
            self.namespace = Some(namespace.clone());
        }
        if let Some(save_dir) = &args.save_dir {
            self.save_dir = Some(save_dir.clone());
        }
        self
    }

    /// Explicit kubeconfig, else a `k3s.kubeconfig` shipped next to the binary.
    pub fn resolved_kubeconfig(&self) -> Option<PathBuf> {
        self.kubeconfig.clone().or_else(bundled_kubeconfig)
    }

    pub fn resolved_save_dir(&self) -> PathBuf {
        self.save_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn bundled_kubeconfig() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let candidate = exe.parent()?.join(BUNDLED_KUBECONFIG);
    candidate.is_file().then_some(candidate)
}

fn expand_home(path: PathBuf) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path;
    };
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(rest),
        Err(_) => path,
    }
}

fn discover_config_path(
    env_path: Option<&str>,
    cwd: &Path,
    home: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(path) = env_path
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [
        cwd.join("ksak.yaml"),
        cwd.join("ksak.yml"),
        cwd.join(".ksak.yaml"),
    ];
    for candidate in cwd_candidates {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if let Some(home) = home {
        let user_candidates = [
            home.join(".config/ksak/config.yaml"),
            home.join(".config/ksak/config.yml"),
            home.join(".ksak.yaml"),
        ];
        for candidate in user_candidates {
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    None
}
