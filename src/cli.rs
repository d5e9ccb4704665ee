use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "ksak",
    version,
    about = "Kubernetes Swiss Army Knife: browse pod filesystems, fetch files and port-forward services."
)]
pub struct CliArgs {
    /// Path to a kubeconfig file
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long)]
    pub context: Option<String>,

    /// Only list pods and services in this namespace
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// kubectl binary used for exec, cp and port-forward
    #[arg(long)]
    pub kubectl: Option<String>,

    /// Directory used for the default local save path
    #[arg(long)]
    pub save_dir: Option<PathBuf>,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long, default_value = "info")]
    pub log_filter: String,

    /// Write logs to this file instead of discarding them
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
