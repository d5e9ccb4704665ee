use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command as TokioCommand;
use tracing::{info, warn};

use crate::interrupt::Interrupts;
use crate::model::{ContainerRef, ForwardSpec, ResourceRef, RetrievalTarget};

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ForegroundExit {
    /// `None` when the child was terminated by a signal.
    Exited(Option<i32>),
    Interrupted,
}

/// Runs kubectl-style argument vectors. `run` captures output, `run_foreground`
/// hands the terminal to the child until it exits or the user interrupts.
pub trait CommandExecutor {
    async fn run(&self, args: &[String]) -> Result<CommandOutput>;
    async fn run_foreground(&self, args: &[String]) -> Result<ForegroundExit>;
}

#[derive(Debug, Clone)]
pub struct KubectlExecutor {
    binary: String,
    kubeconfig: Option<PathBuf>,
    context: Option<String>,
    interrupts: Interrupts,
}

impl KubectlExecutor {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            kubeconfig: None,
            context: None,
            interrupts: Interrupts::default(),
        }
    }

    pub fn with_interrupts(mut self, interrupts: Interrupts) -> Self {
        self.interrupts = interrupts;
        self
    }

    pub fn with_kubeconfig(mut self, kubeconfig: Option<PathBuf>) -> Self {
        self.kubeconfig = kubeconfig;
        self
    }

    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    fn command(&self, args: &[String]) -> TokioCommand {
        let mut cmd = TokioCommand::new(&self.binary);
        if let Some(kubeconfig) = &self.kubeconfig {
            cmd.arg("--kubeconfig").arg(kubeconfig);
        }
        if let Some(context) = &self.context {
            cmd.arg("--context").arg(context);
        }
        cmd.args(args);
        cmd
    }

    fn render(&self, args: &[String]) -> String {
        std::iter::once(self.binary.as_str())
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl CommandExecutor for KubectlExecutor {
    async fn run(&self, args: &[String]) -> Result<CommandOutput> {
        let rendered = self.render(args);
        info!("running {rendered}");

        let output = self
            .command(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("failed to execute {rendered}"))?;

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    async fn run_foreground(&self, args: &[String]) -> Result<ForegroundExit> {
        let rendered = self.render(args);
        info!("running {rendered} in foreground");

        let mut claim = self.interrupts.claim_foreground();
        let mut child = self
            .command(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {rendered}"))?;

        tokio::select! {
            status = child.wait() => {
                let status = status.with_context(|| format!("failed waiting for {rendered}"))?;
                // The child shares the terminal and may die of the same SIGINT first.
                if claim.was_interrupted() {
                    return Ok(ForegroundExit::Interrupted);
                }
                Ok(ForegroundExit::Exited(status.code()))
            }
            () = claim.interrupted() => {
                if let Err(error) = child.kill().await {
                    warn!("failed to stop {rendered}: {error}");
                }
                Ok(ForegroundExit::Interrupted)
            }
        }
    }
}

pub fn list_dir_args(pod: &ResourceRef, container: &ContainerRef, path: &str) -> Vec<String> {
    vec![
        "exec".to_string(),
        "-n".to_string(),
        pod.namespace.clone(),
        pod.name.clone(),
        "-c".to_string(),
        container.name.clone(),
        "--".to_string(),
        "ls".to_string(),
        "-la".to_string(),
        path.to_string(),
    ]
}

pub fn copy_args(target: &RetrievalTarget) -> Vec<String> {
    vec![
        "cp".to_string(),
        format!(
            "{}/{}:{}",
            target.pod.namespace, target.pod.name, target.remote_path
        ),
        target.local_path.display().to_string(),
        "-c".to_string(),
        target.container.name.clone(),
    ]
}

pub fn port_forward_args(spec: &ForwardSpec) -> Vec<String> {
    vec![
        "port-forward".to_string(),
        format!("svc/{}", spec.service.name),
        format!("{}:{}", spec.local_port, spec.remote_port),
        "-n".to_string(),
        spec.service.namespace.clone(),
    ]
}
