use tracing::{info, warn};

use crate::error::{NavError, compact_error};
use crate::exec::{CommandExecutor, ForegroundExit, copy_args, port_forward_args};
use crate::model::{ForwardSpec, RetrievalTarget};

/// Executes resolved actions. Success of a copy is judged by exit status only;
/// a truncated copy that still exits 0 is reported as success.
pub struct Dispatcher<'a, E> {
    executor: &'a E,
}

impl<'a, E: CommandExecutor> Dispatcher<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    pub async fn retrieve(&self, target: &RetrievalTarget) -> Result<(), NavError> {
        let retrieval_error = |stderr: String| NavError::Retrieval {
            remote: format!(
                "{}/{}:{}",
                target.pod.namespace, target.pod.name, target.remote_path
            ),
            local: target.local_path.display().to_string(),
            stderr,
        };

        let output = self
            .executor
            .run(&copy_args(target))
            .await
            .map_err(|error| retrieval_error(compact_error(&error)))?;

        if output.success() {
            info!(
                "copied {} from {} into {}",
                target.remote_path,
                target.pod,
                target.local_path.display()
            );
            return Ok(());
        }

        let stderr = match output.stderr.trim() {
            "" => format!("kubectl cp exited with {:?}", output.exit_code),
            stderr => stderr.to_string(),
        };
        warn!("copy of {} failed: {stderr}", target.remote_path);
        Err(retrieval_error(stderr))
    }

    /// Blocks until the session ends. An operator interrupt is a normal stop.
    pub async fn forward(&self, spec: &ForwardSpec) -> Result<ForegroundExit, NavError> {
        let exit = self
            .executor
            .run_foreground(&port_forward_args(spec))
            .await
            .map_err(|error| NavError::Forward {
                service: spec.service.to_string(),
                detail: compact_error(&error),
            })?;

        match exit {
            ForegroundExit::Interrupted => {
                info!("port-forward to {} stopped by operator", spec.service)
            }
            ForegroundExit::Exited(code) => {
                info!("port-forward to {} exited with {code:?}", spec.service)
            }
        }
        Ok(exit)
    }
}
