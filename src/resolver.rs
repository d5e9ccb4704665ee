use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::browser::{BrowseOutcome, Browser};
use crate::error::NavError;
use crate::exec::CommandExecutor;
use crate::k8s::ClusterApi;
use crate::lister::ResourceLister;
use crate::model::{ForwardSpec, NavigationState, RetrievalTarget};
use crate::path;
use crate::prompt::Prompter;

const CANCELLED: &str = "Operation cancelled.";

/// Turns operator picks into one complete [`RetrievalTarget`] or
/// [`ForwardSpec`]. Every abort returns `None` before anything is executed.
pub struct Resolver<'a, C, E, P> {
    lister: &'a ResourceLister<C>,
    executor: &'a E,
    prompter: &'a mut P,
    save_dir: &'a Path,
}

impl<'a, C, E, P> Resolver<'a, C, E, P>
where
    C: ClusterApi,
    E: CommandExecutor,
    P: Prompter,
{
    pub fn new(
        lister: &'a ResourceLister<C>,
        executor: &'a E,
        prompter: &'a mut P,
        save_dir: &'a Path,
    ) -> Self {
        Self {
            lister,
            executor,
            prompter,
            save_dir,
        }
    }

    pub async fn show_services(&mut self) {
        let listed = self.lister.list_services().await;
        let Some(services) = self.degrade(
            listed,
            "No services found or error occurred while listing services.",
        ) else {
            return;
        };

        self.prompter.notify("Available services:");
        for (index, service) in services.iter().enumerate() {
            self.prompter.notify(&format!("{}. {service}", index + 1));
        }
    }

    pub async fn retrieval_target(&mut self) -> Option<RetrievalTarget> {
        let listed = self.lister.list_pods().await;
        let pods = self.degrade(listed, "No pods found or error occurred while listing pods.")?;
        let labels = pods.iter().map(ToString::to_string).collect::<Vec<_>>();
        let pod = self
            .pick("Available Pods:", &labels)
            .await
            .and_then(|index| pods.get(index).cloned())?;

        let listed = self.lister.list_containers(&pod).await;
        let containers = self.degrade(
            listed,
            &format!("No containers found in pod {pod} or error occurred."),
        )?;
        let container = if let [only] = containers.as_slice() {
            self.prompter
                .notify(&format!("Using the only container: {only}"));
            only.clone()
        } else {
            let labels = containers.iter().map(ToString::to_string).collect::<Vec<_>>();
            let title = format!("Containers in {pod}:");
            self.pick(&title, &labels)
                .await
                .and_then(|index| containers.get(index).cloned())?
        };

        let start = NavigationState::at_root(pod.clone(), container.clone());
        let remote_path = match Browser::new(self.executor, &mut *self.prompter)
            .browse(start)
            .await
        {
            BrowseOutcome::Selected(remote_path) => remote_path,
            BrowseOutcome::Cancelled => {
                self.prompter.notify(CANCELLED);
                return None;
            }
        };
        debug!("selected {remote_path} in {pod} [{container}]");

        let suggested = default_save_path(self.save_dir, &remote_path, &pod.name);
        let prompt = format!(
            "Enter local save path [default: {}]: ",
            suggested.display()
        );
        let Some(raw) = self.prompter.input(&prompt).await else {
            self.prompter.notify(CANCELLED);
            return None;
        };
        let local_path = match raw.trim() {
            "" => suggested,
            custom => PathBuf::from(custom),
        };

        Some(RetrievalTarget {
            pod,
            container,
            remote_path,
            local_path,
        })
    }

    pub async fn forward_spec(&mut self) -> Option<ForwardSpec> {
        let listed = self.lister.list_services().await;
        let services = self.degrade(
            listed,
            "No services found or error occurred while listing services.",
        )?;
        let labels = services.iter().map(ToString::to_string).collect::<Vec<_>>();
        let service = self
            .pick("Available Services:", &labels)
            .await
            .and_then(|index| services.get(index).cloned())?;

        let listed = self.lister.list_ports(&service).await;
        let ports = self.degrade(
            listed,
            &format!("No ports found for service {service} or error occurred."),
        )?;
        let labels = ports.iter().map(|port| port.label()).collect::<Vec<_>>();
        let title = format!("Ports on {service}:");
        let remote_port = self
            .pick(&title, &labels)
            .await
            .and_then(|index| ports.get(index).map(|binding| binding.port))?;

        let prompt = format!("Enter local port [default: {remote_port}]: ");
        let Some(raw) = self.prompter.input(&prompt).await else {
            self.prompter.notify(CANCELLED);
            return None;
        };
        let local_port = match parse_local_port(&raw) {
            Ok(Some(port)) => port,
            Ok(None) => remote_port,
            Err(error) => {
                warn!("{error}");
                self.prompter
                    .notify(&format!("{error}. Using default port {remote_port}."));
                remote_port
            }
        };

        Some(ForwardSpec {
            service,
            remote_port,
            local_port,
        })
    }

    async fn pick(&mut self, title: &str, labels: &[String]) -> Option<usize> {
        let picked = self
            .prompter
            .choose(title, labels)
            .await
            .filter(|index| *index < labels.len());
        if picked.is_none() {
            self.prompter.notify(CANCELLED);
        }
        picked
    }

    /// Reports a failed or empty listing and yields `None` so the flow stops.
    fn degrade<T>(&mut self, listed: Result<Vec<T>, NavError>, empty: &str) -> Option<Vec<T>> {
        let items = match listed {
            Ok(items) => items,
            Err(error) => {
                self.prompter.notify(&error.to_string());
                Vec::new()
            }
        };
        if items.is_empty() {
            self.prompter.notify(empty);
            return None;
        }
        Some(items)
    }
}

/// Empty input means "use the default"; anything else must be a port number.
pub fn parse_local_port(raw: &str) -> Result<Option<u16>, NavError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let value = raw.parse::<u64>().map_err(|_| NavError::InvalidInput {
        input: raw.to_string(),
        reason: "not a valid port number",
    })?;
    match u16::try_from(value) {
        Ok(port) if port >= 1 => Ok(Some(port)),
        _ => Err(NavError::InvalidInput {
            input: raw.to_string(),
            reason: "port must be between 1 and 65535",
        }),
    }
}

/// `<save_dir>/<basename(remote_path)>`, falling back to the pod name when the
/// selection is the container root.
pub fn default_save_path(save_dir: &Path, remote_path: &str, pod_name: &str) -> PathBuf {
    match path::basename(remote_path) {
        "" => save_dir.join(pod_name),
        name => save_dir.join(name),
    }
}
