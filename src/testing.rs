//! In-memory stand-ins for the cluster, kubectl and the operator.

use anyhow::{Result, bail};
use std::cell::RefCell;
use std::collections::VecDeque;

use crate::exec::{CommandExecutor, CommandOutput, ForegroundExit};
use crate::k8s::ClusterApi;
use crate::model::{ContainerRef, PortBinding, ResourceRef};
use crate::prompt::Prompter;

#[derive(Debug, Clone, Default)]
pub struct FakeCluster {
    pods: Vec<(ResourceRef, Vec<ContainerRef>)>,
    services: Vec<(ResourceRef, Vec<PortBinding>)>,
    failure: Option<String>,
}

impl FakeCluster {
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn with_pod(mut self, pod: ResourceRef, containers: &[&str]) -> Self {
        let containers = containers.iter().map(|name| ContainerRef::new(*name)).collect();
        self.pods.push((pod, containers));
        self
    }

    pub fn with_service(mut self, service: ResourceRef, ports: Vec<PortBinding>) -> Self {
        self.services.push((service, ports));
        self
    }

    fn check(&self) -> Result<()> {
        if let Some(message) = &self.failure {
            bail!("{message}");
        }
        Ok(())
    }
}

impl ClusterApi for FakeCluster {
    async fn list_pods(&self) -> Result<Vec<ResourceRef>> {
        self.check()?;
        Ok(self.pods.iter().map(|(pod, _)| pod.clone()).collect())
    }

    async fn pod_containers(&self, pod: &ResourceRef) -> Result<Vec<ContainerRef>> {
        self.check()?;
        match self.pods.iter().find(|(candidate, _)| candidate == pod) {
            Some((_, containers)) => Ok(containers.clone()),
            None => bail!("pods \"{}\" not found", pod.name),
        }
    }

    async fn list_services(&self) -> Result<Vec<ResourceRef>> {
        self.check()?;
        Ok(self.services.iter().map(|(service, _)| service.clone()).collect())
    }

    async fn service_ports(&self, service: &ResourceRef) -> Result<Vec<PortBinding>> {
        self.check()?;
        match self.services.iter().find(|(candidate, _)| candidate == service) {
            Some((_, ports)) => Ok(ports.clone()),
            None => bail!("services \"{}\" not found", service.name),
        }
    }
}

/// Replays queued outputs in order and records every argument vector.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    outputs: RefCell<VecDeque<std::result::Result<CommandOutput, String>>>,
    foreground: RefCell<VecDeque<ForegroundExit>>,
    pub calls: RefCell<Vec<Vec<String>>>,
}

impl ScriptedExecutor {
    pub fn respond(self, output: CommandOutput) -> Self {
        self.outputs.borrow_mut().push_back(Ok(output));
        self
    }

    pub fn respond_failure(self, exit_code: i32, stderr: &str) -> Self {
        self.outputs.borrow_mut().push_back(Ok(CommandOutput {
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }));
        self
    }

    pub fn respond_spawn_error(self, message: &str) -> Self {
        self.outputs.borrow_mut().push_back(Err(message.to_string()));
        self
    }

    pub fn foreground(self, exit: ForegroundExit) -> Self {
        self.foreground.borrow_mut().push_back(exit);
        self
    }

    /// Paths passed to `ls -la`, in call order.
    pub fn listed_paths(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|args| args.first().map(String::as_str) == Some("exec"))
            .filter_map(|args| args.last().cloned())
            .collect()
    }
}

impl CommandExecutor for ScriptedExecutor {
    async fn run(&self, args: &[String]) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(args.to_vec());
        match self.outputs.borrow_mut().pop_front() {
            Some(Ok(output)) => Ok(output),
            Some(Err(message)) => bail!("{message}"),
            None => bail!("no scripted output for {}", args.join(" ")),
        }
    }

    async fn run_foreground(&self, args: &[String]) -> Result<ForegroundExit> {
        self.calls.borrow_mut().push(args.to_vec());
        Ok(self
            .foreground
            .borrow_mut()
            .pop_front()
            .unwrap_or(ForegroundExit::Interrupted))
    }
}

/// Builds `ls -la` style output with a `total` header.
pub fn listing(entries: &[(&str, bool)]) -> CommandOutput {
    let mut stdout = format!("total {}\n", entries.len() * 4);
    for (name, is_dir) in entries {
        let mode = if *is_dir { "drwxr-xr-x" } else { "-rw-r--r--" };
        stdout.push_str(&format!(
            "{mode}    2 root     root          4096 Mar  3 10:00 {name}\n"
        ));
    }
    CommandOutput {
        exit_code: Some(0),
        stdout,
        stderr: String::new(),
    }
}

#[derive(Debug, Clone)]
enum Pick {
    Label(String),
    Cancel,
}

/// Answers menus by label and text prompts from a queue. Exhausted picks
/// cancel; exhausted inputs accept the default (empty line).
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    picks: VecDeque<Pick>,
    inputs: VecDeque<Option<String>>,
    pub titles: Vec<String>,
    pub menus: Vec<Vec<String>>,
    pub prompts: Vec<String>,
    pub notices: Vec<String>,
    pub acknowledged: usize,
}

impl ScriptedPrompter {
    pub fn pick(mut self, label: &str) -> Self {
        self.picks.push_back(Pick::Label(label.to_string()));
        self
    }

    pub fn cancel(mut self) -> Self {
        self.picks.push_back(Pick::Cancel);
        self
    }

    pub fn answer(mut self, text: &str) -> Self {
        self.inputs.push_back(Some(text.to_string()));
        self
    }

    pub fn interrupt_input(mut self) -> Self {
        self.inputs.push_back(None);
        self
    }
}

impl Prompter for ScriptedPrompter {
    async fn choose(&mut self, title: &str, items: &[String]) -> Option<usize> {
        self.titles.push(title.to_string());
        self.menus.push(items.to_vec());
        match self.picks.pop_front()? {
            Pick::Label(label) => Some(
                items
                    .iter()
                    .position(|item| *item == label)
                    .unwrap_or_else(|| panic!("'{label}' not offered in {items:?}")),
            ),
            Pick::Cancel => None,
        }
    }

    async fn input(&mut self, prompt: &str) -> Option<String> {
        self.prompts.push(prompt.to_string());
        self.inputs.pop_front().unwrap_or_else(|| Some(String::new()))
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }

    async fn acknowledge(&mut self) {
        self.acknowledged += 1;
    }
}
