use std::path::PathBuf;
use tracing::debug;

use crate::dispatch::Dispatcher;
use crate::exec::{CommandExecutor, ForegroundExit};
use crate::k8s::ClusterApi;
use crate::lister::ResourceLister;
use crate::model::MenuAction;
use crate::prompt::Prompter;
use crate::resolver::Resolver;

/// Top-level menu loop. Each action runs one flow to completion or
/// cancellation, then control returns to the menu.
pub struct App<C, E, P> {
    lister: ResourceLister<C>,
    executor: E,
    prompter: P,
    save_dir: PathBuf,
}

impl<C, E, P> App<C, E, P>
where
    C: ClusterApi,
    E: CommandExecutor,
    P: Prompter,
{
    pub fn new(api: C, executor: E, prompter: P, save_dir: PathBuf) -> Self {
        Self {
            lister: ResourceLister::new(api),
            executor,
            prompter,
            save_dir,
        }
    }

    pub async fn run(&mut self) {
        loop {
            let action = self.next_action().await;
            debug!("menu action={action:?}");
            if action == MenuAction::Exit {
                break;
            }
            self.run_action(action).await;
        }
        self.prompter.notify("Exiting KSAK. Goodbye!");
    }

    async fn next_action(&mut self) -> MenuAction {
        let labels = MenuAction::ALL
            .iter()
            .map(|action| action.title().to_string())
            .collect::<Vec<_>>();
        self.prompter
            .choose("Select an option:", &labels)
            .await
            .and_then(|index| MenuAction::ALL.get(index).copied())
            .unwrap_or(MenuAction::Exit)
    }

    pub async fn run_action(&mut self, action: MenuAction) {
        match action {
            MenuAction::ListServices => self.resolver().show_services().await,
            MenuAction::PortForward => self.port_forward().await,
            MenuAction::RetrieveFile => self.retrieve_file().await,
            MenuAction::Exit => return,
        }
        self.prompter.acknowledge().await;
    }

    fn resolver(&mut self) -> Resolver<'_, C, E, P> {
        Resolver::new(
            &self.lister,
            &self.executor,
            &mut self.prompter,
            &self.save_dir,
        )
    }

    async fn retrieve_file(&mut self) {
        let Some(target) = self.resolver().retrieval_target().await else {
            return;
        };

        self.prompter.notify(&format!(
            "Retrieving {} from pod {}, container {}...",
            target.remote_path, target.pod, target.container
        ));
        match Dispatcher::new(&self.executor).retrieve(&target).await {
            Ok(()) => self
                .prompter
                .notify(&format!("File saved to {}", target.local_path.display())),
            Err(error) => {
                self.prompter.notify("File retrieval failed.");
                self.prompter.notify(&error.to_string());
            }
        }
    }

    async fn port_forward(&mut self) {
        let Some(spec) = self.resolver().forward_spec().await else {
            return;
        };

        self.prompter
            .notify(&format!("Port-forwarding service {}", spec.service));
        self.prompter.notify(&format!(
            "Remote port {} → Local port {}",
            spec.remote_port, spec.local_port
        ));
        self.prompter.notify("Press Ctrl+C to stop port-forwarding");
        match Dispatcher::new(&self.executor).forward(&spec).await {
            Ok(ForegroundExit::Interrupted) => self.prompter.notify("Port-forwarding stopped."),
            Ok(ForegroundExit::Exited(Some(0))) => {
                self.prompter.notify("Port-forwarding session ended.")
            }
            Ok(ForegroundExit::Exited(Some(code))) => self
                .prompter
                .notify(&format!("Port-forwarding exited with status {code}.")),
            Ok(ForegroundExit::Exited(None)) => {
                self.prompter.notify("Port-forwarding terminated by signal.")
            }
            Err(error) => self.prompter.notify(&format!("Error: {error}")),
        }
    }
}
