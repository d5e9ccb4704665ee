mod app;
mod browser;
mod cli;
mod config;
mod dispatch;
mod error;
mod exec;
mod input;
mod interrupt;
mod k8s;
mod lister;
mod model;
mod path;
mod prompt;
mod resolver;
#[cfg(test)]
mod testing;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use cli::CliArgs;
use config::RuntimeConfig;
use exec::KubectlExecutor;
use interrupt::Interrupts;
use k8s::{KubeGateway, KubeSelection};
use model::NamespaceScope;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;
use ui::TerminalPrompter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args)?;

    let interrupts = Interrupts::default();
    interrupts.listen();
    tokio::select! {
        result = run(&args, &interrupts) => result,
        () = interrupts.exit_requested() => {
            ui::reset_terminal();
            println!();
            println!("Operation cancelled by user. Exiting...");
            Ok(())
        }
    }
}

async fn run(args: &CliArgs, interrupts: &Interrupts) -> Result<()> {
    let config = RuntimeConfig::discover()?.with_cli_overrides(args);
    if let Some(source) = &config.source {
        info!("using runtime config {source}");
    }

    let kubeconfig = config.resolved_kubeconfig();
    let selection = KubeSelection {
        kubeconfig: kubeconfig.clone(),
        context: config.context.clone(),
    };
    let scope = match &config.namespace {
        Some(namespace) => NamespaceScope::Named(namespace.clone()),
        None => NamespaceScope::All,
    };
    let gateway = KubeGateway::connect(&selection, scope)
        .await
        .context("failed to connect to the cluster")?;
    info!(
        "cluster {} context {} namespaces {}",
        gateway.cluster(),
        gateway.context(),
        gateway.scope()
    );

    let banner = format!(
        "Kubernetes Swiss Army Knife (ksak) · {} · ns:{}",
        gateway.context(),
        gateway.scope()
    );
    let executor = KubectlExecutor::new(config.kubectl.clone())
        .with_kubeconfig(kubeconfig)
        .with_context(config.context.clone())
        .with_interrupts(interrupts.clone());
    let mut app = App::new(
        gateway,
        executor,
        TerminalPrompter::new(banner),
        config.resolved_save_dir(),
    );

    app.run().await;
    Ok(())
}

fn init_tracing(args: &CliArgs) -> Result<()> {
    let filter = EnvFilter::try_new(&args.log_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .compact();

    match &args.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let _ = builder.with_writer(Mutex::new(file)).try_init();
        }
        None => {
            let _ = builder.with_writer(std::io::sink).try_init();
        }
    }

    Ok(())
}
