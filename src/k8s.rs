use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::{Pod, Service, ServicePort};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::ListParams;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config, ResourceExt};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::model::{
    ContainerRef, NamespaceScope, PortBinding, Protocol, ResourceRef, TargetPort,
};

/// Read-only view of the cluster used by the navigator.
pub trait ClusterApi {
    async fn list_pods(&self) -> Result<Vec<ResourceRef>>;
    async fn pod_containers(&self, pod: &ResourceRef) -> Result<Vec<ContainerRef>>;
    async fn list_services(&self) -> Result<Vec<ResourceRef>>;
    async fn service_ports(&self, service: &ResourceRef) -> Result<Vec<PortBinding>>;
}

#[derive(Debug, Clone)]
pub struct KubeSelection {
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
}

#[derive(Clone)]
pub struct KubeGateway {
    client: Client,
    context: String,
    cluster: String,
    scope: NamespaceScope,
}

impl KubeGateway {
    pub async fn connect(selection: &KubeSelection, scope: NamespaceScope) -> Result<Self> {
        let kubeconfig = match selection.kubeconfig.as_deref() {
            Some(path) => Some(read_kubeconfig(path)?),
            None => Kubeconfig::read().ok(),
        };

        let config = if let Some(kubeconfig_value) = kubeconfig.clone() {
            let options = KubeConfigOptions {
                context: selection.context.clone(),
                cluster: None,
                user: None,
            };
            Config::from_custom_kubeconfig(kubeconfig_value, &options)
                .await
                .context("failed to infer Kubernetes configuration")?
        } else {
            if selection.context.is_some() {
                anyhow::bail!("kubeconfig not found; --context is unavailable in this environment");
            }
            Config::infer()
                .await
                .context("failed to infer Kubernetes configuration")?
        };

        let cluster = config.cluster_url.to_string();
        let client = Client::try_from(config).context("failed to initialize Kubernetes client")?;
        let context = selection
            .context
            .clone()
            .or_else(|| {
                kubeconfig
                    .as_ref()
                    .and_then(|cfg| cfg.current_context.clone())
            })
            .unwrap_or_else(|| "in-cluster".to_string());
        debug!("connected to {cluster} via context {context}");

        Ok(Self {
            client,
            context,
            cluster,
            scope,
        })
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn scope(&self) -> &NamespaceScope {
        &self.scope
    }
}

impl ClusterApi for KubeGateway {
    async fn list_pods(&self) -> Result<Vec<ResourceRef>> {
        let pods: Api<Pod> = match &self.scope {
            NamespaceScope::All => Api::all(self.client.clone()),
            NamespaceScope::Named(namespace) => Api::namespaced(self.client.clone(), namespace),
        };

        let list = pods
            .list(&list_params())
            .await
            .with_context(|| {
                format!("failed to list pods in namespace scope {}", self.scope)
            })?;
        Ok(list
            .into_iter()
            .map(|pod| ResourceRef::new(pod.namespace().unwrap_or_default(), pod.name_any()))
            .collect())
    }

    async fn pod_containers(&self, pod: &ResourceRef) -> Result<Vec<ContainerRef>> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &pod.namespace);
        let fetched = pods
            .get(&pod.name)
            .await
            .with_context(|| format!("failed to fetch pod {pod}"))?;

        Ok(fetched
            .spec
            .map(|spec| {
                spec.containers
                    .into_iter()
                    .map(|container| ContainerRef::new(container.name))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_services(&self) -> Result<Vec<ResourceRef>> {
        let services: Api<Service> = match &self.scope {
            NamespaceScope::All => Api::all(self.client.clone()),
            NamespaceScope::Named(namespace) => Api::namespaced(self.client.clone(), namespace),
        };

        let list = services
            .list(&list_params())
            .await
            .with_context(|| {
                format!("failed to list services in namespace scope {}", self.scope)
            })?;
        Ok(list
            .into_iter()
            .map(|service| {
                ResourceRef::new(service.namespace().unwrap_or_default(), service.name_any())
            })
            .collect())
    }

    async fn service_ports(&self, service: &ResourceRef) -> Result<Vec<PortBinding>> {
        let services: Api<Service> = Api::namespaced(self.client.clone(), &service.namespace);
        let fetched = services
            .get(&service.name)
            .await
            .with_context(|| format!("failed to fetch service {service}"))?;

        let ports = fetched
            .spec
            .and_then(|spec| spec.ports)
            .unwrap_or_default();
        Ok(ports
            .into_iter()
            .filter_map(|port| match port_binding(&port) {
                Some(binding) => Some(binding),
                None => {
                    warn!("skipping out-of-range port {} on service {service}", port.port);
                    None
                }
            })
            .collect())
    }
}

fn read_kubeconfig(path: &Path) -> Result<Kubeconfig> {
    Kubeconfig::read_from(path)
        .with_context(|| format!("failed to read kubeconfig {}", path.display()))
}

fn list_params() -> ListParams {
    ListParams::default().limit(500)
}

fn port_binding(port: &ServicePort) -> Option<PortBinding> {
    let number = u16::try_from(port.port).ok().filter(|value| *value > 0)?;
    let target_port = match port.target_port.as_ref() {
        Some(IntOrString::Int(value)) => TargetPort::Number(*value),
        Some(IntOrString::String(name)) => TargetPort::Named(name.clone()),
        None => TargetPort::Number(port.port),
    };

    Some(PortBinding {
        port: number,
        target_port,
        name: port.name.clone().filter(|name| !name.is_empty()),
        protocol: Protocol::from_api(port.protocol.as_deref()),
    })
}
