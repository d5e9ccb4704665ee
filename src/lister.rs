use tracing::{debug, warn};

use crate::error::{NavError, compact_error};
use crate::k8s::ClusterApi;
use crate::model::{ContainerRef, PortBinding, ResourceRef};

/// One API query per call, results in API order. Failures come back as
/// [`NavError::ResourceList`] and callers degrade to an empty list.
pub struct ResourceLister<C> {
    api: C,
}

impl<C: ClusterApi> ResourceLister<C> {
    pub fn new(api: C) -> Self {
        Self { api }
    }

    pub async fn list_pods(&self) -> Result<Vec<ResourceRef>, NavError> {
        let pods = self
            .api
            .list_pods()
            .await
            .map_err(|error| list_error("pods", &error))?;
        debug!("listed {} pods", pods.len());
        Ok(pods)
    }

    pub async fn list_containers(&self, pod: &ResourceRef) -> Result<Vec<ContainerRef>, NavError> {
        let containers = self
            .api
            .pod_containers(pod)
            .await
            .map_err(|error| list_error("containers", &error))?;
        debug!("listed {} containers in {pod}", containers.len());
        Ok(containers)
    }

    pub async fn list_services(&self) -> Result<Vec<ResourceRef>, NavError> {
        let services = self
            .api
            .list_services()
            .await
            .map_err(|error| list_error("services", &error))?;
        debug!("listed {} services", services.len());
        Ok(services)
    }

    pub async fn list_ports(&self, service: &ResourceRef) -> Result<Vec<PortBinding>, NavError> {
        let ports = self
            .api
            .service_ports(service)
            .await
            .map_err(|error| list_error("service ports", &error))?;
        debug!("listed {} ports on {service}", ports.len());
        Ok(ports)
    }
}

fn list_error(what: &'static str, error: &anyhow::Error) -> NavError {
    let detail = compact_error(error);
    warn!("listing {what} failed: {detail}");
    NavError::ResourceList { what, detail }
}
