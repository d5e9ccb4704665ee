use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use crate::path;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum MenuAction {
    ListServices,
    PortForward,
    RetrieveFile,
    Exit,
}

impl MenuAction {
    pub const ALL: [Self; 4] = [
        Self::ListServices,
        Self::PortForward,
        Self::RetrieveFile,
        Self::Exit,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::ListServices => "List Services",
            Self::PortForward => "Port-Forward Service",
            Self::RetrieveFile => "Retrieve File from Pod",
            Self::Exit => "Exit",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum NamespaceScope {
    All,
    Named(String),
}

impl Display for NamespaceScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Named(namespace) => write!(f, "{namespace}"),
        }
    }
}

/// A namespaced pod or service as it was listed. May be stale by the time it
/// is used.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct ResourceRef {
    pub namespace: String,
    pub name: String,
}

impl ResourceRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl Display for ResourceRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct ContainerRef {
    pub name: String,
}

impl ContainerRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Display for ContainerRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TargetPort {
    Number(i32),
    /// Symbolic container port name, resolved server-side.
    Named(String),
}

impl Display for TargetPort {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(port) => write!(f, "{port}"),
            Self::Named(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Protocol {
    Tcp,
    Udp,
    Sctp,
}

impl Protocol {
    pub fn from_api(value: Option<&str>) -> Self {
        match value.map(|value| value.trim().to_ascii_uppercase()).as_deref() {
            Some("UDP") => Self::Udp,
            Some("SCTP") => Self::Sctp,
            _ => Self::Tcp,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
            Self::Sctp => "SCTP",
        }
    }
}

impl Display for Protocol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PortBinding {
    pub port: u16,
    pub target_port: TargetPort,
    pub name: Option<String>,
    pub protocol: Protocol,
}

impl PortBinding {
    /// Menu label: `<port> [(name)] → <target_port> <protocol>`.
    pub fn label(&self) -> String {
        let mut label = self.port.to_string();
        if let Some(name) = self.name.as_deref().filter(|name| !name.is_empty()) {
            label.push_str(&format!(" ({name})"));
        }
        label.push_str(&format!(" → {} {}", self.target_port, self.protocol));
        label
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

impl DirEntry {
    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }
}

/// Position of the directory browser inside one container.
///
/// `current_path` is only ever `/` or a value produced by [`path::join`] /
/// [`path::parent`] from a previous position, so it stays absolute and
/// normalized.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NavigationState {
    pub pod: ResourceRef,
    pub container: ContainerRef,
    current_path: String,
}

impl NavigationState {
    pub fn at_root(pod: ResourceRef, container: ContainerRef) -> Self {
        Self {
            pod,
            container,
            current_path: path::ROOT.to_string(),
        }
    }

    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    pub fn is_root(&self) -> bool {
        self.current_path == path::ROOT
    }

    pub fn descend(self, entry: &DirEntry) -> Self {
        let current_path = path::join(&self.current_path, &entry.name);
        Self {
            current_path,
            ..self
        }
    }

    pub fn ascend(self) -> Self {
        let current_path = path::parent(&self.current_path);
        Self {
            current_path,
            ..self
        }
    }

    pub fn path_of(&self, entry: &DirEntry) -> String {
        path::join(&self.current_path, &entry.name)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RetrievalTarget {
    pub pod: ResourceRef,
    pub container: ContainerRef,
    pub remote_path: String,
    pub local_path: PathBuf,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ForwardSpec {
    pub service: ResourceRef,
    pub remote_port: u16,
    pub local_port: u16,
}

#[cfg(test)]
mod tests {
    use super::{
        ContainerRef, DirEntry, MenuAction, NamespaceScope, NavigationState, PortBinding, Protocol,
        ResourceRef, TargetPort,
    };

    #[test]
    fn port_label_includes_optional_name() {
        let named = PortBinding {
            port: 8080,
            target_port: TargetPort::Number(80),
            name: Some("http".to_string()),
            protocol: Protocol::Tcp,
        };
        assert_eq!(named.label(), "8080 (http) → 80 TCP");

        let unnamed = PortBinding {
            port: 53,
            target_port: TargetPort::Named("dns".to_string()),
            name: None,
            protocol: Protocol::Udp,
        };
        assert_eq!(unnamed.label(), "53 → dns UDP");
    }

    #[test]
    fn protocol_defaults_to_tcp() {
        assert_eq!(Protocol::from_api(None), Protocol::Tcp);
        assert_eq!(Protocol::from_api(Some("udp")), Protocol::Udp);
        assert_eq!(Protocol::from_api(Some("SCTP")), Protocol::Sctp);
        assert_eq!(Protocol::from_api(Some("bogus")), Protocol::Tcp);
    }

    #[test]
    fn descend_then_ascend_returns_to_start() {
        let start = NavigationState::at_root(
            ResourceRef::new("ns1", "api-7f"),
            ContainerRef::new("api"),
        )
        .descend(&DirEntry::dir("var"));
        assert_eq!(start.current_path(), "/var");

        let deep = start
            .clone()
            .descend(&DirEntry::dir("log"))
            .descend(&DirEntry::dir("nginx"));
        assert_eq!(deep.current_path(), "/var/log/nginx");

        let back = deep.ascend().ascend();
        assert_eq!(back, start);
        assert!(back.ascend().is_root());
    }

    #[test]
    fn resource_ref_renders_namespace_slash_name() {
        assert_eq!(ResourceRef::new("ns1", "web").to_string(), "ns1/web");
        assert_eq!(MenuAction::ALL.last().map(|a| a.title()), Some("Exit"));
    }

    #[test]
    fn namespace_scope_renders_banner_label() {
        assert_eq!(NamespaceScope::All.to_string(), "all");
        assert_eq!(NamespaceScope::Named("ns1".to_string()).to_string(), "ns1");
    }
}
