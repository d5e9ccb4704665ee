use thiserror::Error;

/// Failures the navigator degrades around. None of these end the process.
#[derive(Debug, Error)]
pub enum NavError {
    #[error("failed to list {what}: {detail}")]
    ResourceList { what: &'static str, detail: String },

    #[error("failed to list {path}: {detail}")]
    DirectoryList { path: String, detail: String },

    #[error("failed to copy {remote} to {local}: {stderr}")]
    Retrieval {
        remote: String,
        local: String,
        stderr: String,
    },

    #[error("invalid port '{input}': {reason}")]
    InvalidInput { input: String, reason: &'static str },

    #[error("port-forward for {service} could not start: {detail}")]
    Forward { service: String, detail: String },
}

pub fn compact_error(error: &anyhow::Error) -> String {
    let mut out = Vec::new();
    for (index, cause) in error.chain().enumerate() {
        if index == 0 {
            out.push(cause.to_string());
        } else if index <= 2 {
            out.push(format!("caused by: {cause}"));
        } else {
            break;
        }
    }

    out.join("\n")
}
