// Resource Loader
//
// Loads external templates and stylesheets referenced by components.

use thiserror::Error;
use ts::path::{dirname, is_absolute, join};
use ts::CompilerHost;

/// Resource load error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ResourceError {
    pub url: String,
    pub message: String,
}

impl ResourceError {
    pub fn not_found(url: &str) -> Self {
        Self {
            url: url.to_string(),
            message: format!("Resource not found: {}", url),
        }
    }

    pub fn load_failed(url: &str, reason: &str) -> Self {
        Self {
            url: url.to_string(),
            message: format!("Failed to load {}: {}", url, reason),
        }
    }
}

/// Resource loader trait. Shared with the parallel compile phase.
pub trait ResourceLoader: Send + Sync {
    fn get(&self, url: &str) -> Result<String, ResourceError>;
}

/// Loads resources through the compiler host.
pub struct HostResourceLoader<'a> {
    host: &'a dyn CompilerHost,
}

impl<'a> HostResourceLoader<'a> {
    pub fn new(host: &'a dyn CompilerHost) -> Self {
        Self { host }
    }
}

impl ResourceLoader for HostResourceLoader<'_> {
    fn get(&self, url: &str) -> Result<String, ResourceError> {
        if !self.host.file_exists(url) {
            return Err(ResourceError::not_found(url));
        }
        self.host
            .read_file(url)
            .ok_or_else(|| ResourceError::load_failed(url, "the host could not read it"))
    }
}

/// Resolve a `templateUrl` or `styleUrls` entry against the component's file.
pub fn resolve_resource_url(containing_file: &str, url: &str) -> String {
    if is_absolute(url) {
        join("", url)
    } else {
        join(&dirname(containing_file), url)
    }
}
