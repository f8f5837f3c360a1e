//! Rendering of containerd `hosts.toml` drop-in files.

use std::fmt::{self, Write as _};
use std::path::PathBuf;

use super::UpstreamMirror;

/// Base directory containerd reads per-registry host configuration from.
const CERTS_DIR: &str = "/etc/containerd/certs.d";

/// A registry mirror to render as a `hosts.toml` drop-in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryMirror {
    /// URL of the upstream registry server.
    pub upstream_server: String,
    /// URL of the mirror host.
    pub mirror_host: String,
    /// Whether the host block must declare `override_path = true`, see
    /// <https://github.com/containerd/containerd/blob/main/docs/hosts.md#override_path-field>.
    pub override_path: bool,
}

/// Failure to render a `hosts.toml` drop-in.
#[derive(Debug, thiserror::Error)]
#[error("failed to render hosts.toml")]
pub struct RenderError(#[from] fmt::Error);

impl RegistryMirror {
    /// Renders the `hosts.toml` contents for this mirror.
    ///
    /// Empty server and host values render literally as empty-quoted
    /// strings.
    pub fn hosts_toml(&self) -> Result<String, RenderError> {
        let mut out = String::new();

        writeln!(out, "server = \"{}\"", self.upstream_server)?;
        writeln!(out)?;
        writeln!(out, "[host.\"{}\"]", self.mirror_host)?;
        writeln!(out, "  capabilities = [\"pull\", \"resolve\"]")?;
        if self.override_path {
            writeln!(out, "  override_path = true")?;
        }

        Ok(out)
    }
}

impl From<&UpstreamMirror> for RegistryMirror {
    fn from(mirror: &UpstreamMirror) -> Self {
        Self {
            upstream_server: mirror.server.clone(),
            mirror_host: mirror.host_url.clone(),
            override_path: mirror.override_path,
        }
    }
}

/// Returns the drop-in path containerd expects the `hosts.toml` for
/// `upstream` at, e.g. `/etc/containerd/certs.d/docker.io/hosts.toml`.
pub fn hosts_toml_path(upstream: &str) -> PathBuf {
    [CERTS_DIR, upstream, "hosts.toml"].iter().collect()
}
