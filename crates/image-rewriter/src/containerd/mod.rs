//! Registry mirror resolution for containerd.
//!
//! Maps upstream registries to the mirror hosts a cluster should pull
//! through, given its provider and region. Unlike image rule matching this
//! is not first-match-wins: every configured upstream whose hosts cover the
//! provider and region contributes one result, since multiple registries
//! can be mirrored simultaneously.

mod hosts;

pub use hosts::{RegistryMirror, RenderError, hosts_toml_path};

use std::sync::LazyLock;

use image_rewriter_config::Configuration;
use indexmap::IndexMap;
use regex::Regex;

use crate::region::RegionMap;

/// Matches mirror URLs carrying a path after the host component, e.g.
/// `https://mirror.example.com/v2/some/path`. containerd requires such
/// mirrors to be declared with `override_path = true`.
static HOST_WITH_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[a-zA-Z0-9.\-]+(?:/[^\s]*)+").unwrap());

/// Compiled registry mirror rules.
///
/// Like [`ImageRules`](crate::rules::ImageRules), compiled once from a
/// validated configuration and queried without locking afterwards.
#[derive(Debug, Clone, Default)]
pub struct MirrorRules {
    upstreams: Vec<Upstream>,
}

/// One compiled upstream: its server and the mirror hosts indexed by
/// provider and region.
#[derive(Debug, Clone)]
struct Upstream {
    upstream: String,
    server: String,
    hosts: IndexMap<String, RegionMap<String>>,
}

/// One resolved mirror for an upstream registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamMirror {
    /// Name of the mirrored upstream registry.
    pub upstream: String,
    /// URL of the upstream registry server.
    pub server: String,
    /// URL of the mirror host serving the upstream's content.
    pub host_url: String,
    /// Whether the mirror must be declared with `override_path = true`
    /// because its URL carries a non-root path.
    pub override_path: bool,
}

impl MirrorRules {
    /// Compiles the containerd section of `config`, preserving upstream
    /// declaration order.
    pub fn new(config: &Configuration) -> Self {
        let upstreams = config
            .containerd
            .iter()
            .map(|upstream| {
                let mut hosts: IndexMap<String, RegionMap<String>> = IndexMap::new();

                for host in &upstream.hosts {
                    hosts
                        .entry(host.provider.clone())
                        .or_default()
                        .insert(&host.regions, host.url.clone());
                }

                Upstream {
                    upstream: upstream.upstream.clone(),
                    server: upstream.server.clone(),
                    hosts,
                }
            })
            .collect();

        Self { upstreams }
    }

    /// Returns every mirror applying to `provider` and `region`, in
    /// upstream declaration order.
    pub fn upstream_configs(&self, provider: &str, region: &str) -> Vec<UpstreamMirror> {
        let mut mirrors = Vec::new();

        for upstream in &self.upstreams {
            let Some(host_url) = upstream
                .hosts
                .get(provider)
                .and_then(|regions| regions.lookup(region))
            else {
                continue;
            };

            mirrors.push(UpstreamMirror {
                upstream: upstream.upstream.clone(),
                server: upstream.server.clone(),
                host_url: host_url.clone(),
                override_path: HOST_WITH_PATH.is_match(host_url),
            });
        }

        mirrors
    }
}
