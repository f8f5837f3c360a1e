//! Configuration models for provider- and region-scoped image rewriting.
//!
//! The configuration is a declarative YAML document with two sections:
//! `overwrites`, which maps source image references to per-provider
//! replacement values, and `containerd`, which maps upstream registries to
//! per-provider mirror hosts:
//!
//! ```yaml
//! overwrites:
//!   - source:
//!       image: registry.example.com/image:latest
//!     targets:
//!       - image: local-west/image-replacement:latest
//!         provider: local
//!         regions: [west]
//! containerd:
//!   - upstream: registry.example.com
//!     server: https://registry.example.com
//!     hosts:
//!       - url: https://mirror.example.com
//!         provider: local
//!         regions: [west]
//! ```
//!
//! Rule order is significant and is preserved by deserialization. The rewrite
//! engines consuming these models assume they have been validated; use
//! [`Configuration::load`] (or [`validation::validate`] directly) to enforce
//! that assumption before compiling them.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use std::fs;
use std::path::Path;

use serde::Deserialize;

pub mod validation;

/// Errors encountered while loading a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration is syntactically invalid.
    #[error("invalid configuration syntax")]
    Syntax(#[source] serde_yaml::Error),

    /// The configuration is semantically invalid.
    #[error(transparent)]
    Invalid(#[from] validation::ValidationErrors),
}

/// The top-level rewrite configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Configuration {
    /// Source images to replace and their per-provider replacement values.
    #[serde(default)]
    pub overwrites: Vec<ImageOverwrite>,

    /// Upstream registries to mirror, per provider and region.
    #[serde(default)]
    pub containerd: Vec<ContainerdUpstream>,
}

impl Configuration {
    /// Parses a configuration from its YAML representation.
    ///
    /// No semantic validation is performed; see [`validation::validate`].
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(contents).map_err(ConfigError::Syntax)
    }

    /// Reads, parses, and validates the configuration at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::from_yaml(&fs::read_to_string(path)?)?;
        validation::validate(&config)?;
        Ok(config)
    }
}

/// A single image reference value, matched or substituted either in full
/// or by leading prefix.
///
/// Serialized as the mutually exclusive `image:` / `prefix:` keys; a mapping
/// carrying both (or neither) fails to deserialize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Matches or replaces a reference only on full string equality.
    Exact(String),

    /// Matches or replaces only the leading portion of a reference,
    /// preserving the remainder.
    Prefix(String),
}

/// Helper mirroring [`ImageRef`]'s `image:` / `prefix:` mapping form.
///
/// `serde_yaml` deserializes externally tagged enums only from YAML's
/// explicit tag syntax (`!image ...`), not from a plain mapping, so
/// `ImageRef` deserializes via this intermediate struct instead of deriving
/// `Deserialize` directly.
#[derive(Deserialize)]
struct ImageRefRepr {
    image: Option<String>,
    prefix: Option<String>,
}

impl<'de> Deserialize<'de> for ImageRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error as _;

        match ImageRefRepr::deserialize(deserializer)? {
            ImageRefRepr {
                image: Some(image),
                prefix: None,
            } => Ok(ImageRef::Exact(image)),
            ImageRefRepr {
                image: None,
                prefix: Some(prefix),
            } => Ok(ImageRef::Prefix(prefix)),
            ImageRefRepr {
                image: Some(_),
                prefix: Some(_),
            } => Err(D::Error::custom(
                "expected exactly one of `image` or `prefix`, got both",
            )),
            ImageRefRepr {
                image: None,
                prefix: None,
            } => Err(D::Error::custom(
                "expected exactly one of `image` or `prefix`",
            )),
        }
    }
}

/// One rewrite rule: a source image to match and the values replacing it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageOverwrite {
    /// The image reference (or reference prefix) to replace.
    pub source: ImageRef,

    /// Replacement values, scoped by provider and region.
    pub targets: Vec<OverwriteTarget>,
}

/// A replacement value scoped to one provider and a set of regions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OverwriteTarget {
    /// The replacement value.
    #[serde(flatten)]
    pub value: ImageRef,

    /// The provider this target applies to.
    pub provider: String,

    /// The regions this target applies to. An empty list means every
    /// region of the provider.
    #[serde(default)]
    pub regions: Vec<String>,
}

/// Mirror configuration for one upstream registry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContainerdUpstream {
    /// Name of the upstream registry, e.g. `registry.example.com`.
    pub upstream: String,

    /// URL of the upstream registry server.
    pub server: String,

    /// Mirror hosts serving the upstream's content, scoped by provider
    /// and region.
    pub hosts: Vec<UpstreamHost>,
}

/// A mirror host scoped to one provider and a set of regions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpstreamHost {
    /// URL of the mirror host.
    pub url: String,

    /// The provider this host applies to.
    pub provider: String,

    /// The regions this host applies to. An empty list means every region
    /// of the provider.
    #[serde(default)]
    pub regions: Vec<String>,
}
