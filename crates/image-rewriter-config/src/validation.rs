//! Semantic validation of [`Configuration`](crate::Configuration) values.
//!
//! The rewrite engines assume their inputs are valid and never re-check
//! them; this pass is where that assumption is enforced. Every violation in
//! a document is collected, each with the path of the offending field.

use std::fmt;

use crate::{Configuration, ImageRef};

/// A single configuration violation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{path}: {message}")]
pub struct ValidationError {
    /// Path of the offending field, e.g. `overwrites[0].targets[1].provider`.
    pub path: String,
    /// Description of the violation.
    pub message: String,
}

impl ValidationError {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Every violation found in one configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    /// The individual violations, in document order.
    pub errors: Vec<ValidationError>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid configuration")?;
        for error in &self.errors {
            write!(f, "\n  {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Validates `config`, collecting every violation found.
pub fn validate(config: &Configuration) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    for (i, overwrite) in config.overwrites.iter().enumerate() {
        let overwrite_path = format!("overwrites[{i}]");

        if overwrite.targets.is_empty() {
            errors.push(ValidationError::new(
                format!("{overwrite_path}.targets"),
                "at least one target must be specified",
            ));
        }

        for (j, target) in overwrite.targets.iter().enumerate() {
            let target_path = format!("{overwrite_path}.targets[{j}]");

            match (&overwrite.source, &target.value) {
                (ImageRef::Prefix(_), ImageRef::Exact(_)) => {
                    errors.push(ValidationError::new(
                        &target_path,
                        "target must use `prefix` when the source is a prefix",
                    ));
                }
                (ImageRef::Exact(_), ImageRef::Prefix(_)) => {
                    errors.push(ValidationError::new(
                        &target_path,
                        "target must use `image` when the source is an image",
                    ));
                }
                _ => {}
            }

            if target.provider.is_empty() {
                errors.push(ValidationError::new(
                    format!("{target_path}.provider"),
                    "provider must be specified",
                ));
            }

            validate_regions(&target.regions, &target_path, &mut errors);
        }
    }

    for (i, upstream) in config.containerd.iter().enumerate() {
        let upstream_path = format!("containerd[{i}]");

        if upstream.upstream.is_empty() {
            errors.push(ValidationError::new(
                format!("{upstream_path}.upstream"),
                "upstream must be specified",
            ));
        }
        if upstream.server.is_empty() {
            errors.push(ValidationError::new(
                format!("{upstream_path}.server"),
                "server must be specified",
            ));
        }

        for (j, host) in upstream.hosts.iter().enumerate() {
            let host_path = format!("{upstream_path}.hosts[{j}]");

            if host.url.is_empty() {
                errors.push(ValidationError::new(
                    format!("{host_path}.url"),
                    "url must be specified",
                ));
            }
            if host.provider.is_empty() {
                errors.push(ValidationError::new(
                    format!("{host_path}.provider"),
                    "provider must be specified",
                ));
            }

            validate_regions(&host.regions, &host_path, &mut errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors { errors })
    }
}

// An empty region *list* is legal (it means "any region"); empty region
// *strings* are not.
fn validate_regions(regions: &[String], parent_path: &str, errors: &mut Vec<ValidationError>) {
    for (k, region) in regions.iter().enumerate() {
        if region.is_empty() {
            errors.push(ValidationError::new(
                format!("{parent_path}.regions[{k}]"),
                "region must not be empty",
            ));
        }
    }
}
