//! Provider- and region-aware rewriting of container image references and
//! registry mirror configuration.
//!
//! This crate answers one question for mutating collaborators (admission
//! webhooks, node bootstrap handlers): *given a cluster's infrastructure
//! provider and region, what replacement applies?* It has four parts:
//!
//! - [`rules::ImageRules`]: ordered matching of image references against
//!   overwrite rules, exact or by prefix.
//! - [`rewrite::rewrite_image_references`]: in-place rewriting of image
//!   references embedded in free-form text.
//! - [`containerd::MirrorRules`]: resolution of registry mirrors for
//!   containerd, where every matching upstream contributes a result.
//! - [`containerd::RegistryMirror`]: rendering of the `hosts.toml` drop-in
//!   files containerd consumes.
//!
//! Rule sets are compiled once from a validated
//! [`Configuration`](image_rewriter_config::Configuration) and are immutable
//! afterwards, so they can be queried concurrently without locking. If
//! configuration ever needs to change at runtime, build a fresh rule set and
//! swap it in atomically as a whole; never mutate one in place.
//!
//! ```
//! use image_rewriter::rules::ImageRules;
//! use image_rewriter_config::Configuration;
//!
//! let config = Configuration::from_yaml(
//!     r#"
//! overwrites:
//!   - source:
//!       prefix: registry.example.com
//!     targets:
//!       - prefix: mirror.internal
//!         provider: metal
//!         regions: [eu-1]
//! "#,
//! )
//! .unwrap();
//!
//! let rules = ImageRules::new(&config);
//! assert_eq!(
//!     rules.find_target("registry.example.com/app:v1", "metal", "eu-1"),
//!     Some("mirror.internal/app:v1".into())
//! );
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod containerd;
mod region;
pub mod rewrite;
pub mod rules;
