//! Ordered matching of image references against overwrite rules.

use image_rewriter_config::{Configuration, ImageRef};
use indexmap::IndexMap;

use crate::region::RegionMap;

/// Compiled image overwrite rules.
///
/// Construction walks the declarative configuration once and indexes every
/// rule's targets by provider and region. Lookups are pure reads over the
/// resulting immutable state, so a compiled rule set can be shared across
/// concurrently dispatched requests without locking.
#[derive(Debug, Clone, Default)]
pub struct ImageRules {
    overwrites: Vec<Overwrite>,
}

/// One compiled rule: the source to match and its indexed targets.
#[derive(Debug, Clone)]
struct Overwrite {
    source: ImageRef,
    targets: IndexMap<String, RegionMap<ImageRef>>,
}

impl ImageRules {
    /// Compiles `config` into an indexed rule set, preserving rule
    /// declaration order.
    ///
    /// `config` is assumed to be validated; malformed rules are not
    /// detected here and simply never match.
    pub fn new(config: &Configuration) -> Self {
        let overwrites = config
            .overwrites
            .iter()
            .map(|overwrite| {
                let mut targets: IndexMap<String, RegionMap<ImageRef>> = IndexMap::new();

                for target in &overwrite.targets {
                    targets
                        .entry(target.provider.clone())
                        .or_default()
                        .insert(&target.regions, target.value.clone());
                }

                Overwrite {
                    source: overwrite.source.clone(),
                    targets,
                }
            })
            .collect();

        Self { overwrites }
    }

    /// Returns the replacement for `subject` on the given provider and
    /// region, or `None` if no rule applies. A hit that resolves to an
    /// empty value is also reported as `None`: consumers overwrite image
    /// fields with whatever this returns, and an empty replacement is
    /// never meaningful.
    ///
    /// Rules are evaluated in declaration order and the first rule producing
    /// a hit wins. A rule whose source matches `subject` but that carries no
    /// target for the provider and region does *not* terminate the search:
    /// a later rule with an overlapping source may still apply.
    pub fn find_target(&self, subject: &str, provider: &str, region: &str) -> Option<String> {
        for overwrite in &self.overwrites {
            let suffix = match &overwrite.source {
                ImageRef::Exact(source) => {
                    if source != subject {
                        continue;
                    }
                    ""
                }
                ImageRef::Prefix(source) => {
                    let Some(suffix) = subject.strip_prefix(source.as_str()) else {
                        continue;
                    };
                    suffix
                }
            };

            let Some(target) = overwrite
                .targets
                .get(provider)
                .and_then(|regions| regions.lookup(region))
            else {
                continue;
            };

            let target = match target {
                ImageRef::Exact(image) => image.clone(),
                ImageRef::Prefix(prefix) => format!("{prefix}{suffix}"),
            };

            // First hit wins, even when it resolves to the empty value.
            return (!target.is_empty()).then_some(target);
        }

        None
    }

    /// Whether any rule carries a target for `provider` and `region`,
    /// regardless of subject.
    ///
    /// This is a cluster-level existence check: it decides whether rewriting
    /// machinery should be installed for a cluster at all, not whether a
    /// particular image will be rewritten on it.
    pub fn has_overwrite(&self, provider: &str, region: &str) -> bool {
        self.overwrites.iter().any(|overwrite| {
            overwrite
                .targets
                .get(provider)
                .is_some_and(|regions| regions.lookup(region).is_some())
        })
    }
}

#[cfg(test)]
mod tests {
    use image_rewriter_config::Configuration;
    use pretty_assertions::assert_eq;

    use super::ImageRules;

    fn rules(yaml: &str) -> ImageRules {
        ImageRules::new(&Configuration::from_yaml(yaml).expect("valid configuration"))
    }

    const OVERWRITES: &str = r#"
overwrites:
  - source:
      image: registry.example.com/image:latest
    targets:
      - image: local-west/image-replacement:latest
        provider: local
        regions: [west]
      - image: local-east/image-replacement:latest
        provider: local
        regions: [east]
  - source:
      prefix: registry.example.com
    targets:
      - prefix: local2-west
        provider: local2
        regions: [west]
      - prefix: local2-east
        provider: local2
        regions: [east]
  - source:
      prefix: registry.example.com/global
    targets:
      - prefix: mirror.internal/global
        provider: global
"#;

    #[test]
    fn finds_exact_targets() {
        let rules = rules(OVERWRITES);

        for (region, expected) in [
            ("west", Some("local-west/image-replacement:latest")),
            ("east", Some("local-east/image-replacement:latest")),
            ("central", None),
        ] {
            assert_eq!(
                rules.find_target("registry.example.com/image:latest", "local", region),
                expected.map(String::from),
                "region: {region}"
            );
        }

        // Exact sources match only on full equality.
        assert_eq!(
            rules.find_target("registry.example.com/image", "local", "west"),
            None
        );
    }

    #[test]
    fn finds_prefix_targets_preserving_the_suffix() {
        let rules = rules(OVERWRITES);

        for (subject, region, expected) in [
            ("registry.example.com/foo:bar", "west", "local2-west/foo:bar"),
            ("registry.example.com/foo:bar", "east", "local2-east/foo:bar"),
            (
                "registry.example.com/foo@sha256:5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03",
                "west",
                "local2-west/foo@sha256:5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03",
            ),
        ] {
            assert_eq!(
                rules.find_target(subject, "local2", region),
                Some(expected.into()),
                "subject: {subject}"
            );
        }
    }

    #[test]
    fn unknown_providers_and_regions_miss() {
        let rules = rules(OVERWRITES);

        assert_eq!(
            rules.find_target("registry.example.com/image:latest", "local3", "west"),
            None
        );
        assert_eq!(
            rules.find_target("registry.example.com/foo:bar", "local2", "central"),
            None
        );
    }

    #[test]
    fn provider_miss_falls_through_to_later_rules() {
        let rules = rules(OVERWRITES);

        // The second rule's prefix also matches this subject, but it has no
        // target for provider `global`; the third rule still applies.
        assert_eq!(
            rules.find_target("registry.example.com/global/app:1.2.3", "global", "eu-1"),
            Some("mirror.internal/global/app:1.2.3".into())
        );
    }

    #[test]
    fn targets_without_regions_apply_to_any_region() {
        let rules = rules(OVERWRITES);

        for region in ["eu-1", "ap-2", "literally-anything"] {
            assert_eq!(
                rules.find_target("registry.example.com/global/app:v2", "global", region),
                Some("mirror.internal/global/app:v2".into()),
                "region: {region}"
            );
        }
    }

    #[test]
    fn explicit_region_wins_over_any_region_target() {
        let rules = rules(
            r#"
overwrites:
  - source:
      prefix: registry.example.com
    targets:
      - prefix: fallback.internal
        provider: local
      - prefix: west.internal
        provider: local
        regions: [west]
"#,
        );

        assert_eq!(
            rules.find_target("registry.example.com/app:v1", "local", "west"),
            Some("west.internal/app:v1".into())
        );
        assert_eq!(
            rules.find_target("registry.example.com/app:v1", "local", "east"),
            Some("fallback.internal/app:v1".into())
        );
    }

    #[test]
    fn first_matching_rule_wins() {
        let rules = rules(
            r#"
overwrites:
  - source:
      prefix: registry.example.com
    targets:
      - prefix: first.internal
        provider: local
        regions: [west]
  - source:
      prefix: registry.example.com
    targets:
      - prefix: second.internal
        provider: local
        regions: [west]
"#,
        );

        assert_eq!(
            rules.find_target("registry.example.com/app:v1", "local", "west"),
            Some("first.internal/app:v1".into())
        );
    }

    #[test]
    fn empty_target_values_resolve_to_none() {
        let rules = rules(
            r#"
overwrites:
  - source:
      image: registry.example.com/image:latest
    targets:
      - image: ""
        provider: local
        regions: [west]
  - source:
      image: registry.example.com/image:latest
    targets:
      - image: local-west/image-replacement:latest
        provider: local
        regions: [west]
"#,
        );

        // The first rule hits and resolves to the empty value, which is
        // "no match"; the later rule is not consulted.
        assert_eq!(
            rules.find_target("registry.example.com/image:latest", "local", "west"),
            None
        );
    }

    #[test]
    fn has_overwrite_is_subject_independent() {
        let rules = rules(OVERWRITES);

        for (provider, region, expected) in [
            ("local", "west", true),
            ("local", "east", true),
            ("local", "central", false),
            ("local2", "west", true),
            ("local2", "central", false),
            // Any-region targets cover every region of their provider.
            ("global", "eu-1", true),
            ("local3", "west", false),
        ] {
            assert_eq!(
                rules.has_overwrite(provider, region),
                expected,
                "provider: {provider}, region: {region}"
            );
        }
    }

    #[test]
    fn empty_configuration_never_matches() {
        let rules = ImageRules::new(&Configuration::default());

        assert_eq!(
            rules.find_target("registry.example.com/image:latest", "local", "west"),
            None
        );
        assert!(!rules.has_overwrite("local", "west"));
    }
}
