//! Rewriting of image references embedded in free-form text.
//!
//! Node bootstrap files (unit files, shell scripts, kubelet configuration)
//! carry image references baked into otherwise opaque text. This module
//! locates every token shaped like an image reference and substitutes the
//! replacement the rule set resolves for it, leaving everything else
//! untouched.

use std::sync::LazyLock;

use regex::Regex;

use crate::rules::ImageRules;

/// Matches image-reference-shaped tokens in three forms:
///
/// 1. `path:tag`
/// 2. `path:tag@sha256:<64 hex>`
/// 3. `path@sha256:<64 hex>`
static IMAGE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)                                  # verbose mode
        \b
        [\w./-]+                                # image path
        :
        (?:
            [\w.-]+ @sha256: [a-fA-F0-9]{64}    # tag plus digest
            |
            [\w.-]+                             # tag alone
        )
        |
        [\w./-]+ @sha256: [a-fA-F0-9]{64} \b    # digest alone
        ",
    )
    .unwrap()
});

/// Replaces every embedded image reference for which `rules` resolves a
/// target on the given provider and region.
///
/// Returns the rewritten text, or `None` when no reference was replaced, so
/// callers can skip redundant writes. `content` must be decoded text;
/// transport encodings such as base64 are the caller's concern.
pub fn rewrite_image_references(
    content: &str,
    rules: &ImageRules,
    provider: &str,
    region: &str,
) -> Option<String> {
    let mut replaced = false;

    let rewritten = IMAGE_REFERENCE.replace_all(content, |captures: &regex::Captures<'_>| {
        let reference = &captures[0];

        match rules.find_target(reference, provider, region) {
            Some(target) => {
                tracing::debug!("rewriting image reference `{reference}` to `{target}`");
                replaced = true;
                target
            }
            None => reference.to_owned(),
        }
    });

    replaced.then(|| rewritten.into_owned())
}
