//! Markdown image reference rewriting.
//!
//! The service refers to each extracted image with a self-referencing link,
//! `![img-0.jpeg](img-0.jpeg)`. Once the image is on disk that link has to
//! point at the written file instead. This is a literal text substitution,
//! not a markdown parse: only the exact `![id](id)` form is touched.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// The literal reference the service emits for image `id`.
pub fn image_reference(id: &str) -> String {
    format!("![{id}]({id})")
}

/// Replace every `![id](id)` with `![id](target)` for each `(id, target)`.
///
/// Ids without a mapping, and links whose alt text differs from their
/// target, are left as they are.
pub fn replace_image_refs(markdown: &str, targets: &BTreeMap<String, String>) -> String {
    let mut out = markdown.to_string();
    for (id, target) in targets {
        out = out.replace(&image_reference(id), &format!("![{id}]({target})"));
    }
    out
}

static RE_IMAGE_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[([^\]\n]*)\]\(([^)\s]*)\)").unwrap());

/// Ids of self-referencing image links (`![x](x)`) still present in
/// `markdown`, in order of appearance, deduplicated.
///
/// After rewriting, anything listed here points at an image the service
/// never returned.
pub fn unresolved_image_refs(markdown: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for caps in RE_IMAGE_LINK.captures_iter(markdown) {
        let (alt, target) = (&caps[1], &caps[2]);
        if !alt.is_empty() && alt == target && !ids.iter().any(|i| i == alt) {
            ids.push(alt.to_string());
        }
    }
    ids
}
