//! Asset discovery and markup rewriting.
//!
//! Parses a page once, collects every same-origin `img`, `script` and
//! `link` reference into a download plan, and rewrites those references to
//! the local paths the mirroring run will create. Discovery and mutation
//! are separate passes over the same tree: the first pass only records
//! which node gets which new attribute value, the second applies the
//! recorded edits and serializes.

use std::path::{Path, PathBuf};

use scraper::{node::Node, Html, Selector};
use url::Url;

use crate::naming;

/// Tag/attribute pairs that carry downloadable references, in scan order.
const SUPPORTED_TAGS: [(&str, &str); 3] = [("img", "src"), ("script", "src"), ("link", "href")];

/// A discovered asset: where it lives remotely and where it will be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub remote_url: Url,
    pub local_path: PathBuf,
}

/// Result of rewriting a page: the new markup and the download plan.
#[derive(Debug, Clone)]
pub struct RewrittenPage {
    pub html: String,
    pub resources: Vec<ResourceRef>,
}

/// Extract same-origin asset references from `html` and rewrite them to
/// local relative paths.
///
/// Each distinct asset URL appears once in the returned plan, in the order
/// tags are scanned (`img`, then `script`, then `link`, document order
/// within each). Every occurrence in the markup is rewritten, including
/// repeats of an already-planned URL. References on another host are left
/// untouched, as are data URIs and values that fail to resolve.
pub fn extract(page_url: &Url, html: &str, output_dir: &Path) -> RewrittenPage {
    let mut document = Html::parse_document(html);
    let dir_name = naming::resources_dir_name(page_url);
    let assets_dir = output_dir.join(&dir_name);

    let mut resources = Vec::new();
    let mut edits: Vec<(_, &str, String)> = Vec::new();

    for (tag, attr) in SUPPORTED_TAGS {
        let selector = Selector::parse(tag).unwrap();
        for element in document.select(&selector) {
            let Some(raw) = element.value().attr(attr) else {
                continue;
            };
            let Some(remote_url) = resolve_candidate(page_url, raw) else {
                continue;
            };

            let file_name = naming::resource_filename(&remote_url);
            edits.push((element.id(), attr, format!("{}/{}", dir_name, file_name)));

            if !resources.iter().any(|r: &ResourceRef| r.remote_url == remote_url) {
                resources.push(ResourceRef {
                    remote_url,
                    local_path: assets_dir.join(file_name),
                });
            }
        }
    }

    for (node_id, attr, value) in edits {
        let Some(mut node) = document.tree.get_mut(node_id) else {
            continue;
        };
        let Node::Element(element) = node.value() else {
            continue;
        };
        if let Some((_, current)) = element
            .attrs
            .iter_mut()
            .find(|(name, _)| *name.local == *attr)
        {
            *current = value.as_str().into();
        }
    }

    RewrittenPage {
        html: document.html(),
        resources,
    }
}

/// Resolve a raw attribute value against the page URL, keeping only
/// same-origin candidates.
fn resolve_candidate(page_url: &Url, raw: &str) -> Option<Url> {
    if raw.is_empty() || raw.contains("base64") {
        return None;
    }

    let resolved = match Url::parse(raw) {
        Ok(absolute) => absolute,
        Err(_) => page_url.join(raw).ok()?,
    };

    same_host(page_url, &resolved).then_some(resolved)
}

/// Two URLs share an origin when host and explicit port match.
fn same_host(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str() && a.port() == b.port()
}
