//! URL to filesystem-safe name derivation.
//!
//! Every file a mirroring run writes gets its name from the URL it came
//! from: host plus path, collapsed to alphanumerics and dashes, with the
//! original extension chain kept verbatim. The mapping is pure and
//! deterministic so repeated runs land on the same files.

use url::Url;

/// Derive a filesystem-safe name from a URL.
///
/// The name is built from host and path (query and fragment are dropped,
/// an explicit port stays part of the host). The last path segment is split
/// at its first `.` into stem and extension chain; every run of
/// non-alphanumeric characters in the stem becomes a single `-`. A URL
/// without an extension gets `default_extension` appended as-is.
pub fn derive_filename(url: &Url, default_extension: &str) -> String {
    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };

    let path = url.path();
    let last_segment_start = path.rfind('/').map_or(0, |i| i + 1);
    let (path_stem, extension_chain) = match path[last_segment_start..].find('.') {
        Some(dot) => {
            let split = last_segment_start + dot;
            (&path[..split], Some(&path[split + 1..]))
        }
        None => (path, None),
    };

    let combined = format!("{}{}", host, path_stem);
    let stem = sanitize_stem(combined.trim_matches('/'));

    match extension_chain {
        Some(extension) => format!("{}.{}", stem, extension),
        None => format!("{}{}", stem, default_extension),
    }
}

/// File name for the saved page itself.
pub fn page_filename(page_url: &Url) -> String {
    derive_filename(page_url, ".html")
}

/// Directory name holding the page's downloaded assets.
pub fn resources_dir_name(page_url: &Url) -> String {
    format!("{}_files", derive_filename(page_url, ""))
}

/// File name for a downloaded asset.
pub fn resource_filename(resource_url: &Url) -> String {
    derive_filename(resource_url, ".html")
}

/// Collapse every run of non-alphanumeric characters into a single `-`.
fn sanitize_stem(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_dash = false;

    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash {
                out.push('-');
                pending_dash = false;
            }
            out.push(ch);
        } else {
            pending_dash = true;
        }
    }
    if pending_dash {
        out.push('-');
    }

    out
}
