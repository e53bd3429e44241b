//! Request path normalization.

use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Clean a URL path: leading slash, no empty or `.` segments, `..` resolved,
/// no trailing slash except for the root.
pub fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Percent-decode a path. Invalid UTF-8 sequences are replaced.
pub fn decode_path(path: &str) -> String {
    percent_decode_str(path).decode_utf8_lossy().into_owned()
}

/// Normalize a raw request target into the pathname used for routing.
///
/// The query string is stripped before anything else.
pub fn normalize(raw: &str) -> String {
    let path = raw.split(|c| c == '?' || c == '#').next().unwrap_or_default();
    clean_path(&decode_path(path))
}

/// Join a normalized pathname onto `root`, refusing anything that would
/// escape it.
pub fn join_under(root: &Path, pathname: &str) -> Option<PathBuf> {
    let relative = Path::new(pathname.trim_start_matches('/'));
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(root.join(relative))
}

/// `"/foo@bar"` → `("/foo", "bar")`; no separator yields an empty second half.
pub fn split_by<'a>(s: &'a str, sep: char) -> (&'a str, &'a str) {
    s.split_once(sep).unwrap_or((s, ""))
}
