//! Path canonicalization shared by filters, the hybrid ranker's path-token
//! bonus, and the strategy-selector's path-like intent signal.

/// Canonicalizes path separators to `/`, the form filters and bonuses compare against.
pub fn canonicalize(path: &str) -> String {
    path.replace('\\', "/")
}

/// True if `path` (after canonicalization) starts with `prefix` (after
/// canonicalization) on a path-segment boundary.
pub fn starts_with_prefix(path: &str, prefix: &str) -> bool {
    let path = canonicalize(path);
    let mut prefix = canonicalize(prefix);
    if prefix.is_empty() {
        return true;
    }
    if !prefix.ends_with('/') {
        prefix.push('/');
    }
    let path_with_sep = if path.ends_with('/') {
        path.clone()
    } else {
        format!("{path}/")
    };
    path_with_sep.starts_with(prefix.as_str())
}

/// Splits a canonicalized path into its `/`-delimited segments, excluding
/// the file extension of the final segment.
pub fn path_segments_without_extension(path: &str) -> Vec<String> {
    let path = canonicalize(path);
    let mut segments: Vec<String> = path.split('/').filter(|s| !s.is_empty()).map(String::from).collect();
    if let Some(last) = segments.pop() {
        let stem = last.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(&last);
        segments.push(stem.to_string());
    }
    segments
}
