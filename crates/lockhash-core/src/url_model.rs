//! Artifact filenames and fragment handling for index links.

/// Extracts the last path segment of a URL, percent-decoded, as the artifact filename.
///
/// Returns `None` if the URL cannot be parsed or the path is empty/root.
pub fn filename_from_url_path(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path().split('/').filter(|s| !s.is_empty()).last()?;
    if segment == "." || segment == ".." {
        return None;
    }
    let decoded = urlencoding::decode_binary(segment.as_bytes());
    Some(String::from_utf8_lossy(&decoded).into_owned())
}

/// Drops the `#...` part of a URL (indexes put `#sha256=...` or `#md5=...` there).
pub fn without_fragment(url: &str) -> &str {
    match url.find('#') {
        Some(i) => &url[..i],
        None => url,
    }
}
