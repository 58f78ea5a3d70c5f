//! Project name normalization and artifact filename matching.

/// Source distribution suffixes, longest first so `.tar.gz` wins over `.gz`-like tails.
const SDIST_SUFFIXES: &[&str] = &[".tar.gz", ".tar.bz2", ".tar.xz", ".tgz", ".tar", ".zip"];

/// PEP 503 normalized name: lowercase, runs of `-`, `_`, `.` collapsed to `-`.
pub fn canonicalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                out.push('-');
            }
            in_separator = true;
        } else {
            out.extend(c.to_lowercase());
            in_separator = false;
        }
    }
    out
}

fn same_version(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// True when `filename` is a wheel or sdist of exactly `name` at `version`.
pub fn matches_release(filename: &str, name: &str, version: &str) -> bool {
    let canonical = canonicalize_name(name);

    if let Some(stem) = filename.strip_suffix(".whl") {
        // {name}-{version}(-{build})?-{python}-{abi}-{platform}; name has `_` for separators.
        let mut parts = stem.split('-');
        let (Some(wheel_name), Some(wheel_version)) = (parts.next(), parts.next()) else {
            return false;
        };
        return canonicalize_name(wheel_name) == canonical && same_version(wheel_version, version);
    }

    let Some(stem) = SDIST_SUFFIXES
        .iter()
        .find_map(|suffix| strip_suffix_ignore_case(filename, suffix))
    else {
        return false;
    };
    // The name itself may contain `-`, so try every split point.
    stem.match_indices('-').any(|(i, _)| {
        canonicalize_name(&stem[..i]) == canonical && same_version(&stem[i + 1..], version)
    })
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    if s.len() < suffix.len() || !s.is_char_boundary(s.len() - suffix.len()) {
        return None;
    }
    let (stem, tail) = s.split_at(s.len() - suffix.len());
    tail.eq_ignore_ascii_case(suffix).then_some(stem)
}
