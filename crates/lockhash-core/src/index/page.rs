//! Extract `href` targets of `<a>` tags from a simple-repository HTML page.
//!
//! Simple index pages are flat lists of anchors, so a quote-aware tag scanner is
//! enough; no full HTML parsing is attempted.

/// Returns the raw `href` values of all anchors, in page order, entity-decoded.
pub(crate) fn anchor_hrefs(html: &str) -> Vec<String> {
    let lower = html.to_ascii_lowercase();
    let mut hrefs = Vec::new();
    let mut pos = 0;

    while let Some(found) = lower[pos..].find("<a") {
        let after_name = pos + found + 2;
        // `<abbr>`, `<area>` etc. are not anchors.
        let is_anchor = lower[after_name..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_whitespace() || c == '>' || c == '/');
        if !is_anchor {
            pos = after_name;
            continue;
        }
        let (attrs, consumed) = attributes(&html[after_name..]);
        if let Some((_, value)) = attrs
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("href"))
        {
            hrefs.push(decode_entities(value));
        }
        pos = after_name + consumed;
    }
    hrefs
}

/// Splits the text after a tag name into `(name, value)` pairs up to the closing `>`.
/// A `>` inside a quoted value does not end the tag. Also returns the number of bytes
/// consumed, closing `>` included.
fn attributes(tag: &str) -> (Vec<(&str, &str)>, usize) {
    let bytes = tag.as_bytes();
    let skip_ws = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        i
    };
    let mut attrs = Vec::new();
    let mut i = 0;

    loop {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        match bytes.get(i) {
            None => return (attrs, bytes.len()),
            Some(b'>') => return (attrs, i + 1),
            Some(_) => {}
        }

        let name_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>' | b'/')
        {
            i += 1;
        }
        let name = &tag[name_start..i];

        i = skip_ws(i);
        if bytes.get(i) != Some(&b'=') {
            attrs.push((name, ""));
            continue;
        }
        i = skip_ws(i + 1);

        let value = match bytes.get(i) {
            Some(&quote @ (b'"' | b'\'')) => {
                let start = i + 1;
                let end = tag[start..]
                    .find(quote as char)
                    .map_or(tag.len(), |e| start + e);
                i = (end + 1).min(tag.len());
                &tag[start..end]
            }
            _ => {
                let start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                    i += 1;
                }
                &tag[start..i]
            }
        };
        attrs.push((name, value));
    }
}

fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}
