//! The `<!DOCTYPE html><html><body>` document shell around a stored fragment.

const SHELL_OPEN: &str = "<!DOCTYPE html><html><body>";
const SHELL_CLOSE: &str = "</body></html>";

/// Wrap a body fragment in the document shell.
///
/// Input that already contains an `<html` tag (any case) is returned as-is.
pub fn wrap_document(fragment: &str) -> String {
    if has_html_tag(fragment) {
        return fragment.to_string();
    }
    let mut out = String::with_capacity(SHELL_OPEN.len() + fragment.len() + SHELL_CLOSE.len());
    out.push_str(SHELL_OPEN);
    out.push_str(fragment);
    out.push_str(SHELL_CLOSE);
    out
}

/// Extract the inner content of `<body ...>`.
///
/// Anything without a recognisable body tag is treated as a bare fragment and
/// returned unchanged. A missing `</body>` takes everything to the end.
pub fn unwrap_document(document: &str) -> &str {
    let lower = document.to_ascii_lowercase();
    let Some(open) = find_body_open(&lower) else {
        return document;
    };
    let Some(tag_end) = lower[open..].find('>').map(|i| open + i + 1) else {
        return document;
    };
    let close = lower.rfind("</body").filter(|&c| c >= tag_end).unwrap_or(document.len());
    &document[tag_end..close]
}

/// Whether the input looks like a full document rather than a fragment.
pub fn has_html_tag(input: &str) -> bool {
    input.to_ascii_lowercase().contains("<html")
}

/// First `<body` that is a whole tag name, not a prefix of e.g. `<bodyx`.
fn find_body_open(lower: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(i) = lower[from..].find("<body") {
        let at = from + i;
        match lower.as_bytes().get(at + 5) {
            None | Some(b'>' | b'/' | b' ' | b'\t' | b'\n' | b'\r' | b'\x0c') => return Some(at),
            _ => from = at + 5,
        }
    }
    None
}
