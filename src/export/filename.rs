use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

const MAX_STEM_CHARS: usize = 120;

// Invalid on Windows: < > : " / \ | ? * and control characters (0-31)
static INVALID_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1F]"#).expect("invalid-chars pattern"));

static RESERVED_NAMES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(CON|PRN|AUX|NUL|COM[1-9]|LPT[1-9])$").expect("reserved-names pattern")
});

/// Turn a document file name into something safe to prefix exported files with.
///
/// Drops the directory part and the extension, replaces characters that are
/// invalid on Windows, macOS or Linux, and falls back to `document`.
pub fn sanitize_stem(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let sanitized = INVALID_CHARS.replace_all(&stem, "_");
    // Leading/trailing dots and spaces misbehave on Windows
    let sanitized = sanitized.trim_matches(|c| c == ' ' || c == '.');

    if RESERVED_NAMES.is_match(sanitized) {
        return format!("_{sanitized}");
    }

    let sanitized: String = sanitized.chars().take(MAX_STEM_CHARS).collect();
    if sanitized.is_empty() {
        "document".to_string()
    } else {
        sanitized
    }
}

/// `<stem>-page-NNN.png` for a 1-indexed page
pub fn page_file_name(stem: &str, page: usize) -> String {
    format!("{stem}-page-{page:03}.png")
}
