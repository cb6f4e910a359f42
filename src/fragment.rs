use std::io::ErrorKind;
use std::path::Path;

use regex::Regex;

use crate::error::{DashError, Result};

/// Read the companion HTML fragment shown in the "From HTML" tab.
///
/// A missing file is reported as `MissingResource` so the caller can show a
/// message in that one panel and carry on.
pub fn load_fragment(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(html) => Ok(html),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(DashError::MissingResource {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            path: path.display().to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Reduce an HTML fragment to plain text lines for the terminal.
pub fn html_to_text(html: &str) -> Result<String> {
    let hidden = Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>")?;
    let breaks = Regex::new(r"(?i)<br\s*/?>|</(p|div|h[1-6]|li|tr|ul|ol|table)>")?;
    let bullets = Regex::new(r"(?i)<li[^>]*>")?;
    let tags = Regex::new(r"<[^>]+>")?;
    let blank_runs = Regex::new(r"\n{3,}")?;

    let text = hidden.replace_all(html, "");
    let text = breaks.replace_all(&text, "\n");
    let text = bullets.replace_all(&text, "\u{2022} ");
    let text = tags.replace_all(&text, "");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let joined = lines.join("\n");
    Ok(blank_runs.replace_all(joined.trim(), "\n\n").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fragment_is_missing_resource() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_fragment(&dir.path().join("partial.html")).unwrap_err();
        match err {
            DashError::MissingResource { name, .. } => assert_eq!(name, "partial.html"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_fragment_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.html");
        std::fs::write(&path, "<h1>Hello</h1>").unwrap();
        assert_eq!(load_fragment(&path).unwrap(), "<h1>Hello</h1>");
    }

    #[test]
    fn test_html_to_text() {
        let html = "<style>h1 { color: red }</style><h1>Q1 Notes</h1>\
                    <p>Sales &amp; returns</p><ul><li>North up</li><li>West flat</li></ul>";
        let text = html_to_text(html).unwrap();
        assert_eq!(text, "Q1 Notes\nSales & returns\n\u{2022} North up\n\u{2022} West flat");
    }
}
