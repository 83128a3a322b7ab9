//! The HTML document every adapter hands to the renderer.

/// Stylesheet for converted Word documents: heading colours, highlighted
/// bold/italic spans and the bordered, zebra-striped `enhanced-table`.
pub const DOCUMENT_STYLESHEET: &str = r#"
body { font-family: Arial, Helvetica, sans-serif; color: #2c3e50; }
h1 { font-size: 28px; color: #2c3e50; margin-bottom: 20px; }
h2 { font-size: 24px; color: #34495e; margin-bottom: 16px; }
h3 { font-size: 20px; color: #7f8c8d; margin-bottom: 14px; }
p { line-height: 1.6; margin-bottom: 12px; }
strong { font-weight: bold; color: #e74c3c; }
em { font-style: italic; color: #3498db; }
mark { background-color: #fff3a8; }
.enhanced-table {
  border-collapse: collapse;
  width: 100%;
  margin: 20px 0;
  font-family: Arial, sans-serif;
  border: 2px solid #34495e;
}
.enhanced-table th {
  background-color: #34495e;
  color: white;
  font-weight: bold;
  padding: 12px 8px;
  text-align: left;
  border: 1px solid #2c3e50;
  font-size: 14px;
}
.enhanced-table td {
  padding: 10px 8px;
  border: 1px solid #bdc3c7;
  vertical-align: top;
  font-size: 13px;
  line-height: 1.4;
}
.enhanced-table tr:nth-child(even) { background-color: #f8f9fa; }
.enhanced-table p { margin: 0 0 8px 0; }
"#;

/// Plain print stylesheet for Markdown output and bare HTML fragments.
pub const BASE_STYLESHEET: &str = r#"
body { font-family: Arial, Helvetica, sans-serif; line-height: 1.6; color: #222; }
pre, code { font-family: "Courier New", monospace; background-color: #f4f4f4; }
pre { padding: 8px; white-space: pre-wrap; }
table { border-collapse: collapse; margin: 16px 0; }
th, td { border: 1px solid #bdc3c7; padding: 6px 8px; text-align: left; }
blockquote { border-left: 4px solid #bdc3c7; margin-left: 0; padding-left: 12px; color: #555; }
"#;

/// Wrap an HTML body fragment in a complete document with an inline stylesheet.
pub fn wrap_document(stylesheet: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        stylesheet, body
    )
}

/// Escape text for use in element content or a double-quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Byte offset of the first `<name` start tag in `html` (ASCII
/// case-insensitive). `<header` does not match `head`.
pub fn find_start_tag(html: &str, name: &str) -> Option<usize> {
    let lower = html.to_ascii_lowercase();
    let needle = format!("<{}", name.to_ascii_lowercase());
    lower.match_indices(&needle).map(|(idx, _)| idx).find(|idx| {
        matches!(
            lower.as_bytes().get(idx + needle.len()),
            None | Some(b'>') | Some(b'/') | Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n')
        )
    })
}
