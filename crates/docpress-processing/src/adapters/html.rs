use super::shell::{find_start_tag, wrap_document, BASE_STYLESHEET};
use super::{decode_text, AdapterError, AdapterOutput, FormatAdapter};
use docpress_core::FileType;

/// HTML input is rendered as uploaded. Fragments without an `<html>`
/// element get the document shell so the renderer always sees a full page.
pub struct HtmlAdapter;

impl FormatAdapter for HtmlAdapter {
    fn file_type(&self) -> FileType {
        FileType::Html
    }

    fn to_html(&self, raw: &[u8]) -> Result<AdapterOutput, AdapterError> {
        let (text, mut warnings) = decode_text(raw);

        if has_html_element(&text) {
            return Ok(AdapterOutput {
                html: text,
                warnings,
            });
        }

        warnings.push("HTML fragment wrapped in a document shell".to_string());
        Ok(AdapterOutput {
            html: wrap_document(BASE_STYLESHEET, &text),
            warnings,
        })
    }
}

/// Whether the text contains an `<html` start tag (case-insensitive).
pub fn has_html_element(text: &str) -> bool {
    find_start_tag(text, "html").is_some()
}
