use super::shell::{wrap_document, BASE_STYLESHEET};
use super::{decode_text, AdapterError, AdapterOutput, FormatAdapter};
use docpress_core::FileType;
use pulldown_cmark::{html, Options, Parser};

/// CommonMark with GitHub tables and strikethrough. Raw HTML in the source
/// is emitted as-is.
pub struct MarkdownAdapter;

impl MarkdownAdapter {
    fn options() -> Options {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options
    }
}

impl FormatAdapter for MarkdownAdapter {
    fn file_type(&self) -> FileType {
        FileType::Md
    }

    fn to_html(&self, raw: &[u8]) -> Result<AdapterOutput, AdapterError> {
        let (text, warnings) = decode_text(raw);

        let parser = Parser::new_ext(&text, Self::options());
        let mut body = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut body, parser);

        Ok(AdapterOutput {
            html: wrap_document(BASE_STYLESHEET, &body),
            warnings,
        })
    }
}
