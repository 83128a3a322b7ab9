//! Test fixtures: small documents in each supported format.

pub use docpress_processing::testing::sample_docx_with_table;

pub const SAMPLE_MARKDOWN: &str = "# Title\n\nHello";

pub const SAMPLE_HTML: &str =
    "<!DOCTYPE html><html><head><title>t</title></head><body><h1>Hello</h1></body></html>";
