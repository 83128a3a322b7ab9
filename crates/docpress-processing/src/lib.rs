//! Document processing for docpress: upload validation, format adapters
//! that turn HTML/Markdown/DOCX into a self-contained HTML document, and the
//! headless-browser renderer pool that prints that document to PDF.

pub mod adapters;
pub mod renderer;
pub mod validator;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use adapters::{convert_to_html, render_html, AdapterError, AdapterOutput, FormatAdapter};
#[cfg(feature = "chrome")]
pub use renderer::ChromeBrowserFactory;
pub use renderer::{
    BrowserFactory, PdfOptions, PoolStats, RenderEngine, RenderError, RendererPool,
};
pub use validator::{UploadValidator, ValidationError};
