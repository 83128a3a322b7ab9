//! HTML to PDF through a headless browser.
//!
//! Engines are synchronous (CDP over a websocket) and are driven from the
//! blocking pool. [`RendererPool`] owns launch, reuse and teardown; callers
//! only see [`RendererPool::render`].

#[cfg(feature = "chrome")]
mod chrome;
mod pool;

#[cfg(feature = "chrome")]
pub use chrome::ChromeBrowserFactory;
pub use pool::{Lease, PoolStats, RendererPool};

use crate::adapters::shell::find_start_tag;
use docpress_core::AppError;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Render timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Browser error: {0}")]
    Engine(String),

    #[error("Renderer produced an empty document")]
    EmptyOutput,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Render task failed: {0}")]
    Task(String),
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Timeout(limit) => AppError::RenderTimeout(limit.as_secs()),
            other => AppError::RenderFailure(other.to_string()),
        }
    }
}

/// Page setup for the printed PDF. Dimensions are in inches, as CDP expects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfOptions {
    pub paper_width: f64,
    pub paper_height: f64,
    pub margin: f64,
    pub print_background: bool,
}

impl PdfOptions {
    const MM_PER_INCH: f64 = 25.4;

    /// A4 with 20 mm margins on every side and background graphics on.
    pub fn a4() -> Self {
        Self {
            paper_width: 210.0 / Self::MM_PER_INCH,
            paper_height: 297.0 / Self::MM_PER_INCH,
            margin: 20.0 / Self::MM_PER_INCH,
            print_background: true,
        }
    }
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self::a4()
    }
}

/// One live browser instance.
pub trait RenderEngine: Send {
    /// Load the HTML file at `page`, wait until the document is complete and
    /// print it. Must give up once `deadline` has elapsed.
    fn render_pdf(
        &mut self,
        page: &Path,
        options: &PdfOptions,
        deadline: Duration,
    ) -> Result<Vec<u8>, RenderError>;

    /// Whether the instance can serve another render.
    fn is_healthy(&self) -> bool;
}

/// Launches engines for the pool.
pub trait BrowserFactory: Send + Sync {
    fn launch(&self) -> Result<Box<dyn RenderEngine>, RenderError>;

    fn name(&self) -> &'static str;
}

/// Blocks image, font and external stylesheet fetches for the page. Inline
/// `<style>` and `style=` attributes still apply.
const FETCH_POLICY_META: &str = "<meta http-equiv=\"Content-Security-Policy\" \
     content=\"img-src 'none'; font-src 'none'; style-src 'unsafe-inline'\">";

/// Insert the fetch policy as the first element of `<head>`, creating the
/// head when the document has none.
pub fn apply_fetch_policy(html: &str) -> String {
    let insert_after_tag = |start: usize| -> Option<usize> {
        html[start..].find('>').map(|end| start + end + 1)
    };

    if let Some(at) = find_start_tag(html, "head").and_then(insert_after_tag) {
        return format!("{}{}{}", &html[..at], FETCH_POLICY_META, &html[at..]);
    }
    if let Some(at) = find_start_tag(html, "html").and_then(insert_after_tag) {
        return format!(
            "{}<head>{}</head>{}",
            &html[..at],
            FETCH_POLICY_META,
            &html[at..]
        );
    }
    format!("{}{}", FETCH_POLICY_META, html)
}
