use super::{BrowserFactory, PdfOptions, RenderEngine, RenderError};
use docpress_core::RendererSettings;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const CHROME_ARGS: [&str; 2] = ["--disable-dev-shm-usage", "--disable-gpu"];

/// How long an idle pooled browser keeps its CDP connection open.
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(30 * 60);

const READY_STATE_POLL: Duration = Duration::from_millis(50);

/// Launches headless Chrome/Chromium through `headless_chrome`.
#[derive(Debug, Clone)]
pub struct ChromeBrowserFactory {
    chrome_path: Option<PathBuf>,
    sandbox: bool,
}

impl ChromeBrowserFactory {
    /// `chrome_path: None` lets `headless_chrome` locate the binary.
    pub fn new(chrome_path: Option<PathBuf>, sandbox: bool) -> Self {
        Self {
            chrome_path,
            sandbox,
        }
    }

    pub fn from_settings(settings: &RendererSettings) -> Self {
        Self::new(settings.chrome_path.clone(), settings.sandbox)
    }
}

impl BrowserFactory for ChromeBrowserFactory {
    fn launch(&self) -> Result<Box<dyn RenderEngine>, RenderError> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(self.sandbox)
            .path(self.chrome_path.clone())
            .idle_browser_timeout(IDLE_BROWSER_TIMEOUT)
            .args(CHROME_ARGS.iter().map(OsStr::new).collect())
            .build()
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        let browser = Browser::new(options).map_err(|e| RenderError::Launch(e.to_string()))?;
        Ok(Box::new(ChromeEngine { browser }))
    }

    fn name(&self) -> &'static str {
        "chrome"
    }
}

struct ChromeEngine {
    browser: Browser,
}

impl ChromeEngine {
    fn engine_error(start: Instant, deadline: Duration, err: impl std::fmt::Display) -> RenderError {
        if start.elapsed() >= deadline {
            RenderError::Timeout(deadline)
        } else {
            RenderError::Engine(err.to_string())
        }
    }
}

impl RenderEngine for ChromeEngine {
    fn render_pdf(
        &mut self,
        page: &Path,
        options: &PdfOptions,
        deadline: Duration,
    ) -> Result<Vec<u8>, RenderError> {
        let start = Instant::now();
        let fail = |e: anyhow::Error| Self::engine_error(start, deadline, e);

        let tab = self.browser.new_tab().map_err(&fail)?;
        tab.set_default_timeout(deadline);

        let url = format!("file://{}", page.display());
        let rendered = (|| -> anyhow::Result<Option<Vec<u8>>> {
            tab.navigate_to(&url)?.wait_until_navigated()?;

            loop {
                let ready = tab.evaluate("document.readyState", false)?;
                if ready.value.as_ref().and_then(|v| v.as_str()) == Some("complete") {
                    break;
                }
                if start.elapsed() >= deadline {
                    return Ok(None);
                }
                std::thread::sleep(READY_STATE_POLL);
            }

            let pdf = tab.print_to_pdf(Some(PrintToPdfOptions {
                print_background: Some(options.print_background),
                paper_width: Some(options.paper_width),
                paper_height: Some(options.paper_height),
                margin_top: Some(options.margin),
                margin_bottom: Some(options.margin),
                margin_left: Some(options.margin),
                margin_right: Some(options.margin),
                ..Default::default()
            }))?;
            Ok(Some(pdf))
        })();

        if let Err(e) = tab.close(false) {
            tracing::debug!(error = %e, "Failed to close tab");
        }

        match rendered.map_err(fail)? {
            Some(pdf) => Ok(pdf),
            None => Err(RenderError::Timeout(deadline)),
        }
    }

    fn is_healthy(&self) -> bool {
        self.browser.get_version().is_ok()
    }
}

#[cfg(test)]
mod tests {
    //! Run with `CHROME_PATH=/path/to/chrome cargo test -p docpress-processing -- --ignored`.

    use super::*;
    use crate::renderer::RendererPool;
    use docpress_core::RenderPoolMode;
    use std::sync::Arc;

    fn factory() -> ChromeBrowserFactory {
        ChromeBrowserFactory::new(std::env::var_os("CHROME_PATH").map(PathBuf::from), false)
    }

    #[tokio::test]
    #[ignore = "requires a Chrome binary"]
    async fn test_renders_a4_pdf() {
        let pool = RendererPool::new(
            Arc::new(factory()),
            RenderPoolMode::OneShot,
            Duration::from_secs(60),
            0,
        );

        let pdf = pool
            .render("<html><body><h1>Title</h1><p>Hello</p></body></html>")
            .await
            .unwrap();

        assert!(pdf.starts_with(b"%PDF"));
        assert_eq!(pool.stats().discarded, 1);
    }

    #[tokio::test]
    #[ignore = "requires a Chrome binary"]
    async fn test_pooled_browser_stays_healthy() {
        let pool = RendererPool::new(
            Arc::new(factory()),
            RenderPoolMode::Pooled { max_idle: 1 },
            Duration::from_secs(60),
            0,
        );

        pool.render("<p>one</p>").await.unwrap();
        pool.render("<p>two</p>").await.unwrap();
        assert_eq!(pool.stats().created, 1);
        pool.shutdown();
    }
}
