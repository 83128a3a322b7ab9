use super::{apply_fetch_policy, BrowserFactory, PdfOptions, RenderEngine, RenderError};
use bytes::Bytes;
use docpress_core::{RenderPoolMode, RendererSettings};
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Point-in-time counters for the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Warm engines waiting in the idle set
    pub idle: usize,
    /// Renders currently holding an engine
    pub in_use: usize,
    /// Engines launched since startup
    pub created: u64,
    /// Engines torn down since startup
    pub discarded: u64,
}

/// An engine checked out of the pool. Hand it back with
/// [`RendererPool::release`]; dropping it tears the engine down.
pub struct Lease {
    engine: Box<dyn RenderEngine>,
}

impl Lease {
    pub fn engine(&mut self) -> &mut dyn RenderEngine {
        self.engine.as_mut()
    }
}

struct PoolInner {
    factory: Arc<dyn BrowserFactory>,
    mode: RenderPoolMode,
    timeout: Duration,
    options: PdfOptions,
    idle: Mutex<Vec<Box<dyn RenderEngine>>>,
    permits: Option<Arc<Semaphore>>,
    created: AtomicU64,
    discarded: AtomicU64,
    in_use: AtomicUsize,
}

/// Headless browser pool.
///
/// In one-shot mode every lease launches a fresh engine that is torn down
/// when released. In pooled mode engines that finished a render cleanly
/// and still report healthy go back to a bounded idle set.
#[derive(Clone)]
pub struct RendererPool {
    inner: Arc<PoolInner>,
}

impl RendererPool {
    /// `max_concurrent == 0` leaves renders unbounded.
    pub fn new(
        factory: Arc<dyn BrowserFactory>,
        mode: RenderPoolMode,
        timeout: Duration,
        max_concurrent: usize,
    ) -> Self {
        let permits = (max_concurrent > 0).then(|| Arc::new(Semaphore::new(max_concurrent)));

        tracing::info!(
            factory = factory.name(),
            mode = %mode,
            timeout_secs = timeout.as_secs(),
            max_concurrent = max_concurrent,
            "Renderer pool initialized"
        );

        Self {
            inner: Arc::new(PoolInner {
                factory,
                mode,
                timeout,
                options: PdfOptions::a4(),
                idle: Mutex::new(Vec::new()),
                permits,
                created: AtomicU64::new(0),
                discarded: AtomicU64::new(0),
                in_use: AtomicUsize::new(0),
            }),
        }
    }

    pub fn from_settings(factory: Arc<dyn BrowserFactory>, settings: &RendererSettings) -> Self {
        Self::new(
            factory,
            settings.pool_mode,
            Duration::from_secs(settings.timeout_seconds),
            settings.max_concurrent,
        )
    }

    pub fn mode(&self) -> RenderPoolMode {
        self.inner.mode
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    fn idle(&self) -> MutexGuard<'_, Vec<Box<dyn RenderEngine>>> {
        // A panic while holding the lock leaves the Vec itself intact.
        self.inner
            .idle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn discard(&self, engine: Box<dyn RenderEngine>) {
        self.inner.discarded.fetch_add(1, Ordering::Relaxed);
        drop(engine);
    }

    /// Check out a warm engine, or launch one. Blocking.
    pub fn acquire(&self) -> Result<Lease, RenderError> {
        loop {
            let candidate = self.idle().pop();
            let Some(engine) = candidate else {
                break;
            };
            if engine.is_healthy() {
                self.inner.in_use.fetch_add(1, Ordering::Relaxed);
                return Ok(Lease { engine });
            }
            tracing::debug!("Discarding unhealthy idle browser");
            self.discard(engine);
        }

        let start = Instant::now();
        let engine = self.inner.factory.launch()?;
        self.inner.created.fetch_add(1, Ordering::Relaxed);
        self.inner.in_use.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            factory = self.inner.factory.name(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Browser launched"
        );

        Ok(Lease { engine })
    }

    /// Return a lease. `reusable` is false when the render failed or was
    /// abandoned; such engines are always torn down.
    pub fn release(&self, lease: Lease, reusable: bool) {
        self.inner.in_use.fetch_sub(1, Ordering::Relaxed);
        let engine = lease.engine;

        if let RenderPoolMode::Pooled { max_idle } = self.inner.mode {
            if reusable && engine.is_healthy() {
                let mut idle = self.idle();
                if idle.len() < max_idle {
                    idle.push(engine);
                    return;
                }
            }
        }

        self.discard(engine);
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            idle: self.idle().len(),
            in_use: self.inner.in_use.load(Ordering::Relaxed),
            created: self.inner.created.load(Ordering::Relaxed),
            discarded: self.inner.discarded.load(Ordering::Relaxed),
        }
    }

    /// Tear down every idle engine.
    pub fn shutdown(&self) {
        let drained: Vec<_> = self.idle().drain(..).collect();
        let count = drained.len();
        for engine in drained {
            self.discard(engine);
        }
        tracing::info!(closed = count, "Renderer pool shut down");
    }

    /// Render a complete HTML document to PDF bytes.
    ///
    /// The whole attempt (launch, load, print) is bounded by the pool
    /// timeout. On timeout the blocking task is left to hit the engine's own
    /// deadline and its engine is discarded rather than returned. The
    /// concurrency permit travels with the blocking task, so an abandoned
    /// render keeps its slot until the engine actually stops.
    pub async fn render(&self, html: &str) -> Result<Bytes, RenderError> {
        let permit = match &self.inner.permits {
            Some(permits) => Some(
                permits
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|e| RenderError::Task(e.to_string()))?,
            ),
            None => None,
        };

        let timeout = self.inner.timeout;
        let page_html = apply_fetch_policy(html);
        let abandoned = Arc::new(AtomicBool::new(false));

        let pool = self.clone();
        let abandoned_flag = abandoned.clone();
        let task = tokio::task::spawn_blocking(move || {
            let page = write_page(&page_html)?;
            let mut lease = pool.acquire()?;
            let result = lease
                .engine()
                .render_pdf(page.path(), &pool.inner.options, timeout);
            let reusable = result.is_ok() && !abandoned_flag.load(Ordering::SeqCst);
            pool.release(lease, reusable);
            drop(permit);
            result
        });

        let start = Instant::now();
        let pdf = match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(join_error)) => return Err(RenderError::Task(join_error.to_string())),
            Err(_) => {
                abandoned.store(true, Ordering::SeqCst);
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    "Render exceeded deadline, abandoning browser"
                );
                return Err(RenderError::Timeout(timeout));
            }
        };

        if pdf.is_empty() {
            return Err(RenderError::EmptyOutput);
        }

        tracing::debug!(
            size_bytes = pdf.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "PDF rendered"
        );

        Ok(Bytes::from(pdf))
    }
}

/// Write the page to a temporary `.html` file, removed when dropped.
fn write_page(html: &str) -> Result<tempfile::NamedTempFile, RenderError> {
    let mut page = tempfile::Builder::new()
        .prefix("docpress-")
        .suffix(".html")
        .tempfile()?;
    page.write_all(html.as_bytes())?;
    page.flush()?;
    Ok(page)
}
