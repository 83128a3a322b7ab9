//! Test doubles: a scripted browser factory that needs no Chrome binary,
//! and builders for small DOCX packages.

use crate::renderer::{BrowserFactory, PdfOptions, RenderEngine, RenderError};
use std::collections::VecDeque;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Minimal PDF returned by scripted engines.
pub const SAMPLE_PDF: &[u8] =
    b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n<< /Root 1 0 R >>\n%%EOF\n";

/// Outcome of the next scripted launch or render.
#[derive(Debug, Clone)]
pub enum ScriptedRender {
    Pdf(Vec<u8>),
    Fail(String),
    /// Sleep, then succeed with [`SAMPLE_PDF`]
    Hang(Duration),
    LaunchFails,
}

#[derive(Default)]
struct ScriptState {
    queue: Mutex<VecDeque<ScriptedRender>>,
    launches: AtomicU64,
    renders: AtomicU64,
    unhealthy_before: AtomicU64,
    active: AtomicUsize,
    max_active: AtomicUsize,
    last_page: Mutex<Option<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Browser factory whose engines follow a queue of scripted outcomes.
/// With an empty queue every render succeeds with [`SAMPLE_PDF`].
#[derive(Default)]
pub struct ScriptedBrowserFactory {
    state: Arc<ScriptState>,
}

impl ScriptedBrowserFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, step: ScriptedRender) {
        lock(&self.state.queue).push_back(step);
    }

    pub fn launches(&self) -> u64 {
        self.state.launches.load(Ordering::SeqCst)
    }

    pub fn renders(&self) -> u64 {
        self.state.renders.load(Ordering::SeqCst)
    }

    /// Every engine launched so far reports unhealthy from now on.
    pub fn mark_all_unhealthy(&self) {
        self.state
            .unhealthy_before
            .store(self.launches(), Ordering::SeqCst);
    }

    /// HTML of the most recently rendered page, as the engine loaded it.
    pub fn last_page(&self) -> Option<String> {
        lock(&self.state.last_page).clone()
    }

    pub fn max_concurrent_renders(&self) -> usize {
        self.state.max_active.load(Ordering::SeqCst)
    }
}

impl BrowserFactory for ScriptedBrowserFactory {
    fn launch(&self) -> Result<Box<dyn RenderEngine>, RenderError> {
        {
            let mut queue = lock(&self.state.queue);
            if matches!(queue.front(), Some(ScriptedRender::LaunchFails)) {
                queue.pop_front();
                return Err(RenderError::Launch("scripted launch failure".to_string()));
            }
        }

        let id = self.state.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedEngine {
            id,
            state: self.state.clone(),
        }))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct ScriptedEngine {
    id: u64,
    state: Arc<ScriptState>,
}

impl RenderEngine for ScriptedEngine {
    fn render_pdf(
        &mut self,
        page: &Path,
        _options: &PdfOptions,
        _deadline: Duration,
    ) -> Result<Vec<u8>, RenderError> {
        let html = std::fs::read_to_string(page)?;
        *lock(&self.state.last_page) = Some(html);

        let active = self.state.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_active.fetch_max(active, Ordering::SeqCst);

        let step = lock(&self.state.queue).pop_front();
        let result = match step.unwrap_or_else(|| ScriptedRender::Pdf(SAMPLE_PDF.to_vec())) {
            ScriptedRender::Pdf(bytes) => Ok(bytes),
            ScriptedRender::Fail(message) => Err(RenderError::Engine(message)),
            ScriptedRender::Hang(duration) => {
                std::thread::sleep(duration);
                Ok(SAMPLE_PDF.to_vec())
            }
            ScriptedRender::LaunchFails => {
                Err(RenderError::Engine("launch failure scripted mid-render".to_string()))
            }
        };

        self.state.active.fetch_sub(1, Ordering::SeqCst);
        self.state.renders.fetch_add(1, Ordering::SeqCst);
        result
    }

    fn is_healthy(&self) -> bool {
        self.id >= self.state.unhealthy_before.load(Ordering::SeqCst)
    }
}

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

/// `word/document.xml` wrapping the given `w:body` content.
pub fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>{}</w:body></w:document>"#,
        body
    )
}

/// Zip the given parts (plus `[Content_Types].xml`) into a DOCX package.
pub fn docx_from_parts(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let all = std::iter::once(("[Content_Types].xml", CONTENT_TYPES_XML)).chain(parts.iter().copied());
    for (name, content) in all {
        writer
            .start_file(name, options)
            .expect("start zip entry in memory");
        writer
            .write_all(content.as_bytes())
            .expect("write zip entry in memory");
    }

    writer.finish().expect("finish zip in memory").into_inner()
}

/// DOCX whose document body is `body` (raw WordprocessingML).
pub fn docx_with_body(body: &str) -> Vec<u8> {
    docx_from_parts(&[("word/document.xml", document_xml(body).as_str())])
}

/// A short DOCX with a title, a paragraph and a two-row table.
pub fn sample_docx_with_table() -> Vec<u8> {
    docx_with_body(
        r#"<w:p><w:pPr><w:pStyle w:val="Title"/></w:pPr><w:r><w:t>Meeting notes</w:t></w:r></w:p>
<w:p><w:r><w:t xml:space="preserve">Attendees: </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>all</w:t></w:r></w:p>
<w:tbl>
<w:tr><w:tc><w:p><w:r><w:t>Item</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>Owner</w:t></w:r></w:p></w:tc></w:tr>
<w:tr><w:tc><w:p><w:r><w:t>Budget</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>Alice</w:t></w:r></w:p></w:tc></w:tr>
</w:tbl>"#,
    )
}
