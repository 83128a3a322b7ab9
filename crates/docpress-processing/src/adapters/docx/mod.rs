//! Word (`.docx`) to HTML.
//!
//! Reads `word/document.xml` with roxmltree and emits headings, paragraphs,
//! inline emphasis, hyperlinks and tables. Anything outside that set is
//! dropped with a warning so a partially supported document still renders.

mod styles;

use super::shell::{escape_html, wrap_document, DOCUMENT_STYLESHEET};
use super::{AdapterError, AdapterOutput, FormatAdapter};
use docpress_core::FileType;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use styles::StyleMapping;

pub(super) const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const HYPERLINK_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";

/// Local file header signature; every DOCX is a ZIP archive.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

pub struct DocxAdapter;

impl FormatAdapter for DocxAdapter {
    fn file_type(&self) -> FileType {
        FileType::Docx
    }

    fn to_html(&self, raw: &[u8]) -> Result<AdapterOutput, AdapterError> {
        if !raw.starts_with(ZIP_MAGIC) {
            return Err(AdapterError::InvalidDocument(
                "file is not a DOCX (ZIP) archive".to_string(),
            ));
        }

        let mut zip = zip::ZipArchive::new(Cursor::new(raw))
            .map_err(|e| AdapterError::InvalidDocument(format!("unreadable archive: {}", e)))?;

        let document_xml = read_zip_text(&mut zip, "word/document.xml", MAX_PART_BYTES)?
            .ok_or_else(|| {
                AdapterError::InvalidDocument("missing word/document.xml".to_string())
            })?;
        let style_names = read_zip_text(&mut zip, "word/styles.xml", MAX_PART_BYTES)?
            .map(|xml| styles::parse_style_names(&xml))
            .unwrap_or_default();
        let links = read_zip_text(&mut zip, "word/_rels/document.xml.rels", MAX_PART_BYTES)?
            .map(|xml| parse_hyperlink_targets(&xml))
            .unwrap_or_default();

        let xml = roxmltree::Document::parse(&document_xml).map_err(|e| {
            AdapterError::InvalidDocument(format!("malformed word/document.xml: {}", e))
        })?;
        let body = wml(xml.root_element(), "body")
            .ok_or_else(|| AdapterError::InvalidDocument("missing w:body".to_string()))?;

        let mut writer = HtmlWriter::new(&style_names, &links);
        writer.blocks(body);

        Ok(AdapterOutput {
            html: wrap_document(DOCUMENT_STYLESHEET, writer.out.trim_end()),
            warnings: writer.warnings,
        })
    }
}

/// Largest decompressed size accepted for a single package part.
const MAX_PART_BYTES: u64 = 64 * 1024 * 1024;

/// Read a package part as text. A missing or non-UTF-8 part is `None`; a part
/// that inflates past `limit` rejects the whole document.
fn read_zip_text<R: Read + std::io::Seek>(
    zip: &mut zip::ZipArchive<R>,
    name: &str,
    limit: u64,
) -> Result<Option<String>, AdapterError> {
    let Ok(entry) = zip.by_name(name) else {
        return Ok(None);
    };

    let mut content = Vec::new();
    entry
        .take(limit + 1)
        .read_to_end(&mut content)
        .map_err(|e| AdapterError::InvalidDocument(format!("unreadable {}: {}", name, e)))?;
    if content.len() as u64 > limit {
        return Err(AdapterError::InvalidDocument(format!(
            "{} expands beyond {} bytes",
            name, limit
        )));
    }

    Ok(String::from_utf8(content).ok())
}

/// External hyperlink targets by relationship id. Only web and mail links
/// are kept.
fn parse_hyperlink_targets(xml_content: &str) -> HashMap<String, String> {
    let mut targets = HashMap::new();
    let Ok(xml) = roxmltree::Document::parse(xml_content) else {
        return targets;
    };

    for node in xml.root_element().children() {
        if node.tag_name().name() != "Relationship"
            || node.attribute("Type") != Some(HYPERLINK_REL_TYPE)
        {
            continue;
        }
        let (Some(id), Some(target)) = (node.attribute("Id"), node.attribute("Target")) else {
            continue;
        };
        let lower = target.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("mailto:")
        {
            targets.insert(id.to_string(), target.to_string());
        }
    }

    targets
}

pub(super) fn is_wml(node: roxmltree::Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() == Some(WML_NS)
}

fn wml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children().find(|n| is_wml(*n, name))
}

fn wml_attr<'a>(node: roxmltree::Node<'a, 'a>, child: &str) -> Option<&'a str> {
    wml(node, child).and_then(|n| n.attribute((WML_NS, "val")))
}

/// On/off run property. `<w:b/>` is on, `<w:b w:val="0"/>` is off, and
/// `w:u` uses `none` for off.
fn wml_toggle(parent: roxmltree::Node, name: &str) -> bool {
    wml(parent, name).is_some_and(|n| {
        n.attribute((WML_NS, "val"))
            .map_or(true, |v| !matches!(v, "0" | "false" | "none"))
    })
}

fn wml_children<'a>(node: roxmltree::Node<'a, 'a>) -> impl Iterator<Item = roxmltree::Node<'a, 'a>> {
    node.children()
        .filter(|n| n.is_element() && n.tag_name().namespace() == Some(WML_NS))
}

struct HtmlWriter<'s> {
    style_names: &'s HashMap<String, String>,
    links: &'s HashMap<String, String>,
    out: String,
    warnings: Vec<String>,
}

impl<'s> HtmlWriter<'s> {
    fn new(style_names: &'s HashMap<String, String>, links: &'s HashMap<String, String>) -> Self {
        Self {
            style_names,
            links,
            out: String::new(),
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, message: String) {
        if !self.warnings.contains(&message) {
            self.warnings.push(message);
        }
    }

    fn style_name(&self, id: &'s str) -> &'s str {
        self.style_names.get(id).map(String::as_str).unwrap_or(id)
    }

    fn blocks(&mut self, parent: roxmltree::Node) {
        for node in wml_children(parent) {
            match node.tag_name().name() {
                "p" => self.paragraph(node),
                "tbl" => self.table(node),
                "sdt" => {
                    if let Some(content) = wml(node, "sdtContent") {
                        self.blocks(content);
                    }
                }
                "sectPr" | "tcPr" | "bookmarkStart" | "bookmarkEnd" | "proofErr" | "permStart"
                | "permEnd" | "commentRangeStart" | "commentRangeEnd" => {}
                other => self.warn(format!("Unsupported element w:{} was ignored", other)),
            }
        }
    }

    fn paragraph(&mut self, p: roxmltree::Node) {
        let style_id = wml(p, "pPr").and_then(|ppr| wml_attr(ppr, "pStyle"));
        let tag = match style_id {
            None => "p",
            Some(id) => {
                let name = self.style_name(id);
                match styles::block_tag_for(name) {
                    StyleMapping::Tag(tag) => tag,
                    StyleMapping::Plain => "p",
                    StyleMapping::Unknown => {
                        self.warn(format!(
                            "Unrecognised paragraph style: '{}' (Style ID: {})",
                            name, id
                        ));
                        "p"
                    }
                }
            }
        };

        let content = self.inline(p);
        if content.trim().is_empty() {
            return;
        }
        self.out.push_str(&format!("<{tag}>{content}</{tag}>\n"));
    }

    fn inline(&mut self, parent: roxmltree::Node) -> String {
        let mut out = String::new();
        for node in wml_children(parent) {
            match node.tag_name().name() {
                "r" => out.push_str(&self.run(node)),
                "hyperlink" => {
                    let inner = self.inline(node);
                    if inner.is_empty() {
                        continue;
                    }
                    let href = node
                        .attribute((REL_NS, "id"))
                        .and_then(|id| self.links.get(id).cloned())
                        .or_else(|| node.attribute((WML_NS, "anchor")).map(|a| format!("#{}", a)));
                    match href {
                        Some(href) => out.push_str(&format!(
                            "<a href=\"{}\">{}</a>",
                            escape_html(&href),
                            inner
                        )),
                        None => out.push_str(&inner),
                    }
                }
                "ins" | "smartTag" | "customXml" | "fldSimple" => out.push_str(&self.inline(node)),
                "sdt" => {
                    if let Some(content) = wml(node, "sdtContent") {
                        out.push_str(&self.inline(content));
                    }
                }
                "pPr" | "del" | "bookmarkStart" | "bookmarkEnd" | "proofErr" | "permStart"
                | "permEnd" | "commentRangeStart" | "commentRangeEnd" => {}
                other => self.warn(format!("Unsupported element w:{} was ignored", other)),
            }
        }
        out
    }

    fn run(&mut self, r: roxmltree::Node) -> String {
        let mut text = String::new();
        for child in wml_children(r) {
            match child.tag_name().name() {
                "t" => text.push_str(&escape_html(child.text().unwrap_or(""))),
                "tab" => text.push_str("&emsp;"),
                "br" | "cr" => text.push_str("<br>"),
                "noBreakHyphen" => text.push('-'),
                "rPr" | "lastRenderedPageBreak" | "fldChar" | "instrText" | "softHyphen" => {}
                "drawing" | "pict" | "object" => {
                    self.warn("Embedded images and objects are not converted".to_string())
                }
                other => self.warn(format!("Unsupported element w:{} was ignored", other)),
            }
        }

        if text.is_empty() {
            return text;
        }
        let Some(rpr) = wml(r, "rPr") else {
            return text;
        };

        // Innermost first: <strong><em><u><s>text</s></u></em></strong>
        for (property, tag) in [("strike", "s"), ("u", "u"), ("i", "em"), ("b", "strong")] {
            if wml_toggle(rpr, property) {
                text = format!("<{tag}>{text}</{tag}>");
            }
        }

        if let Some(id) = wml_attr(rpr, "rStyle") {
            let name = self.style_name(id);
            match styles::run_tag_for(name) {
                StyleMapping::Tag(tag) => text = format!("<{tag}>{text}</{tag}>"),
                StyleMapping::Plain => {}
                StyleMapping::Unknown => self.warn(format!(
                    "Unrecognised run style: '{}' (Style ID: {})",
                    name, id
                )),
            }
        }

        text
    }

    fn table(&mut self, tbl: roxmltree::Node) {
        let rows: Vec<_> = wml_children(tbl).filter(|n| n.tag_name().name() == "tr").collect();
        let Some(first) = rows.first() else {
            return;
        };

        let flagged_header = wml(*first, "trPr").is_some_and(|pr| wml_toggle(pr, "tblHeader"));
        let header_rows = if flagged_header || rows.len() > 1 { 1 } else { 0 };

        self.out.push_str("<table class=\"enhanced-table\">\n");
        if header_rows == 1 {
            self.out.push_str("<thead>\n");
            self.row(*first, "th");
            self.out.push_str("</thead>\n");
        }
        if rows.len() > header_rows {
            self.out.push_str("<tbody>\n");
            for row in &rows[header_rows..] {
                self.row(*row, "td");
            }
            self.out.push_str("</tbody>\n");
        }
        self.out.push_str("</table>\n");
    }

    fn row(&mut self, tr: roxmltree::Node, cell_tag: &str) {
        self.out.push_str("<tr>");
        for tc in wml_children(tr).filter(|n| n.tag_name().name() == "tc") {
            let colspan = wml(tc, "tcPr")
                .and_then(|pr| wml_attr(pr, "gridSpan"))
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|span| *span > 1)
                .map(|span| format!(" colspan=\"{}\"", span))
                .unwrap_or_default();

            let outer = std::mem::take(&mut self.out);
            self.blocks(tc);
            let content = std::mem::replace(&mut self.out, outer);

            self.out.push_str(&format!(
                "<{cell_tag}{colspan}>{}</{cell_tag}>",
                content.trim_end()
            ));
        }
        self.out.push_str("</tr>\n");
    }
}
