use super::{is_wml, WML_NS};
use std::collections::HashMap;

/// Map of `w:styleId` to the style's display name from `word/styles.xml`.
///
/// Documents reference styles by id (`Heading1`), but the style map is keyed
/// on display names (`heading 1`), which is what authors see in Word.
pub(super) fn parse_style_names(xml_content: &str) -> HashMap<String, String> {
    let mut names = HashMap::new();
    let Ok(xml) = roxmltree::Document::parse(xml_content) else {
        return names;
    };

    for style in xml.root_element().children().filter(|n| is_wml(*n, "style")) {
        let Some(id) = style.attribute((WML_NS, "styleId")) else {
            continue;
        };
        let name = style
            .children()
            .find(|n| is_wml(*n, "name"))
            .and_then(|n| n.attribute((WML_NS, "val")))
            .unwrap_or(id);
        names.insert(id.to_string(), name.to_string());
    }

    names
}

/// What a paragraph or run style turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum StyleMapping {
    /// Wrap in this element
    Tag(&'static str),
    /// Known style with no markup of its own
    Plain,
    /// Not in the style map; rendered plain with a warning
    Unknown,
}

/// Lowercase and drop whitespace so `Heading 1`, `heading 1` and the id
/// `Heading1` all compare equal.
fn normalize(style_name: &str) -> String {
    style_name
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Block element for a paragraph style. Unstyled paragraphs never get here.
pub(super) fn block_tag_for(style_name: &str) -> StyleMapping {
    match normalize(style_name).as_str() {
        "title" => StyleMapping::Tag("h1"),
        "heading1" => StyleMapping::Tag("h2"),
        "heading2" | "heading3" => StyleMapping::Tag("h3"),
        "bodytext" | "tableparagraph" | "normal" => StyleMapping::Tag("p"),
        _ => StyleMapping::Unknown,
    }
}

/// Inline element for a character style.
pub(super) fn run_tag_for(style_name: &str) -> StyleMapping {
    match normalize(style_name).as_str() {
        "strong" => StyleMapping::Tag("strong"),
        "emphasis" => StyleMapping::Tag("em"),
        "highlight" => StyleMapping::Tag("mark"),
        "hyperlink" | "defaultparagraphfont" => StyleMapping::Plain,
        _ => StyleMapping::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_style_names() {
        let xml = r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
            <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/></w:style>
            <w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/></w:style>
            <w:style w:type="character" w:styleId="Nameless"/>
        </w:styles>"#;
        let names = parse_style_names(xml);
        assert_eq!(names.get("Heading1").map(String::as_str), Some("heading 1"));
        assert_eq!(names.get("Title").map(String::as_str), Some("Title"));
        assert_eq!(names.get("Nameless").map(String::as_str), Some("Nameless"));
    }

    #[test]
    fn test_malformed_styles_yield_empty_map() {
        assert!(parse_style_names("<w:styles").is_empty());
    }

    #[test]
    fn test_block_style_map() {
        assert_eq!(block_tag_for("Title"), StyleMapping::Tag("h1"));
        assert_eq!(block_tag_for("heading 1"), StyleMapping::Tag("h2"));
        assert_eq!(block_tag_for("Heading2"), StyleMapping::Tag("h3"));
        assert_eq!(block_tag_for("Heading 3"), StyleMapping::Tag("h3"));
        assert_eq!(block_tag_for("Body Text"), StyleMapping::Tag("p"));
        assert_eq!(block_tag_for("Table Paragraph"), StyleMapping::Tag("p"));
        assert_eq!(block_tag_for("Quote"), StyleMapping::Unknown);
    }

    #[test]
    fn test_run_style_map() {
        assert_eq!(run_tag_for("Strong"), StyleMapping::Tag("strong"));
        assert_eq!(run_tag_for("Emphasis"), StyleMapping::Tag("em"));
        assert_eq!(run_tag_for("Highlight"), StyleMapping::Tag("mark"));
        assert_eq!(run_tag_for("Hyperlink"), StyleMapping::Plain);
        assert_eq!(run_tag_for("Intense Reference"), StyleMapping::Unknown);
    }
}
