//! Tree construction through html5ever (via scraper)
//!
//! html5ever does the tokenizing and the HTML tree-construction rules
//! (implied `html`/`head`/`body`, implicit end tags, table fixups, character
//! references). The resulting tree is copied into the document arena, where
//! it can be mutated; scraper's own tree is read-only.

use super::{Document, NodeId};
use scraper::{Html, Node};

/// Parse a full page and append it under the document node
pub(super) fn build_document(doc: &mut Document, html: &str) {
    let root = doc.root();
    copy_tree(doc, root, &Html::parse_document(html), false);
}

/// Parse a fragment in `<body>` context and append it under `parent`
pub(super) fn build_fragment(doc: &mut Document, parent: NodeId, html: &str) {
    copy_tree(doc, parent, &Html::parse_fragment(html), true);
}

/// Copy the parsed nodes under `parent`, depth first with an explicit stack so
/// nesting depth is bounded by the heap
fn copy_tree(doc: &mut Document, parent: NodeId, parsed: &Html, fragment: bool) {
    // Fragment content lands under a synthetic <html> element
    let source = if fragment {
        *parsed.root_element()
    } else {
        parsed.tree.root()
    };
    let mut stack: Vec<_> = source.children().map(|child| (child, parent)).collect();
    stack.reverse();

    while let Some((node, parent)) = stack.pop() {
        let id = match node.value() {
            Node::Element(element) => {
                let attrs = element
                    .attrs()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect();
                doc.create_element(element.name(), attrs)
            }
            Node::Text(text) => doc.create_text(text),
            Node::Comment(comment) => doc.create_comment(comment),
            Node::Doctype(doctype) => doc.create_doctype(&format!("DOCTYPE {}", doctype.name())),
            _ => continue,
        };
        doc.append_child(parent, id);

        let first = stack.len();
        stack.extend(node.children().map(|child| (child, id)));
        stack[first..].reverse();
    }
}

#[cfg(test)]
mod tests {
    use crate::dom::{Document, Selector};

    fn sel(s: &str) -> Selector {
        Selector::parse(s).unwrap()
    }

    #[test]
    fn test_attributes_keep_source_order() {
        let doc = Document::parse(
            r#"<form class="js-ajax" data-mode=prepend novalidate action='/api/posts' class="dup"></form>"#,
        );
        let form = doc.select(&sel("form")).unwrap();
        assert_eq!(doc.attr(form, "class"), Some("js-ajax"));
        assert_eq!(doc.attr(form, "data-mode"), Some("prepend"));
        assert_eq!(doc.attr(form, "novalidate"), Some(""));
        assert_eq!(
            doc.outer_html(form),
            r#"<form class="js-ajax" data-mode="prepend" novalidate="" action="/api/posts"></form>"#
        );
    }

    #[test]
    fn test_character_references() {
        let doc = Document::parse("<p>a &amp; b &lt;3 &#64; &#x41; &copy 2024 AT&T</p>");
        let p = doc.select(&sel("p")).unwrap();
        assert_eq!(doc.text_content(p), "a & b <3 @ A \u{a9} 2024 AT&T");
    }

    #[test]
    fn test_script_content_is_raw() {
        let doc = Document::parse("<script>if (a < b && c) { x(); }</script><p>after</p>");
        let script = doc.select(&sel("script")).unwrap();
        assert_eq!(doc.text_content(script), "if (a < b && c) { x(); }");
        assert!(doc.select(&sel("p")).is_some());
    }

    #[test]
    fn test_textarea_default_text_decoded() {
        let doc = Document::parse("<textarea name=\"m\">a &lt;b&gt;</textarea>");
        let area = doc.select(&sel("textarea")).unwrap();
        assert_eq!(doc.text_content(area), "a <b>");
    }

    #[test]
    fn test_unclosed_and_stray_tags() {
        let doc = Document::parse("<div><p>one<p>two</span></div><em>x");
        assert_eq!(
            doc.inner_html(doc.body()),
            "<div><p>one</p><p>two</p></div><em>x</em>"
        );
    }

    #[test]
    fn test_block_element_closes_paragraph() {
        let doc = Document::parse("<p>intro<div>block</div>");
        assert!(doc.select(&sel("p div")).is_none());
        assert!(doc.select(&sel("body > div")).is_some());
    }

    #[test]
    fn test_table_rows_get_a_tbody() {
        let doc = Document::parse("<table><tr><td>a<td>b</table>");
        assert_eq!(doc.select_all(&sel("table > tbody > tr > td")).len(), 2);
    }

    #[test]
    fn test_abrupt_comment_does_not_swallow_input() {
        let doc = Document::parse("<!--><p>after</p>");
        let p = doc.select(&sel("p")).unwrap();
        assert_eq!(doc.text_content(p), "after");
    }

    #[test]
    fn test_doctype_and_comments_preserved() {
        let doc = Document::parse("<!DOCTYPE html><html><body><!-- feed --><main></main></body></html>");
        assert_eq!(
            doc.outer_html(doc.root()),
            "<!DOCTYPE html><html><head></head><body><!-- feed --><main></main></body></html>"
        );
        assert_eq!(doc.tag_name(doc.body()), Some("body"));
    }

    #[test]
    fn test_fragment_has_no_implied_wrappers() {
        let mut doc = Document::parse(r#"<ul id="list"></ul>"#);
        let list = doc.select(&sel("#list")).unwrap();
        doc.set_inner_html(list, "<li>a</li><li>b</li>");
        assert_eq!(doc.inner_html(list), "<li>a</li><li>b</li>");
    }
}
