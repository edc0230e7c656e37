//! Conversion of a widget `config.xml` into the generic document tree.
//!
//! Each element becomes an object: attributes under `@<local-name>`, the
//! element namespace under `@namespace`, collapsed text under `#text`, and
//! child elements under their local name. A second child with the same name
//! turns the entry into a list, except for elements that may appear only once,
//! where the first occurrence wins.

use roxmltree::{Document, Node};
use serde_json::{Map, Value};

use crate::error::{ManifestError, ManifestResult};
use crate::keys;

/// Elements for which later duplicates are ignored.
const SINGLETON_ELEMENTS: &[&str] = &[
    "allow-navigation",
    "author",
    "content-security-policy",
    "content-security-policy-report-only",
    "content",
];

const NAMESPACE_KEY: &str = "@namespace";
const TEXT_KEY: &str = "#text";

/// Parse widget XML into `{"widget": {...}}`.
pub(crate) fn widget_xml_to_value(xml: &str) -> ManifestResult<Value> {
    let doc = Document::parse(xml).map_err(|e| ManifestError::Parse {
        message: e.to_string(),
    })?;

    let root = doc.root_element();
    if root.tag_name().name() != keys::WIDGET {
        return Err(ManifestError::Parse {
            message: format!(
                "root element must be <widget>, found <{}>",
                root.tag_name().name()
            ),
        });
    }

    let mut top = Map::new();
    top.insert(keys::WIDGET.to_string(), Value::Object(element_to_map(root)));
    Ok(Value::Object(top))
}

fn element_to_map(node: Node<'_, '_>) -> Map<String, Value> {
    let mut map = Map::new();

    if let Some(ns) = node.tag_name().namespace() {
        map.insert(NAMESPACE_KEY.to_string(), Value::String(ns.to_string()));
    }
    for attr in node.attributes() {
        map.insert(
            format!("@{}", attr.name()),
            Value::String(collapse_whitespace(attr.value())),
        );
    }

    for child in node.children().filter(Node::is_element) {
        let name = child.tag_name().name();
        let value = Value::Object(element_to_map(child));
        match map.get_mut(name) {
            None => {
                map.insert(name.to_string(), value);
            },
            Some(_) if SINGLETON_ELEMENTS.contains(&name) => {},
            Some(Value::Array(list)) => list.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            },
        }
    }

    let text = collapse_whitespace(&node_text(node));
    if !text.is_empty() {
        map.insert(TEXT_KEY.to_string(), Value::String(text));
    }
    map
}

/// Direct text of an element, descending into `<span>` children only.
fn node_text(node: Node<'_, '_>) -> String {
    let mut text = String::new();
    for child in node.children() {
        if child.is_text() {
            text.push_str(child.text().unwrap_or_default());
        } else if child.is_element() && child.tag_name().name() == "span" {
            text.push_str(&node_text(child));
        }
    }
    text
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDGET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<widget xmlns="http://www.w3.org/ns/widgets" id="http://example.com/w" version="1.2">
  <name short="Demo">  Demo
     Widget </name>
  <access origin="https://a.example.com" subdomains="true"/>
  <access origin="https://b.example.com"/>
  <content src="index.html"/>
  <content src="other.html"/>
  <description>Hello <span>brave</span> world</description>
</widget>"#;

    #[test]
    fn test_attributes_text_and_namespace() {
        let v = widget_xml_to_value(WIDGET).unwrap();
        let w = &v["widget"];
        assert_eq!(w["@namespace"], "http://www.w3.org/ns/widgets");
        assert_eq!(w["@version"], "1.2");
        assert_eq!(w["name"]["#text"], "Demo Widget");
        assert_eq!(w["name"]["@short"], "Demo");
        assert_eq!(w["description"]["#text"], "Hello brave world");
    }

    #[test]
    fn test_repeated_children_become_list() {
        let v = widget_xml_to_value(WIDGET).unwrap();
        let access = v["widget"]["access"].as_array().unwrap();
        assert_eq!(access.len(), 2);
        assert_eq!(access[0]["@origin"], "https://a.example.com");
        assert_eq!(access[1]["@origin"], "https://b.example.com");
    }

    #[test]
    fn test_singleton_first_occurrence_wins() {
        let v = widget_xml_to_value(WIDGET).unwrap();
        assert_eq!(v["widget"]["content"]["@src"], "index.html");
    }

    #[test]
    fn test_rejects_non_widget_root() {
        let err = widget_xml_to_value("<manifest/>").unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }

    #[test]
    fn test_rejects_malformed_xml() {
        assert!(widget_xml_to_value("<widget>").is_err());
    }
}
