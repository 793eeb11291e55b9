//! Collection of inline JSON-LD blocks into the uniform block shape.

use scraper::{Html, Selector};
use serde_json::{Map, Value};
use tracing::warn;

/// Pull every JSON-LD object out of a parsed document, in encounter order.
///
/// Handles the shapes seen in the wild: a bare object, a top-level array of
/// objects, and an object wrapping an `@graph` array. Graph members inherit
/// the wrapper's `@context` when they don't declare their own. Blocks that
/// fail to parse as JSON are logged and skipped.
pub fn collect_blocks(document: &Html) -> Vec<Map<String, Value>> {
    let selector =
        Selector::parse(r#"script[type="application/ld+json"]"#).expect("static selector");
    let mut blocks = Vec::new();
    for script in document.select(&selector) {
        let raw = script.text().collect::<String>();
        if raw.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => expand(value, None, &mut blocks),
            Err(err) => {
                warn!(error = %err, "skipping unparseable ld+json block");
            }
        }
    }
    blocks
}

fn expand(value: Value, inherited_context: Option<&Value>, out: &mut Vec<Map<String, Value>>) {
    match value {
        Value::Object(mut obj) => {
            let context = obj.get("@context").cloned();
            if obj.get("@context").is_none() {
                if let Some(ctx) = inherited_context {
                    obj.insert("@context".to_string(), ctx.clone());
                }
            }
            let graph = obj.remove("@graph");
            out.push(obj);
            if let Some(Value::Array(members)) = graph {
                let ctx = context.as_ref().or(inherited_context);
                for member in members {
                    expand(member, ctx, out);
                }
            }
        }
        Value::Array(members) => {
            for member in members {
                expand(member, inherited_context, out);
            }
        }
        other => {
            warn!(value = %other, "ld+json block is not an object");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(block: &str) -> Html {
        Html::parse_document(&format!(
            "<html><head><script type=\"application/ld+json\">{block}</script></head></html>"
        ))
    }

    #[test]
    fn bare_object_yields_one_block() {
        let document = page(r#"{"@type": "NewsArticle", "headline": "Foo"}"#);
        let blocks = collect_blocks(&document);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0]["headline"], "Foo");
    }

    #[test]
    fn top_level_arrays_flatten_in_order() {
        let document = page(r#"[{"headline": "A"}, {"headline": "B"}]"#);
        let blocks = collect_blocks(&document);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0]["headline"], "A");
        assert_eq!(blocks[1]["headline"], "B");
    }

    #[test]
    fn graph_members_inherit_the_wrapper_context() {
        let document = page(
            r#"{"@context": "https://schema.org",
                "@graph": [{"@type": "NewsArticle", "headline": "Foo"}]}"#,
        );
        let blocks = collect_blocks(&document);
        // wrapper + one member
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1]["@context"], "https://schema.org");
        assert_eq!(blocks[1]["headline"], "Foo");
    }

    #[test]
    fn invalid_json_is_skipped_not_fatal() {
        let document = page("{not json");
        assert!(collect_blocks(&document).is_empty());
    }
}
