//! Attribute-embedded microdata, converted to the same shape as JSON-LD.
//!
//! Top-level `itemscope` elements become objects with `@context`/`@type`
//! derived from `itemtype`, property elements become string values per the
//! microdata value rules, nested scopes become nested objects, and repeated
//! property names collect into arrays. Downstream extraction code never
//! needs to know which syntax a block came from.

use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};

/// Collect every top-level microdata item in document order.
pub fn collect_items(document: &Html) -> Vec<Map<String, Value>> {
    let selector = Selector::parse("[itemscope]").expect("static selector");
    document
        .select(&selector)
        .filter(|el| !has_itemscope_ancestor(*el))
        .map(build_item)
        .collect()
}

fn has_itemscope_ancestor(el: ElementRef) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| ancestor.value().attr("itemscope").is_some())
}

fn build_item(el: ElementRef) -> Map<String, Value> {
    let mut item = Map::new();
    if let Some(itemtype) = el.value().attr("itemtype") {
        if let Some((context, type_name)) = itemtype.trim().rsplit_once('/') {
            item.insert("@context".to_string(), Value::String(context.to_string()));
            item.insert("@type".to_string(), Value::String(type_name.to_string()));
        } else {
            item.insert("@type".to_string(), Value::String(itemtype.trim().to_string()));
        }
    }
    collect_props(el, &mut item);
    item
}

/// Walk an item's subtree gathering `itemprop` values, without crossing
/// into nested `itemscope` boundaries (those become nested objects).
fn collect_props(scope: ElementRef, props: &mut Map<String, Value>) {
    for child in scope.children() {
        let Some(el) = ElementRef::wrap(child) else {
            continue;
        };
        let nested_scope = el.value().attr("itemscope").is_some();
        if let Some(names) = el.value().attr("itemprop") {
            let value = if nested_scope {
                let mut nested = build_item(el);
                // Nested items reference the parent's id space via @id when
                // an itemid is present.
                if let Some(itemid) = el.value().attr("itemid") {
                    nested.insert("@id".to_string(), Value::String(itemid.to_string()));
                }
                Value::Object(nested)
            } else {
                Value::String(property_value(el))
            };
            for name in names.split_whitespace() {
                insert_prop(props, name, value.clone());
            }
        }
        if !nested_scope {
            collect_props(el, props);
        }
    }
}

/// The microdata value of a property element, per its tag.
fn property_value(el: ElementRef) -> String {
    let attr = |name: &str| el.value().attr(name).map(str::to_string);
    match el.value().name() {
        "meta" => attr("content").unwrap_or_default(),
        "a" | "link" | "area" => attr("href").unwrap_or_default(),
        "img" | "audio" | "video" | "source" | "iframe" | "embed" | "track" => {
            attr("src").unwrap_or_default()
        }
        "object" => attr("data").unwrap_or_default(),
        "data" | "meter" => attr("value").unwrap_or_default(),
        "time" => attr("datetime").unwrap_or_else(|| text_of(el)),
        _ => text_of(el),
    }
}

fn text_of(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn insert_prop(props: &mut Map<String, Value>, name: &str, value: Value) {
    match props.get_mut(name) {
        None => {
            props.insert(name.to_string(), value);
        }
        Some(Value::Array(existing)) => existing.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_carries_context_and_type_from_itemtype() {
        let document = Html::parse_document(
            r#"<div itemscope itemtype="https://schema.org/NewsArticle">
                 <span itemprop="headline">Hi</span>
               </div>"#,
        );
        let items = collect_items(&document);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["@context"], "https://schema.org");
        assert_eq!(items[0]["@type"], "NewsArticle");
        assert_eq!(items[0]["headline"], "Hi");
    }

    #[test]
    fn tag_specific_value_rules_apply() {
        let document = Html::parse_document(
            r#"<article itemscope itemtype="https://schema.org/Article">
                 <meta itemprop="datePublished" content="2020-01-01">
                 <a itemprop="url" href="https://x.test/a">link text</a>
                 <time itemprop="dateCreated" datetime="2019-12-31">NYE</time>
               </article>"#,
        );
        let item = &collect_items(&document)[0];
        assert_eq!(item["datePublished"], "2020-01-01");
        assert_eq!(item["url"], "https://x.test/a");
        assert_eq!(item["dateCreated"], "2019-12-31");
    }

    #[test]
    fn repeated_props_become_arrays() {
        let document = Html::parse_document(
            r#"<div itemscope itemtype="https://schema.org/Article">
                 <p itemprop="articleBody">One</p>
                 <p itemprop="articleBody">Two</p>
               </div>"#,
        );
        let item = &collect_items(&document)[0];
        assert_eq!(item["articleBody"], serde_json::json!(["One", "Two"]));
    }

    #[test]
    fn nested_scopes_become_nested_objects_not_parent_props() {
        let document = Html::parse_document(
            r#"<div itemscope itemtype="https://schema.org/NewsArticle">
                 <div itemprop="mainEntityOfPage" itemscope
                      itemtype="https://schema.org/WebPage"
                      itemid="https://x.test/a">
                   <span itemprop="name">Inner</span>
                 </div>
               </div>"#,
        );
        let items = collect_items(&document);
        assert_eq!(items.len(), 1);
        let nested = items[0]["mainEntityOfPage"].as_object().unwrap();
        assert_eq!(nested["@type"], "WebPage");
        assert_eq!(nested["@id"], "https://x.test/a");
        assert_eq!(nested["name"], "Inner");
        // the nested item's props don't leak upward
        assert!(items[0].get("name").is_none());
    }
}
