//! JSON front-end.
//!
//! A document is either `{"scene": [node, ...]}`, a bare array of nodes, or a
//! single node. A node is `{"class": tag, "props": {...}, "children": [...]}`;
//! `props` and `children` are optional.

use serde_json::{Map, Value};

use crate::error::DocumentError;

use super::Node;

pub fn parse(src: &str) -> Result<Vec<Node>, DocumentError> {
    let value: Value = serde_json::from_str(src)?;
    match &value {
        Value::Object(object) => match object.get("scene") {
            Some(Value::Array(nodes)) => Ok(nodes_from(nodes)),
            Some(_) => Err(DocumentError::Shape("\"scene\" must be an array".to_string())),
            None if object.contains_key("class") => Ok(node_from(object).into_iter().collect()),
            None => Err(DocumentError::Shape("expected a \"scene\" array or a \"class\" node".to_string())),
        },
        Value::Array(nodes) => Ok(nodes_from(nodes)),
        _ => Err(DocumentError::Shape("top level must be an object or array".to_string())),
    }
}

fn nodes_from(values: &[Value]) -> Vec<Node> {
    values
        .iter()
        .filter_map(|value| match value {
            Value::Object(object) => node_from(object),
            other => {
                log::warn!("Skipping non-object scene node {}", other);
                None
            }
        })
        .collect()
}

fn node_from(object: &Map<String, Value>) -> Option<Node> {
    let Some(class) = object.get("class").and_then(Value::as_str) else {
        log::warn!("Skipping scene node without a \"class\" string");
        return None;
    };
    let mut node = Node::new(class);

    match object.get("props") {
        Some(Value::Object(props)) => {
            for (key, value) in props {
                match prop_string(value) {
                    Some(text) => {
                        node.props.insert(key.clone(), text);
                    }
                    None => log::warn!("<{}> property {} has an unsupported value {}", class, key, value),
                }
            }
        }
        Some(Value::Null) | None => {}
        Some(other) => log::warn!("<{}> \"props\" is not an object: {}", class, other),
    }

    match object.get("children") {
        Some(Value::Array(children)) => node.children = nodes_from(children),
        Some(Value::Null) | None => {}
        Some(other) => log::warn!("<{}> \"children\" is not an array: {}", class, other),
    }
    Some(node)
}

/// Property values in the same textual form the markup front-end produces.
fn prop_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Number(n) => Some(n.to_string()),
                Value::String(s) => Some(s.clone()),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(|parts| parts.join(" ")),
        Value::Null | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_array() {
        let nodes = parse(
            r#"{"scene": [
                {"class": "box", "props": {"w": 2, "h": 3.5, "name": "crate"},
                 "children": [{"class": "translate", "props": {"x": -1}}]},
                {"class": "plane"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].name, "box");
        assert_eq!(nodes[0].get("w"), Some("2"));
        assert_eq!(nodes[0].get("h"), Some("3.5"));
        assert_eq!(nodes[0].get("name"), Some("crate"));
        assert_eq!(nodes[0].children[0].get("x"), Some("-1"));
        assert!(nodes[1].props.is_empty());
    }

    #[test]
    fn test_single_node_and_bare_array() {
        let nodes = parse(r#"{"class":"box","props":{"w":2,"h":3,"d":4}}"#).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].get("d"), Some("4"));

        let nodes = parse(r#"[{"class":"cone"},{"class":"cylinder"}]"#).unwrap();
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_array_props_become_lists() {
        let nodes = parse(r#"{"class":"set","props":{"value":[1, 0.5, "2"]}}"#).unwrap();
        assert_eq!(nodes[0].get("value"), Some("1 0.5 2"));
    }

    #[test_log::test]
    fn test_bad_nodes_are_skipped() {
        let nodes = parse(r#"{"scene": [42, {"props": {}}, {"class": "box", "props": {"w": null}}]}"#).unwrap();
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].get("w").is_none());
    }

    #[test]
    fn test_shape_errors() {
        assert!(matches!(parse(r#"{"scene": {}}"#), Err(DocumentError::Shape(_))));
        assert!(matches!(parse(r#"{"meshes": []}"#), Err(DocumentError::Shape(_))));
        assert!(matches!(parse("3"), Err(DocumentError::Shape(_))));
        assert!(matches!(parse("{"), Err(DocumentError::Json(_))));
    }
}
