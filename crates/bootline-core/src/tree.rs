//! Dotted-path access over JSON trees.
//!
//! Paths are split on `.`; empty segments are ignored, so `""` addresses the
//! root. A numeric segment indexes into an array when the node is one.

use serde_json::{Map, Value};

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|segment| !segment.is_empty())
}

fn array_index(node: &Value, segment: &str) -> Option<usize> {
    match node {
        Value::Array(items) => segment.parse::<usize>().ok().filter(|i| *i < items.len()),
        _ => None,
    }
}

/// Look up `path` in `tree`.
pub fn get<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path).try_fold(tree, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Write `value` at `path`, creating intermediate objects as needed.
///
/// Scalars found on the way are replaced by objects, so this never fails.
pub fn set(tree: &mut Value, path: &str, value: Value) {
    let parts: Vec<&str> = segments(path).collect();
    let Some((last, parents)) = parts.split_last() else {
        *tree = value;
        return;
    };

    let mut node = tree;
    for segment in parents {
        node = child_mut(node, segment);
    }
    *child_mut(node, last) = value;
}

fn child_mut<'a>(node: &'a mut Value, segment: &str) -> &'a mut Value {
    if let Some(i) = array_index(node, segment) {
        return &mut node[i];
    }
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    &mut node[segment]
}
