use serde::{Deserialize, Serialize};

use crate::node::DataNode;

/// Leaf holding the bytes a node owns beside its children.
pub const SELF_LEAF: &str = "(self)";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
enum NodeKind {
    Value(u64),
    Children(Vec<Node>),
}

/// A node in the shape `d3.hierarchy()` expects.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    #[serde(flatten)]
    kind: NodeKind,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        match &self.kind {
            NodeKind::Value(size) => *size,
            NodeKind::Children(children) => children.iter().map(Node::size).sum(),
        }
    }

    pub fn children(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Value(_) => &[],
            NodeKind::Children(children) => children,
        }
    }

    /// Follows `/` separated child names down from this node.
    pub fn find(&self, path: &str) -> Option<&Node> {
        let mut current = self;
        for component in path.split('/').filter(|c| !c.is_empty()) {
            current = current.children().iter().find(|c| c.name == component)?;
        }
        Some(current)
    }
}

fn node_to_node(name: String, data_node: &DataNode, max_depth: u64) -> Node {
    if data_node.sub_components.is_empty() || max_depth == 0 {
        return Node {
            name,
            kind: NodeKind::Value(data_node.size),
        };
    }

    let mut children: Vec<Node> = data_node
        .sub_components
        .iter()
        .map(|(name, data_node)| node_to_node(name.to_string(), data_node, max_depth - 1))
        .collect();
    let self_size = data_node.self_size();
    if self_size > 0 {
        children.push(Node {
            name: SELF_LEAF.to_string(),
            kind: NodeKind::Value(self_size),
        });
    }
    children.sort_by(|a, b| b.size().cmp(&a.size()).then_with(|| a.name.cmp(&b.name)));
    Node {
        name,
        kind: NodeKind::Children(children),
    }
}

pub fn export(root: &DataNode, max_depth: u64) -> Node {
    node_to_node("root".to_string(), root, max_depth)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_a_d3_hierarchy() {
        let mut root = DataNode::default();
        root.add(&["app.wasm", "CODE"], 3);
        root.add(&["app.wasm", "main"], 5);

        let json = serde_json::to_value(export(&root, u64::MAX)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "root",
                "children": [{
                    "name": "app.wasm",
                    "children": [
                        { "name": "main", "value": 5 },
                        { "name": "CODE", "value": 3 }
                    ]
                }]
            })
        );

        let parsed: Node = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, export(&root, u64::MAX));
    }

    #[test]
    fn self_bytes_get_their_own_leaf() {
        let mut root = DataNode::default();
        root.add(&["app.js", "foo"], 16);
        root.add(&["app.js", "foo", "bar"], 23);
        root.add(&["app.js", "baz"], 1);

        let node = export(&root, u64::MAX);
        assert_eq!(node.size(), 40);
        let foo = node.find("app.js/foo").unwrap();
        let names: Vec<_> = foo.children().iter().map(|c| (c.name(), c.size())).collect();
        assert_eq!(names, vec![("bar", 23), (SELF_LEAF, 16)]);
        assert!(node.find("app.js/missing").is_none());
    }

    #[test]
    fn max_depth_collapses_subtrees() {
        let mut root = DataNode::default();
        root.add(&["app.js", "foo", "bar"], 23);
        let node = export(&root, 1);
        let file = node.find("app.js").unwrap();
        assert!(file.children().is_empty());
        assert_eq!(file.size(), 23);
    }
}
