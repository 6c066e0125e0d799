//! Turns one parsed JavaScript file into a flat list of named size records.

use std::path::Path;

use super::ast::{Node, NodeKind};
use super::children::{byte_range, child_bytes, child_nodes, DeclaratorVisit};
use super::naming::{
    child_prefix, direct_name, find_unique_name, has_nameable_descendant, is_always_expanded,
    node_type, Naming,
};
use super::parse::parse;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::record::{unused_name, SizeRecord, SymbolTree, SymbolType};

/// Longest code preview kept verbatim in a record description.
const DESC_MAX_CHARS: usize = 32;
/// Characters kept from a longer preview before the ellipsis.
const DESC_TRUNCATED_CHARS: usize = 29;

/// The source text of a symbol requested with `--dump`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolDump {
    pub name: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsSizes {
    pub tree: SymbolTree,
    pub dumps: Vec<SymbolDump>,
}

/// Reads, parses and sizes one JavaScript file.
pub fn extract_javascript_code_size(path: &Path, config: &Config) -> Result<JsSizes> {
    let source = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let mut sizes = build_size_tree(&source, config)?;
    sizes.tree.record_source_file(path);
    Ok(sizes)
}

/// Sizes a JavaScript program held in memory.
///
/// The sizes of the returned records add up to exactly `source.len()`. Bytes
/// that no record claims (whitespace between statements, comments, trailing
/// syntax) end up in a final `unclassified` record.
pub fn build_size_tree(source: &str, config: &Config) -> Result<JsSizes> {
    let program = parse(source)?;
    let mut builder = SizeTreeBuilder {
        source,
        threshold: config.expansion_threshold(source.len()),
        config,
        code_blocks: 0,
        dumps: Vec::new(),
    };

    let top_level: Vec<&Node> = program.body.iter().collect();
    let mut tree = builder.collect(&top_level, None, "");

    let file_size = source.len() as u64;
    let unclassified = file_size.saturating_sub(tree.total_size());
    if unclassified > 0 {
        let name = unused_name("unclassified", SymbolType::Other, |name| tree.contains(name));
        tree.insert(SizeRecord::new("", &name, SymbolType::Other, unclassified));
    }
    tracing::debug!(
        "sized {} bytes of JavaScript into {} records, {} bytes unclassified",
        file_size,
        tree.len(),
        unclassified
    );

    Ok(JsSizes {
        tree,
        dumps: builder.dumps,
    })
}

struct SizeTreeBuilder<'a> {
    source: &'a str,
    config: &'a Config,
    threshold: f64,
    /// Numbers anonymous top level code blocks in the order they are emitted.
    code_blocks: usize,
    dumps: Vec<SymbolDump>,
}

impl SizeTreeBuilder<'_> {
    fn collect(&mut self, nodes: &[&Node], parent: Option<&Node>, prefix: &str) -> SymbolTree {
        let mut records = SymbolTree::new();
        for &node in nodes {
            self.collect_node(node, parent, prefix, &mut records);
        }
        records
    }

    fn collect_node(
        &mut self,
        node: &Node,
        parent: Option<&Node>,
        prefix: &str,
        records: &mut SymbolTree,
    ) {
        let visit = DeclaratorVisit::Collapsed;
        let children = child_nodes(node, visit);
        let mut kind = node_type(node);
        let mut size = byte_range(node, parent);

        let direct = direct_name(node);
        let mut name = direct.map(|name_ref| name_ref.name);
        let mut expand = self.is_large_enough_to_expand(node)
            && has_nameable_descendant(&children, direct.map(|name_ref| name_ref.start), visit);

        if name.is_none() {
            match find_unique_name(&children, visit) {
                Naming::Name {
                    name: unique,
                    kind: unique_kind,
                } => {
                    name = Some(unique);
                    kind = unique_kind;
                    expand = false;
                }
                Naming::NoName => expand = false,
                Naming::Ambiguous => {}
            }
        }
        if is_always_expanded(node) {
            expand = true;
            name = None;
        }

        if expand {
            let child_prefix = child_prefix(prefix, name, node, &children);
            let child_records = self.collect(&children, Some(node), &child_prefix);
            size = size.saturating_sub(child_records.total_size());
            records.extend(child_records);
        }

        if matches!(
            node.kind,
            NodeKind::ObjectExpression { .. } | NodeKind::FunctionExpression { .. }
        ) {
            return;
        }

        let record = match name {
            Some(name) if kind != SymbolType::Code || prefix.is_empty() => {
                SizeRecord::new(prefix, name, kind, size)
            }
            None if kind == SymbolType::Code && prefix.is_empty() => {
                let self_name = format!("code#{}", self.code_blocks);
                self.code_blocks += 1;
                SizeRecord::new(prefix, &self_name, kind, size)
                    .with_desc(Some(describe(self.text_of(node))))
            }
            _ => return,
        };

        if self.config.dump.contains(&record.name) {
            tracing::debug!("capturing the contents of symbol {}", record.name);
            self.dumps.push(SymbolDump {
                name: record.name.clone(),
                text: self.text_of(node).to_string(),
            });
        }
        records.insert(record);
    }

    fn is_large_enough_to_expand(&self, node: &Node) -> bool {
        child_bytes(node, DeclaratorVisit::Collapsed) as f64 > self.threshold
    }

    fn text_of(&self, node: &Node) -> &str {
        self.source
            .get(node.start as usize..node.end as usize)
            .unwrap_or_default()
    }
}

/// A short quoted preview of a code block, on a single line.
fn describe(code: &str) -> String {
    let code = code.trim();
    if code.chars().count() > DESC_MAX_CHARS {
        let head: String = code.chars().take(DESC_TRUNCATED_CHARS).collect();
        format!("\"{}...\"", head.replace('\n', " "))
    } else {
        format!("\"{}\"", code.replace('\n', " "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(source: &str) -> Vec<(String, SymbolType, u64)> {
        build_size_tree(source, &Config::default())
            .unwrap()
            .tree
            .iter()
            .map(|r| (r.name.clone(), r.kind, r.size))
            .collect()
    }

    #[test]
    fn single_var() {
        assert_eq!(sizes("var foo;"), vec![("foo".into(), SymbolType::Var, 8)]);
        assert_eq!(sizes("var foo=3;"), vec![("foo".into(), SymbolType::Var, 10)]);
        assert_eq!(
            sizes("var foo = \"var foo\";"),
            vec![("foo".into(), SymbolType::Var, 20)]
        );
    }

    #[test]
    fn small_object_literals_stay_whole() {
        assert_eq!(sizes("var foo = {};"), vec![("foo".into(), SymbolType::Var, 13)]);
        assert_eq!(sizes("var foo = {a:1};"), vec![("foo".into(), SymbolType::Var, 16)]);
    }

    #[test]
    fn anonymous_code_gets_numbered_with_preview() {
        let tree = build_size_tree("foo();", &Config::default()).unwrap().tree;
        let names: Vec<_> = tree.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["code#0", "code#1", "code#2"]);
        assert_eq!(tree.get("code#0").unwrap().desc.as_deref(), Some("\"foo\""));
        assert_eq!(tree.get("code#2").unwrap().desc.as_deref(), Some("\"foo();\""));
        assert_eq!(tree.total_size(), 6);
    }

    #[test]
    fn long_previews_are_truncated() {
        assert_eq!(describe("  a\nb  "), "\"a b\"");
        let long = "x".repeat(40);
        assert_eq!(describe(&long), format!("\"{}...\"", "x".repeat(29)));
        assert_eq!(describe(&"y".repeat(32)), format!("\"{}\"", "y".repeat(32)));
    }

    #[test]
    fn whitespace_is_unclassified() {
        let tree = build_size_tree("var a;\n\n\nvar b;\n", &Config::default())
            .unwrap()
            .tree;
        assert_eq!(tree.get("unclassified").unwrap().size, 4);
        assert_eq!(tree.get("unclassified").unwrap().kind, SymbolType::Other);
        assert_eq!(tree.total_size(), 16);
    }

    #[test]
    fn declared_unclassified_keeps_its_bytes() {
        let source = "var unclassified=1;\n\n";
        let tree = build_size_tree(source, &Config::default()).unwrap().tree;
        assert_eq!(tree.get("unclassified").unwrap().kind, SymbolType::Var);
        assert_eq!(tree.get("unclassified").unwrap().size, 19);
        assert_eq!(tree.get("unclassified#other").unwrap().size, 2);
        assert_eq!(tree.total_size(), source.len() as u64);
    }

    #[test]
    fn dumps_are_captured() {
        let config = Config {
            dump: vec!["foo".to_string()],
            ..Config::default()
        };
        let sizes = build_size_tree("var x;function foo(){}", &config).unwrap();
        assert_eq!(
            sizes.dumps,
            vec![SymbolDump {
                name: "foo".to_string(),
                text: "function foo(){}".to_string(),
            }]
        );
    }

    #[test]
    fn high_threshold_keeps_nodes_whole() {
        let config = Config::default().with_expand_bytes(1000);
        let tree = build_size_tree("function foo(){var longVariableName=4;}", &config)
            .unwrap()
            .tree;
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get("foo").unwrap().size, 39);
    }
}
