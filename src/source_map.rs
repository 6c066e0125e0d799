//! Recovers original names of minified JavaScript from its source map.
//!
//! The source map is decoded into entries that carry a name, each placed at
//! a byte offset of the generated file. Walking the syntax tree of that file,
//! every named declaration whose start lines up with an entry is mapped from
//! its minified qualified name to the original one.

use std::path::Path;

use crate::decode::{decode_vlq_segment, LineIndex};
use crate::error::{Error, Result};
use crate::js::ast::{Node, NodeKind, Program};
use crate::js::children::{child_nodes, DeclaratorVisit};
use crate::js::naming::{delimiter, exact_name};
use crate::js::parse::parse;
use crate::symbol_map::SymbolMap;

/// Source map generators place a function declaration's mapping after the
/// `function ` keyword while the parser starts the node at the keyword.
const FUNCTION_KEYWORD_SLACK: usize = "function ".len();
const DEFAULT_SLACK: usize = 1;

/// The parts of a version 3 source map that name lookup needs.
#[derive(Debug, Clone, serde_derive::Deserialize)]
struct RawSourceMap {
    #[serde(default)]
    sources: Vec<String>,
    #[serde(default)]
    names: Vec<String>,
    mappings: String,
}

/// A mapping that carries a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMapEntry {
    pub generated_offset: usize,
    pub source_file: Option<String>,
    pub source_line: i64,
    pub source_column: i64,
    pub name: String,
}

/// Named mappings ordered by their offset in the generated file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMap {
    entries: Vec<SourceMapEntry>,
}

impl SourceMap {
    /// Decodes `json` against the generated file it describes.
    pub fn parse(json: &str, generated: &[u8]) -> Result<Self> {
        let raw: RawSourceMap = serde_json::from_str(json)?;
        let lines = LineIndex::new(generated);
        let mut entries = Vec::new();

        let mut source_index = 0i64;
        let mut source_line = 0i64;
        let mut source_column = 0i64;
        let mut name_index = 0i64;
        for (generated_line, line) in raw.mappings.split(';').enumerate() {
            let mut generated_column = 0i64;
            for segment in line.split(',').filter(|s| !s.is_empty()) {
                let fields = decode_vlq_segment(segment)?;
                let Some(column_delta) = fields.first() else {
                    continue;
                };
                generated_column += column_delta;
                if fields.len() < 4 {
                    continue;
                }
                source_index += fields[1];
                source_line += fields[2];
                source_column += fields[3];
                let Some(name_delta) = fields.get(4) else {
                    continue;
                };
                name_index += name_delta;

                let Some(name) = usize::try_from(name_index)
                    .ok()
                    .and_then(|i| raw.names.get(i))
                else {
                    tracing::warn!(
                        "source map names index {name_index} is out of range, {} names available",
                        raw.names.len()
                    );
                    continue;
                };
                let source_file = usize::try_from(source_index)
                    .ok()
                    .and_then(|i| raw.sources.get(i))
                    .cloned();
                let column = usize::try_from(generated_column).unwrap_or(0);
                entries.push(SourceMapEntry {
                    generated_offset: lines.offset(generated_line, column),
                    source_file,
                    source_line,
                    source_column,
                    name: name.clone(),
                });
            }
        }
        entries.sort_by_key(|entry| entry.generated_offset);
        tracing::debug!("decoded {} named source map entries", entries.len());
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[SourceMapEntry] {
        &self.entries
    }

    /// The original name mapped at `offset`, or else at the closest entry at
    /// most `slack` bytes away. On a tie the entry before `offset` wins.
    pub fn lookup(&self, offset: usize, slack: usize) -> Option<&str> {
        let split = self
            .entries
            .partition_point(|entry| entry.generated_offset < offset);
        if let Some(entry) = self.entries.get(split) {
            if entry.generated_offset == offset {
                return Some(&entry.name);
            }
        }
        let before = split
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .filter(|entry| offset - entry.generated_offset <= slack);
        let after = self
            .entries
            .get(split)
            .filter(|entry| entry.generated_offset - offset <= slack);
        let closest = match (before, after) {
            (Some(before), Some(after))
                if after.generated_offset - offset < offset - before.generated_offset =>
            {
                Some(after)
            }
            (before, after) => before.or(after),
        };
        closest.map(|entry| entry.name.as_str())
    }
}

/// Reads a source map and the minified file it belongs to and builds the
/// minified to original symbol map.
pub fn create_symbol_map_from_source_map(source_map: &Path, generated: &Path) -> Result<SymbolMap> {
    let json = std::fs::read_to_string(source_map).map_err(|e| Error::io(source_map, e))?;
    let source = std::fs::read_to_string(generated).map_err(|e| Error::io(generated, e))?;
    let map = SourceMap::parse(&json, source.as_bytes())?;
    let program = parse(&source)?;
    Ok(build_symbol_map(&program, &map))
}

/// Maps the qualified minified name of every renamed declaration to its
/// qualified original name.
pub fn build_symbol_map(program: &Program, source_map: &SourceMap) -> SymbolMap {
    let mut symbols = SymbolMap::new();
    let top_level: Vec<&Node> = program.body.iter().collect();
    walk(&top_level, "", "", source_map, &mut symbols);
    symbols
}

fn slack(node: &Node) -> usize {
    match node.kind {
        NodeKind::FunctionDeclaration { .. } => FUNCTION_KEYWORD_SLACK,
        _ => DEFAULT_SLACK,
    }
}

/// Where the identifier declaring `node` starts. Generators that map the
/// name itself are matched there exactly.
fn name_offset(node: &Node) -> Option<usize> {
    match &node.kind {
        NodeKind::FunctionDeclaration { id: Some(id), .. }
        | NodeKind::FunctionExpression { id: Some(id), .. }
        | NodeKind::VariableDeclarator { id: Some(id), .. } => Some(id.start as usize),
        _ => None,
    }
}

fn is_declaration(node: &Node) -> bool {
    matches!(
        node.kind,
        NodeKind::FunctionDeclaration { .. }
            | NodeKind::VariableDeclaration { .. }
            | NodeKind::VariableDeclarator { .. }
    )
}

fn walk(
    nodes: &[&Node],
    minified_prefix: &str,
    original_prefix: &str,
    source_map: &SourceMap,
    symbols: &mut SymbolMap,
) {
    for &node in nodes {
        let children = child_nodes(node, DeclaratorVisit::Each);
        let minified = exact_name(node);
        let original = name_offset(node)
            .and_then(|offset| source_map.lookup(offset, 0))
            .or_else(|| source_map.lookup(node.start as usize, slack(node)));

        if let (Some(minified), Some(original)) = (minified, original) {
            if is_declaration(node) && minified != original {
                symbols.insert(
                    format!("{minified_prefix}{minified}"),
                    format!("{original_prefix}{original}"),
                );
            }
        }

        if children.is_empty() {
            continue;
        }
        let (minified_child, original_child) = match minified {
            Some(minified) => {
                let delimiter = delimiter(node, &children);
                (
                    format!("{minified_prefix}{minified}{delimiter}"),
                    format!("{original_prefix}{}{delimiter}", original.unwrap_or(minified)),
                )
            }
            None => (minified_prefix.to_string(), original_prefix.to_string()),
        };
        walk(&children, &minified_child, &original_child, source_map, symbols);
    }
}
