use std::collections::HashMap;

use crate::js::naming::split_prefix;
use crate::record::SizeRecord;

/// Name used for files whose records carry no source file.
const UNKNOWN_FILE: &str = "(unknown)";

/// One level of the treemap. `size` includes the bytes of every descendant.
#[derive(Debug, Default)]
pub struct DataNode<'a> {
    pub size: u64,
    /// How the `size` bytes is distributed among the children.
    pub sub_components: HashMap<&'a str, DataNode<'a>>,
}

impl<'a> DataNode<'a> {
    /// Adds `size` bytes to this node and to every node along `path`,
    /// creating missing nodes.
    pub fn add(&mut self, path: &[&'a str], size: u64) {
        self.size += size;
        if let Some((first, rest)) = path.split_first() {
            self.sub_components.entry(*first).or_default().add(rest, size);
        }
    }

    /// Bytes of this node not accounted to any child.
    pub fn self_size(&self) -> u64 {
        let children: u64 = self.sub_components.values().map(|c| c.size).sum();
        self.size.saturating_sub(children)
    }

    /// Groups records by source file, then by the segments of their
    /// qualified prefix. `display_names` holds the name to show for each
    /// record, in the same order.
    pub fn from_records(records: &'a [SizeRecord], display_names: &'a [String]) -> Self {
        let mut root = DataNode::default();
        for (record, display_name) in records.iter().zip(display_names) {
            let file = if record.source_file.is_empty() {
                UNKNOWN_FILE
            } else {
                record.source_file.as_str()
            };
            let leaf = display_name
                .strip_prefix(record.prefix.as_str())
                .unwrap_or(display_name);

            let mut path = vec![file];
            path.extend(split_prefix(&record.prefix));
            path.push(leaf);
            root.add(&path, record.size);
        }
        root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SymbolType;

    #[test]
    fn nested_records_build_a_tree() {
        let mut records = vec![
            SizeRecord::new("", "foo", SymbolType::Function, 16),
            SizeRecord::new("foo/", "bar", SymbolType::Var, 23),
            SizeRecord::new("", "CODE", SymbolType::Section, 5),
        ];
        records[2].source_file = "a.wasm".to_string();
        records[0].source_file = "a.js".to_string();
        records[1].source_file = "a.js".to_string();
        let names: Vec<String> = records.iter().map(|r| r.name.clone()).collect();

        let root = DataNode::from_records(&records, &names);
        assert_eq!(root.size, 44);
        let js = &root.sub_components["a.js"];
        assert_eq!(js.size, 39);
        let foo = &js.sub_components["foo"];
        assert_eq!(foo.size, 39);
        assert_eq!(foo.self_size(), 16);
        assert_eq!(foo.sub_components["bar"].size, 23);
        assert_eq!(root.sub_components["a.wasm"].sub_components["CODE"].size, 5);
    }
}
