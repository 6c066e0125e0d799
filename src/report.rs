//! Merges per-file results into one ordered report and renders it.

use std::fmt::Write as _;

use indexmap::IndexMap;

use crate::error::Result;
use crate::record::{SizeRecord, SymbolTree};
use crate::symbol_map::SymbolMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    records: Vec<SizeRecord>,
}

#[derive(serde_derive::Serialize)]
#[serde(rename_all = "camelCase")]
struct DisplayRecord<'r> {
    #[serde(flatten)]
    record: &'r SizeRecord,
    display_name: String,
}

impl Report {
    /// Merges trees in the order given. A name that appears in several trees
    /// keeps its first position but takes the value from the last tree.
    /// Records are then ordered by ordinal, records without one counting as
    /// zero; the sort is stable so ties keep merge order.
    pub fn merge(trees: impl IntoIterator<Item = SymbolTree>) -> Self {
        let mut merged: IndexMap<String, SizeRecord> = IndexMap::new();
        for tree in trees {
            for record in tree.into_records() {
                merged.insert(record.name.clone(), record);
            }
        }
        let mut records: Vec<SizeRecord> = merged.into_values().collect();
        records.sort_by_key(|record| record.ordinal.unwrap_or(0));
        Self { records }
    }

    pub fn records(&self) -> &[SizeRecord] {
        &self.records
    }

    pub fn total_size(&self) -> u64 {
        self.records.iter().map(|r| r.size).sum()
    }

    /// The name shown for `record`. Only the last segment is ever replaced
    /// through `symbols`, the prefix stays as it was computed.
    pub fn display_name(record: &SizeRecord, symbols: &SymbolMap) -> String {
        if let Some(original) = symbols.get(&record.name) {
            if record.prefix.is_empty() {
                return original.to_string();
            }
            let leaf = original.rsplit(['.', '/']).next().unwrap_or(original);
            return format!("{}{leaf}", record.prefix);
        }
        if let Some(original) = symbols.get(&record.self_name) {
            return format!("{}{original}", record.prefix);
        }
        record.name.clone()
    }

    pub fn display_names(&self, symbols: &SymbolMap) -> Vec<String> {
        self.records
            .iter()
            .map(|record| Self::display_name(record, symbols))
            .collect()
    }

    /// One `file/type name[=desc]: size` line per record and a total.
    pub fn render_text(&self, symbols: &SymbolMap) -> String {
        let mut out = String::new();
        for record in &self.records {
            let _ = write!(
                out,
                "{}/{} {}",
                record.source_file,
                record.kind,
                Self::display_name(record, symbols)
            );
            if let Some(desc) = &record.desc {
                let _ = write!(out, "={desc}");
            }
            let _ = writeln!(out, ": {}", record.size);
        }
        let _ = writeln!(out, "Total: {} bytes", self.total_size());
        out
    }

    pub fn to_json(&self, symbols: &SymbolMap) -> Result<String> {
        let records: Vec<DisplayRecord> = self
            .records
            .iter()
            .map(|record| DisplayRecord {
                record,
                display_name: Self::display_name(record, symbols),
            })
            .collect();
        Ok(serde_json::to_string_pretty(&records)?)
    }
}
