use std::fmt;
use std::path::Path;

use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde_derive::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SymbolType {
    Function,
    Var,
    Code,
    Other,
    Section,
    Import,
    Export,
    WasmHeader,
}

impl SymbolType {
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolType::Function => "function",
            SymbolType::Var => "var",
            SymbolType::Code => "code",
            SymbolType::Other => "other",
            SymbolType::Section => "section",
            SymbolType::Import => "import",
            SymbolType::Export => "export",
            SymbolType::WasmHeader => "wasmHeader",
        }
    }
}

impl fmt::Display for SymbolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named, byte-sized entry of a size report.
#[derive(Debug, Clone, PartialEq, Eq, serde_derive::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeRecord {
    /// Fully qualified name, `prefix` followed by `self_name`.
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SymbolType,
    pub size: u64,
    /// Qualified name of the enclosing scope including its trailing delimiter.
    pub prefix: String,
    pub self_name: String,
    /// `self_name` as it appears in the analyzed file, before any demangling.
    pub minified_name: String,
    /// Preview of the source text, only set for anonymous code blocks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    /// Base name of the file the record was taken from.
    pub source_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<u64>,
}

impl SizeRecord {
    pub fn new(prefix: &str, self_name: &str, kind: SymbolType, size: u64) -> Self {
        Self {
            name: format!("{prefix}{self_name}"),
            kind,
            size,
            prefix: prefix.to_string(),
            self_name: self_name.to_string(),
            minified_name: self_name.to_string(),
            desc: None,
            source_file: String::new(),
            ordinal: None,
        }
    }

    pub fn with_desc(mut self, desc: Option<String>) -> Self {
        self.desc = desc;
        self
    }

    pub fn with_ordinal(mut self, ordinal: u64) -> Self {
        self.ordinal = Some(ordinal);
        self
    }
}

/// `name` if it is not `taken`, else `name#tag`, followed by further `#n`
/// suffixes until a free key is found.
pub fn unused_name(name: &str, tag: impl fmt::Display, taken: impl Fn(&str) -> bool) -> String {
    if !taken(name) {
        return name.to_string();
    }
    let tagged = format!("{name}#{tag}");
    let mut candidate = tagged.clone();
    let mut n = 1;
    while taken(&candidate) {
        candidate = format!("{tagged}#{n}");
        n += 1;
    }
    candidate
}

/// Records of one input file keyed by their qualified name, in the order they
/// were produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTree {
    records: IndexMap<String, SizeRecord>,
}

impl SymbolTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record under its qualified name. A record that already exists
    /// under that name is replaced in place.
    pub fn insert(&mut self, record: SizeRecord) {
        self.records.insert(record.name.clone(), record);
    }

    pub fn get(&self, name: &str) -> Option<&SizeRecord> {
        self.records.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut SizeRecord> {
        self.records.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SizeRecord> {
        self.records.values()
    }

    /// Moves every record of `other` into this tree.
    pub fn extend(&mut self, other: SymbolTree) {
        self.records.extend(other.records);
    }

    pub fn total_size(&self) -> u64 {
        self.records.values().map(|r| r.size).sum()
    }

    /// Stamps every record with the base name of `path`.
    pub fn record_source_file(&mut self, path: &Path) {
        let file_name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        for record in self.records.values_mut() {
            record.source_file = file_name.clone();
        }
    }

    pub fn into_records(self) -> impl Iterator<Item = SizeRecord> {
        self.records.into_values()
    }
}

impl FromIterator<SizeRecord> for SymbolTree {
    fn from_iter<I: IntoIterator<Item = SizeRecord>>(iter: I) -> Self {
        let mut tree = SymbolTree::new();
        for record in iter {
            tree.insert(record);
        }
        tree
    }
}
