//! Size attribution for WebAssembly modules, straight from the binary.
//!
//! Every section becomes one record. The CODE section is further split into
//! one record per function body, numbered in the module wide function index
//! space (imported functions first) and named through the `name` custom
//! section when the module carries one.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::config::{Config, WasmNameDecoding};
use crate::decode::{read_length_prefixed_string, read_u32_le, read_u8, read_unsigned_varint};
use crate::error::{Error, Result};
use crate::record::{unused_name, SizeRecord, SymbolTree, SymbolType};

pub const WASM_MAGIC: u32 = 0x6d73_6100;
pub const WASM_VERSION: u32 = 1;

const FILE_HEADER: &str = "file header";

const CUSTOM_SECTION: u8 = 0;
const IMPORT_SECTION: u8 = 2;
const EXPORT_SECTION: u8 = 7;
const CODE_SECTION: u8 = 10;

const FUNCTION_NAMES_SUBSECTION: u8 = 1;
const FUNCREF: u8 = 0x70;

pub fn section_name(id: u8) -> String {
    let name = match id {
        0 => "CUSTOM",
        1 => "TYPE",
        2 => "IMPORT",
        3 => "FUNCTION",
        4 => "TABLE",
        5 => "MEMORY",
        6 => "GLOBAL",
        7 => "EXPORT",
        8 => "START",
        9 => "ELEMENT",
        10 => "CODE",
        11 => "DATA",
        12 => "DATACOUNT",
        13 => "TAG",
        _ => return format!("UNKNOWN({id})"),
    };
    name.to_string()
}

pub fn extract_wasm_code_size(path: &Path, config: &Config) -> Result<SymbolTree> {
    let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    let mut tree = decompose(&bytes, config)?;
    tree.record_source_file(path);
    Ok(tree)
}

/// Splits a wasm module into section, function, import and header records
/// whose sizes add up to `bytes.len()`.
pub fn decompose(bytes: &[u8], config: &Config) -> Result<SymbolTree> {
    let scan = scan_sections(bytes, config.wasm_names)?;
    Ok(scan.into_tree(bytes.len()))
}

/// A function body of the CODE section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CodeFunction {
    /// Position within the CODE section, not yet offset by the imports.
    code_index: u32,
    size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Scanned {
    Section { name: String, size: u64 },
    Function(CodeFunction),
}

#[derive(Debug, Default)]
struct ModuleScan {
    entries: Vec<Scanned>,
    function_imports: Vec<String>,
    function_exports: Vec<u32>,
    function_names: Option<HashMap<u32, String>>,
}

fn scan_sections(bytes: &[u8], decoding: WasmNameDecoding) -> Result<ModuleScan> {
    let (magic, cursor) = read_u32_le(bytes, 0)?;
    if magic != WASM_MAGIC {
        return Err(Error::BadWasmMagic(magic));
    }
    let (version, mut cursor) = read_u32_le(bytes, cursor)?;
    if version != WASM_VERSION {
        return Err(Error::BadWasmVersion(version));
    }

    let file_size = bytes.len();
    let mut scan = ModuleScan::default();
    while cursor < file_size {
        let section_start = cursor;
        let (id, next) = read_u8(bytes, cursor)?;
        let (payload_len, payload_start) = read_unsigned_varint(bytes, next)?;
        let section_end = payload_start + payload_len as usize;
        if section_end > file_size {
            return Err(Error::SectionOverrun {
                offset: section_start,
                end: section_end,
                file_size,
            });
        }

        let mut name = section_name(id);
        let mut function_bytes = 0;
        match id {
            CUSTOM_SECTION => {
                let (custom_name, next) =
                    read_length_prefixed_string(bytes, payload_start, decoding)?;
                if custom_name == "name" {
                    scan.function_names = read_function_names(bytes, next, section_end, decoding)?;
                }
                name = format!("CUSTOM/\"{custom_name}\"");
            }
            IMPORT_SECTION => {
                scan.function_imports
                    .extend(read_function_imports(bytes, payload_start, decoding)?);
            }
            EXPORT_SECTION => {
                scan.function_exports
                    .extend(read_function_exports(bytes, payload_start, decoding)?);
            }
            CODE_SECTION => {
                let functions = read_code_section(bytes, payload_start, section_end)?;
                function_bytes = functions.iter().map(|f| f.size).sum();
                scan.entries
                    .extend(functions.into_iter().map(Scanned::Function));
            }
            _ => {}
        }

        let size = (section_end - section_start) as u64 - function_bytes;
        tracing::debug!("wasm section {name} at {section_start}: {size} bytes");
        scan.entries.push(Scanned::Section { name, size });
        cursor = section_end;
    }
    Ok(scan)
}

fn read_code_section(bytes: &[u8], cursor: usize, section_end: usize) -> Result<Vec<CodeFunction>> {
    let (count, mut cursor) = read_unsigned_varint(bytes, cursor)?;
    // Every body takes at least one byte, whatever the count claims.
    let capacity = (count as usize).min(section_end.saturating_sub(cursor));
    let mut functions = Vec::with_capacity(capacity);
    for code_index in 0..count {
        let start = cursor;
        let (body_len, body_start) = read_unsigned_varint(bytes, cursor)?;
        let end = body_start + body_len as usize;
        if end > section_end {
            return Err(Error::SectionOverrun {
                offset: start,
                end,
                file_size: bytes.len(),
            });
        }
        functions.push(CodeFunction {
            code_index,
            size: (end - start) as u64,
        });
        cursor = end;
    }
    Ok(functions)
}

/// Reads the function names sub-section of the `name` custom section. Every
/// other sub-section is skipped.
fn read_function_names(
    bytes: &[u8],
    cursor: usize,
    section_end: usize,
    decoding: WasmNameDecoding,
) -> Result<Option<HashMap<u32, String>>> {
    let mut names = HashMap::new();
    let mut cursor = cursor;
    while cursor < section_end {
        let (subsection_id, next) = read_u8(bytes, cursor)?;
        let (subsection_len, next) = read_unsigned_varint(bytes, next)?;
        cursor = next;
        if subsection_id != FUNCTION_NAMES_SUBSECTION {
            cursor += subsection_len as usize;
            continue;
        }
        let (count, next) = read_unsigned_varint(bytes, cursor)?;
        cursor = next;
        for _ in 0..count {
            let (index, next) = read_unsigned_varint(bytes, cursor)?;
            let (name, next) = read_length_prefixed_string(bytes, next, decoding)?;
            names.insert(index, name);
            cursor = next;
        }
    }
    if cursor != section_end {
        return Err(Error::MalformedNameSection {
            expected: section_end,
            actual: cursor,
        });
    }
    Ok((!names.is_empty()).then_some(names))
}

/// Names of the imported functions, in import order. Imports of other kinds
/// are skipped.
fn read_function_imports(
    bytes: &[u8],
    cursor: usize,
    decoding: WasmNameDecoding,
) -> Result<Vec<String>> {
    let (count, mut cursor) = read_unsigned_varint(bytes, cursor)?;
    let mut names = Vec::new();
    for _ in 0..count {
        let (_module, next) = read_length_prefixed_string(bytes, cursor, decoding)?;
        let (name, next) = read_length_prefixed_string(bytes, next, decoding)?;
        let (kind, next) = read_u8(bytes, next)?;
        cursor = match kind {
            // func: type index
            0x00 => {
                names.push(name);
                read_unsigned_varint(bytes, next)?.1
            }
            // table: element type, then limits
            0x01 => {
                let (element_type, next) = read_u8(bytes, next)?;
                if element_type != FUNCREF {
                    return Err(Error::BadTableElementType {
                        offset: next - 1,
                        found: element_type,
                    });
                }
                skip_limits(bytes, next)?
            }
            0x02 => skip_limits(bytes, next)?,
            // global: value type and mutability
            0x03 => next + 2,
            // tag: attribute and type index
            0x04 => read_unsigned_varint(bytes, next + 1)?.1,
            other => {
                tracing::warn!(
                    "unknown wasm import kind 0x{other:02x} at byte offset {}, ignoring the remaining imports",
                    next - 1
                );
                break;
            }
        };
    }
    Ok(names)
}

fn skip_limits(bytes: &[u8], cursor: usize) -> Result<usize> {
    let (flag, cursor) = read_u8(bytes, cursor)?;
    let (_min, cursor) = read_unsigned_varint(bytes, cursor)?;
    match flag {
        0x00 => Ok(cursor),
        0x01 | 0x03 => Ok(read_unsigned_varint(bytes, cursor)?.1),
        found => Err(Error::BadLimitsFlag {
            offset: cursor,
            found,
        }),
    }
}

/// Function indices named in the EXPORT section.
fn read_function_exports(
    bytes: &[u8],
    cursor: usize,
    decoding: WasmNameDecoding,
) -> Result<Vec<u32>> {
    let (count, mut cursor) = read_unsigned_varint(bytes, cursor)?;
    let mut indices = Vec::new();
    for _ in 0..count {
        let (_name, next) = read_length_prefixed_string(bytes, cursor, decoding)?;
        let (kind, next) = read_u8(bytes, next)?;
        let (index, next) = read_unsigned_varint(bytes, next)?;
        if kind == 0x00 {
            indices.push(index);
        }
        cursor = next;
    }
    Ok(indices)
}

impl ModuleScan {
    fn into_tree(self, file_size: usize) -> SymbolTree {
        let num_imports = self.function_imports.len() as u32;
        let exports: HashSet<u32> = self.function_exports.into_iter().collect();
        let names = self.function_names.unwrap_or_default();
        // Section and header records own their keys; functions and imports
        // with a clashing name are suffixed instead.
        let mut reserved: HashSet<String> = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                Scanned::Section { name, .. } => Some(name.clone()),
                Scanned::Function(_) => None,
            })
            .collect();
        reserved.insert(FILE_HEADER.to_string());

        let mut tree = SymbolTree::new();
        for entry in self.entries {
            match entry {
                Scanned::Section { name, size } => match tree.get_mut(&name) {
                    Some(existing) => existing.size += size,
                    None => tree.insert(SizeRecord::new("", &name, SymbolType::Section, size)),
                },
                Scanned::Function(function) => {
                    let index = function.code_index + num_imports;
                    let kind = if exports.contains(&index) {
                        SymbolType::Export
                    } else {
                        SymbolType::Function
                    };
                    let numeric = index.to_string();
                    let name = names.get(&index).unwrap_or(&numeric);
                    let key = unused_name(name, index, |key| {
                        tree.contains(key) || reserved.contains(key)
                    });
                    let mut record = SizeRecord::new("", &key, kind, function.size)
                        .with_ordinal(u64::from(index));
                    record.minified_name = numeric;
                    tree.insert(record);
                }
            }
        }

        for (index, import) in (0u32..).zip(&self.function_imports) {
            let key = unused_name(import, index, |key| {
                tree.contains(key) || reserved.contains(key)
            });
            tree.insert(
                SizeRecord::new("", &key, SymbolType::Import, 0).with_ordinal(u64::from(index)),
            );
        }

        let header = (file_size as u64).saturating_sub(tree.total_size());
        if header > 0 {
            tree.insert(SizeRecord::new(
                "",
                FILE_HEADER,
                SymbolType::WasmHeader,
                header,
            ));
        }
        tracing::debug!(
            "wasm module: {} function imports, {} function exports, {} records",
            num_imports,
            exports.len(),
            tree.len()
        );
        tree
    }
}
