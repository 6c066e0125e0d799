//! Attributes every byte of a minified JavaScript file or a WebAssembly
//! module to a named symbol.
//!
//! JavaScript is parsed and its syntax tree is split into named,
//! non-overlapping regions. Wasm modules are decomposed section by section,
//! with the CODE section split per function. Minified names can be mapped
//! back to their originals with a symbol map, which in turn can be built from
//! a source map.

pub mod analysis;
pub mod config;
pub mod decode;
pub mod error;
pub mod exporters;
pub mod js;
pub mod node;
pub mod record;
pub mod report;
pub mod source_map;
pub mod symbol_map;
pub mod ui;
pub mod wasm;

pub use analysis::{analyze, Analysis};
pub use config::{Config, WasmNameDecoding};
pub use error::{Error, Result};
pub use record::{SizeRecord, SymbolTree, SymbolType};
pub use report::Report;
pub use symbol_map::SymbolMap;
