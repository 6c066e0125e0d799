//! Runs the right front end for each input file and merges the results.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::config::Config;
use crate::error::Result;
use crate::js::{extract_javascript_code_size, SymbolDump};
use crate::record::SymbolTree;
use crate::report::Report;
use crate::wasm::extract_wasm_code_size;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    JavaScript,
    Wasm,
}

impl InputKind {
    /// Chooses by file extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "js" => Some(InputKind::JavaScript),
            "wasm" => Some(InputKind::Wasm),
            _ => None,
        }
    }
}

/// Syntax tree walks recurse once per nesting level, so deeply nested or
/// long chained expressions need far more than rayon's default stack.
const ANALYSIS_STACK_SIZE: usize = 256 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct FileAnalysis {
    pub tree: SymbolTree,
    pub dumps: Vec<SymbolDump>,
}

#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub report: Report,
    pub dumps: Vec<SymbolDump>,
}

/// Sizes a single file. Files of unknown kind are skipped.
pub fn analyze_file(path: &Path, config: &Config) -> Result<Option<FileAnalysis>> {
    let Some(kind) = InputKind::from_path(path) else {
        tracing::warn!("skipping {path:?}: neither a .js nor a .wasm file");
        return Ok(None);
    };
    tracing::debug!("analyzing {path:?} as {kind:?}");
    let (tree, dumps) = match kind {
        InputKind::JavaScript => {
            let sizes = extract_javascript_code_size(path, config)?;
            (sizes.tree, sizes.dumps)
        }
        InputKind::Wasm => (extract_wasm_code_size(path, config)?, Vec::new()),
    };
    Ok(Some(FileAnalysis { tree, dumps }))
}

/// Sizes every file, in parallel, and merges the results in input order.
/// The first file that fails aborts the whole run.
pub fn analyze(paths: &[PathBuf], config: &Config) -> Result<Analysis> {
    let pool = rayon::ThreadPoolBuilder::new()
        .stack_size(ANALYSIS_STACK_SIZE)
        .build()?;
    let files = pool.install(|| {
        paths
            .par_iter()
            .map(|path| analyze_file(path, config))
            .collect::<Result<Vec<_>>>()
    })?;

    let mut dumps = Vec::new();
    let mut trees = Vec::new();
    for file in files.into_iter().flatten() {
        dumps.extend(file.dumps);
        trees.push(file.tree);
    }
    Ok(Analysis {
        report: Report::merge(trees),
        dumps,
    })
}
