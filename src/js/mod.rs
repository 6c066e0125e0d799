//! Size attribution for minified JavaScript.

pub mod ast;
pub mod children;
pub mod naming;
pub mod parse;
pub mod size_tree;

pub use size_tree::{build_size_tree, extract_javascript_code_size, JsSizes, SymbolDump};
