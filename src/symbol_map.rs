//! Minified to original name mappings and their `minified:original` text form.
//!
//! Original names may contain any byte. In the text form every byte outside
//! printable ASCII is written as `\XX` with two hex digits and a backslash is
//! written as `\\`, which is what emscripten emits for wasm symbol maps.

use std::path::Path;

use indexmap::IndexMap;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, serde_derive::Serialize)]
#[serde(transparent)]
pub struct SymbolMap {
    names: IndexMap<String, String>,
}

impl SymbolMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(Self::parse(&text))
    }

    /// Parses one `minified:original` pair per line. The pair is split at the
    /// first `:`, so original names may contain colons.
    pub fn parse(text: &str) -> Self {
        let mut map = Self::new();
        for (number, line) in text.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            match line.split_once(':') {
                Some((minified, original)) => map.insert(minified.to_string(), unescape(original)),
                None => tracing::warn!("symbol map line {} has no ':', skipping it", number + 1),
            }
        }
        map
    }

    /// The text form, one escaped pair per line.
    pub fn to_text(&self) -> String {
        self.names
            .iter()
            .map(|(minified, original)| format!("{minified}:{}\n", escape(original)))
            .collect()
    }

    pub fn insert(&mut self, minified: String, original: String) {
        self.names.insert(minified, original);
    }

    pub fn get(&self, minified: &str) -> Option<&str> {
        self.names.get(minified).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

pub fn escape(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for &byte in name.as_bytes() {
        match byte {
            b'\\' => out.push_str("\\\\"),
            0x20..=0x7e => out.push(char::from(byte)),
            _ => out.push_str(&format!("\\{byte:02x}")),
        }
    }
    out
}

/// Reverses [`escape`]. The decoded bytes are read as UTF-8. A backslash
/// that starts neither escape is kept as is.
pub fn unescape(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        if bytes.get(i + 1) == Some(&b'\\') {
            out.push(b'\\');
            i += 2;
            continue;
        }
        let hex = bytes
            .get(i + 1..i + 3)
            .and_then(|h| std::str::from_utf8(h).ok())
            .and_then(|h| u8::from_str_radix(h, 16).ok());
        match hex {
            Some(byte) => {
                out.push(byte);
                i += 3;
            }
            None => {
                out.push(b'\\');
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}
