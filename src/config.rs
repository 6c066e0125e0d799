/// How byte strings inside a wasm `name` section are turned into names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WasmNameDecoding {
    /// Decode as UTF-8, replacing invalid sequences.
    #[default]
    Utf8,
    /// Map every byte to the character with the same code point. Multi-byte
    /// UTF-8 names come out garbled, as older reports printed them.
    Latin1,
}

/// Settings shared by every file of one run. Built once, then only read.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// A JS node is split into its children when the bytes held by those
    /// children exceed both this fraction of the file size...
    pub expand_larger_than_percent: f64,
    /// ...and this many bytes.
    pub expand_larger_than_bytes: u64,
    /// Qualified names whose source text should be captured while sizing.
    pub dump: Vec<String>,
    pub wasm_names: WasmNameDecoding,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            expand_larger_than_percent: 0.35,
            expand_larger_than_bytes: 0,
            dump: Vec::new(),
            wasm_names: WasmNameDecoding::Utf8,
        }
    }
}

impl Config {
    /// Accepts either a fraction (`0.35`) or a percentage (`35`).
    pub fn with_expand_percent(mut self, percent: f64) -> Self {
        self.expand_larger_than_percent = if percent > 1.0 {
            percent / 100.0
        } else {
            percent
        };
        self
    }

    pub fn with_expand_bytes(mut self, bytes: u64) -> Self {
        self.expand_larger_than_bytes = bytes;
        self
    }

    /// The number of child bytes a node must exceed before it is expanded.
    pub fn expansion_threshold(&self, file_size: usize) -> f64 {
        let relative = self.expand_larger_than_percent * file_size as f64;
        relative.max(self.expand_larger_than_bytes as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_above_one_is_normalized() {
        let config = Config::default().with_expand_percent(35.0);
        assert!((config.expand_larger_than_percent - 0.35).abs() < 1e-9);

        let config = Config::default().with_expand_percent(0.5);
        assert!((config.expand_larger_than_percent - 0.5).abs() < 1e-9);
    }

    #[test]
    fn threshold_takes_the_larger_bound() {
        let config = Config::default().with_expand_percent(0.5).with_expand_bytes(10);
        assert_eq!(config.expansion_threshold(100), 50.0);
        assert_eq!(config.expansion_threshold(4), 10.0);
    }
}
