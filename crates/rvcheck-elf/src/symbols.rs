//! Symbol table loaded from `nm` output.

use std::path::Path;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::{ElfError, Result};

/// Symbol name to address mapping.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    symbols: FxHashMap<String, u64>,
}

impl SymbolTable {
    /// Parse `nm` output.
    ///
    /// Each line is `<hex address> <type> <name> [...]`. Lines with fewer than
    /// three tokens or an unparsable address are skipped. Later duplicates
    /// replace earlier ones.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut symbols = FxHashMap::default();
        for line in text.lines() {
            let mut tokens = line.split_whitespace();
            let (Some(addr), Some(_kind), Some(name)) = (tokens.next(), tokens.next(), tokens.next())
            else {
                continue;
            };
            let Ok(addr) = u64::from_str_radix(addr, 16) else {
                continue;
            };
            symbols.insert(name.to_string(), addr);
        }
        Self { symbols }
    }

    /// Load and parse an `nm` output file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ElfError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::parse(&text);
        debug!(path = %path.display(), symbols = table.len(), "loaded symbol table");
        Ok(table)
    }

    /// Look up a symbol by name.
    ///
    /// Returns the symbol's value (address) if found.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<u64> {
        self.symbols.get(name).copied()
    }

    /// Number of symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for SymbolTable {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        Self {
            symbols: iter.into_iter().map(|(name, addr)| (name.into(), addr)).collect(),
        }
    }
}
