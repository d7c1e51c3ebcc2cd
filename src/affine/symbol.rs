//! Uncertainty symbols and the factory that names them

use serde::{Deserialize, Serialize};
use std::fmt;

/// An unknown ranging over `[-1, 1]`.
///
/// Symbols order by id, so maps keyed on them iterate in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol {
    id: u64,
    name: String,
}

impl Symbol {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Generates `e0`, `e1`, ... (or `e<id>_<suffix>`).
///
/// Each injection call owns one factory, so names are unique within a call
/// only. Independent calls may run concurrently without sharing a counter.
#[derive(Debug, Clone, Default)]
pub struct SymbolFactory {
    next_id: u64,
}

impl SymbolFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the next symbol
    pub fn create(&mut self) -> Symbol {
        self.create_with_suffix("")
    }

    /// Create the next symbol, tagging its name with `suffix` when non-empty
    pub fn create_with_suffix(&mut self, suffix: &str) -> Symbol {
        let id = self.next_id;
        self.next_id += 1;
        let name = if suffix.is_empty() {
            format!("e{}", id)
        } else {
            format!("e{}_{}", id, suffix)
        };
        Symbol { id, name }
    }

    /// Restart numbering so the next symbol is `e0`
    pub fn reset(&mut self) {
        self.next_id = 0;
    }

    /// Number of symbols handed out since the last reset
    pub fn issued(&self) -> u64 {
        self.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_symbol_is_e0() {
        let mut factory = SymbolFactory::new();
        assert_eq!(factory.create().name(), "e0");
        assert_eq!(factory.create().name(), "e1");
    }

    #[test]
    fn test_suffix_naming() {
        let mut factory = SymbolFactory::new();
        factory.create();
        let s = factory.create_with_suffix("param");
        assert_eq!(s.name(), "e1_param");
        assert_eq!(s.id(), 1);
    }

    #[test]
    fn test_reset_restarts_numbering() {
        let mut factory = SymbolFactory::new();
        factory.create();
        factory.create();
        assert_eq!(factory.issued(), 2);
        factory.reset();
        assert_eq!(factory.create().name(), "e0");
    }

    #[test]
    fn test_independent_factories_do_not_interfere() {
        let mut a = SymbolFactory::new();
        let mut b = SymbolFactory::new();
        a.create();
        a.create();
        assert_eq!(b.create().name(), "e0");
    }
}
