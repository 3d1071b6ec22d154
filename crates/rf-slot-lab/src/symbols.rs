//! Symbol definitions and the symbol matrix

use serde::{Deserialize, Serialize};

/// Symbol identifier; equals the symbol's rank in its set
pub type SymbolId = u32;

/// Column-major grid of symbol ids: `matrix[reel][row]`
pub type SymbolMatrix = Vec<Vec<SymbolId>>;

/// A symbol definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// Unique symbol ID (also its rank)
    pub id: SymbolId,
    /// Symbol name (e.g., "Cherry", "Seven")
    pub name: String,
    /// Glyph shown on the reel
    pub glyph: String,
}

impl Symbol {
    pub fn new(id: SymbolId, name: impl Into<String>, glyph: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            glyph: glyph.into(),
        }
    }

    /// Pay factor applied to a winning run (rank + 1)
    pub fn pay_factor(&self) -> u64 {
        self.id as u64 + 1
    }
}

/// Fixed ordered symbol set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolSet {
    symbols: Vec<Symbol>,
}

impl SymbolSet {
    /// The ten classic fruit-machine symbols, lowest rank first
    pub fn classic() -> Self {
        let symbols = [
            ("Cherry", "🍒"),
            ("Lemon", "🍋"),
            ("Orange", "🍊"),
            ("Grape", "🍇"),
            ("Watermelon", "🍉"),
            ("Star", "⭐"),
            ("Diamond", "💎"),
            ("Seven", "7️⃣"),
            ("Bell", "🔔"),
            ("Slot", "🎰"),
        ]
        .into_iter()
        .enumerate()
        .map(|(rank, (name, glyph))| Symbol::new(rank as SymbolId, name, glyph))
        .collect();

        Self { symbols }
    }

    /// Get symbol by ID
    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id as usize)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    /// Render one row of a matrix as glyphs, for logs
    pub fn render_row(&self, matrix: &SymbolMatrix, row: usize) -> String {
        matrix
            .iter()
            .map(|reel| {
                reel.get(row)
                    .and_then(|id| self.get(*id))
                    .map_or("?", |s| s.glyph.as_str())
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for SymbolSet {
    fn default() -> Self {
        Self::classic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_set() {
        let set = SymbolSet::classic();
        assert_eq!(set.len(), 10);
        assert_eq!(set.get(0).map(|s| s.name.as_str()), Some("Cherry"));
        assert_eq!(set.get(9).map(|s| s.name.as_str()), Some("Slot"));
        assert!(set.get(10).is_none());
    }

    #[test]
    fn test_rank_equals_id() {
        let set = SymbolSet::classic();
        for symbol in set.iter() {
            assert_eq!(set.get(symbol.id), Some(symbol));
            assert_eq!(symbol.pay_factor(), symbol.id as u64 + 1);
        }
    }

    #[test]
    fn test_render_row() {
        let set = SymbolSet::classic();
        let matrix = vec![vec![1, 0, 2], vec![3, 0, 4]];
        assert_eq!(set.render_row(&matrix, 1), "🍒 🍒");
        assert_eq!(set.render_row(&matrix, 5), "? ?");
    }
}
