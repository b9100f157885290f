//! Symbol catalog and slot identity decoding

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

use crate::error::{ReelError, ReelResult};

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// Identity used by the win rule (decoded file name, e.g. "cherri.png")
    pub name: String,
    /// Image source as written into the slot (e.g. "static/images/cherri.png")
    pub path: String,
}

impl Symbol {
    /// Create a symbol from an image path; the identity is its decoded file name
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = identity_from_source(&path).unwrap_or_else(|| path.clone());
        Self { name, path }
    }
}

/// Ordered, immutable symbol catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolCatalog {
    symbols: Vec<Symbol>,
    /// Identity of the jackpot symbol
    jackpot: String,
}

impl SymbolCatalog {
    /// Build a catalog from image paths
    pub fn from_paths<I, P>(paths: I, jackpot: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            symbols: paths.into_iter().map(Symbol::from_path).collect(),
            jackpot: jackpot.into(),
        }
    }

    /// The six-symbol catalog shipped with the widget
    pub fn classic() -> Self {
        Self::from_paths(
            [
                "static/images/cherri.png",
                "static/images/diamond.png",
                "static/images/grapes.png",
                "static/images/watermalon.png",
                "static/images/7.png",
                "static/images/hores%20shoe.png",
            ],
            "7.png",
        )
    }

    /// Check for empty, duplicate and jackpot problems
    pub fn validate(&self) -> ReelResult<()> {
        if self.symbols.is_empty() {
            return Err(ReelError::EmptyCatalog);
        }
        for (i, symbol) in self.symbols.iter().enumerate() {
            if self.symbols[..i].iter().any(|s| s.name == symbol.name) {
                return Err(ReelError::DuplicateSymbol(symbol.name.clone()));
            }
        }
        if self.position(&self.jackpot).is_none() {
            return Err(ReelError::UnknownJackpotSymbol(self.jackpot.clone()));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Get symbol by catalog index
    pub fn get(&self, index: usize) -> Option<&Symbol> {
        self.symbols.get(index)
    }

    /// Catalog index of an identity
    pub fn position(&self, name: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    /// Identity of the jackpot symbol
    pub fn jackpot(&self) -> &str {
        &self.jackpot
    }
}

impl Default for SymbolCatalog {
    fn default() -> Self {
        Self::classic()
    }
}

/// Extract a symbol identity from a slot's image source.
///
/// Takes the last path segment, drops query and fragment, and decodes
/// percent-escapes. Returns `None` for an empty source.
pub fn identity_from_source(source: &str) -> Option<String> {
    let source = source.trim();
    let source = source.split(['?', '#']).next().unwrap_or(source);
    let segment = source.rsplit('/').next().unwrap_or(source);
    if segment.is_empty() {
        return None;
    }
    Some(percent_decode_str(segment).decode_utf8_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_catalog() {
        let catalog = SymbolCatalog::classic();
        assert_eq!(catalog.len(), 6);
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.jackpot(), "7.png");
        assert_eq!(catalog.get(0).map(|s| s.name.as_str()), Some("cherri.png"));
        // Escaped path, decoded identity
        assert!(catalog.contains("hores shoe.png"));
    }

    #[test]
    fn test_identity_from_source() {
        assert_eq!(
            identity_from_source("static/images/cherri.png").as_deref(),
            Some("cherri.png")
        );
        assert_eq!(
            identity_from_source("http://localhost:8000/static/images/hores%20shoe.png?v=2")
                .as_deref(),
            Some("hores shoe.png")
        );
        assert_eq!(identity_from_source("7.png").as_deref(), Some("7.png"));
        assert_eq!(identity_from_source(""), None);
        assert_eq!(identity_from_source("static/images/"), None);
    }

    #[test]
    fn test_identity_decoding_edge_cases() {
        // Malformed escapes stay verbatim
        assert_eq!(identity_from_source("img/100%").as_deref(), Some("100%"));
        assert_eq!(identity_from_source("img/%zz.png").as_deref(), Some("%zz.png"));
        assert_eq!(identity_from_source("img/a%2").as_deref(), Some("a%2"));
        assert_eq!(identity_from_source("img/%41%42.png").as_deref(), Some("AB.png"));
        // Invalid UTF-8 is replaced, '+' is not a space
        assert_eq!(identity_from_source("img/%C3.png").as_deref(), Some("\u{FFFD}.png"));
        assert_eq!(identity_from_source("img/a+b%2Fc.png").as_deref(), Some("a+b/c.png"));
    }

    #[test]
    fn test_catalog_validation() {
        let empty = SymbolCatalog::from_paths(Vec::<String>::new(), "7.png");
        assert!(matches!(empty.validate(), Err(ReelError::EmptyCatalog)));

        let dup = SymbolCatalog::from_paths(["a/7.png", "b/7.png"], "7.png");
        assert!(matches!(dup.validate(), Err(ReelError::DuplicateSymbol(_))));

        let no_jackpot = SymbolCatalog::from_paths(["a/cherri.png"], "7.png");
        assert!(matches!(
            no_jackpot.validate(),
            Err(ReelError::UnknownJackpotSymbol(_))
        ));
    }
}
