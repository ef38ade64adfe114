//! The fixed symbol table.
//!
//! Conditions reference row state through a closed set of uppercase
//! symbols. Anything outside this set resolves to `NaN` at evaluation
//! time (logged, never fatal), so a typo'd condition goes quiet
//! instead of crashing the run.

/// Row fields a condition can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Stock as of this run's feed snapshot.
    Stock,
    /// Stock as persisted before this run.
    PrevStock,
    /// Per-purchase cap from this run's feed snapshot.
    MaxPurchase,
    /// Status label as computed this run.
    Status,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::Stock,
        Field::PrevStock,
        Field::MaxPurchase,
        Field::Status,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Field::Stock => "STOCK",
            Field::PrevStock => "PREV_STOCK",
            Field::MaxPurchase => "MAX_PURCHASE",
            Field::Status => "STATUS",
        }
    }

    pub fn from_symbol(ident: &str) -> Option<Field> {
        match ident {
            "STOCK" => Some(Field::Stock),
            "PREV_STOCK" => Some(Field::PrevStock),
            "MAX_PURCHASE" => Some(Field::MaxPurchase),
            "STATUS" => Some(Field::Status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_symbol(field.symbol()), Some(field));
        }
    }

    #[test]
    fn unknown_symbols_do_not_resolve() {
        assert_eq!(Field::from_symbol("PRICE"), None);
        assert_eq!(Field::from_symbol("stock"), None);
    }
}
