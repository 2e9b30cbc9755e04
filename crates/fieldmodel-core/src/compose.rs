//! Schema composition helpers
//!
//! Pure functions building a new field table from a base table plus an
//! extend/pick/omit operation. The base table is only read: every composed
//! schema owns a fresh table, so a base schema can back any number of derived
//! schemas.

use crate::normalize::FieldTable;

/// Which base fields a derived schema carries forward
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Composition {
    /// Every base field
    Extend,
    /// Only the listed base fields, in list order
    Pick(Vec<String>),
    /// Every base field except the listed ones
    Omit(Vec<String>),
}

impl Composition {
    pub fn pick<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Composition::Pick(keys.into_iter().map(Into::into).collect())
    }

    pub fn omit<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Composition::Omit(keys.into_iter().map(Into::into).collect())
    }
}

/// `{ ...carried(base), ...additions }`
///
/// An addition overriding a carried field keeps the carried position; new
/// fields are appended in their own order. Picked keys missing from the base
/// are ignored.
pub fn compose(base: &FieldTable, composition: &Composition, additions: FieldTable) -> FieldTable {
    let mut table = match composition {
        Composition::Extend => base.clone(),
        Composition::Pick(keys) => {
            let mut picked = FieldTable::new();
            for key in keys {
                if let Some(field) = base.get(key) {
                    picked.insert(key.clone(), field.clone());
                }
            }
            picked
        }
        Composition::Omit(keys) => {
            let mut kept = base.clone();
            for key in keys {
                kept.remove(key);
            }
            kept
        }
    };
    for (name, field) in additions {
        table.insert(name, field);
    }
    table
}
