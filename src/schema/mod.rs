/*!
 * Structural and semantic validation of boundary documents.
 *
 * Everything that crosses the trust boundary (structure snapshots, plans,
 * inventories) is JSON and is validated here before any typed model is built
 * from it. Validation never panics on bad input; only a corrupt embedded
 * schema definition aborts startup.
 */

mod definitions;
mod validator;

pub use definitions::schema_for;
pub use validator::SchemaValidator;

/// Which boundary document a JSON value claims to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// `structure.v1`
    Structure,
    /// `plan.v1`
    Plan,
    /// `inventory.full.v1`
    Inventory,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structure => "structure",
            Self::Plan => "plan",
            Self::Inventory => "inventory",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
