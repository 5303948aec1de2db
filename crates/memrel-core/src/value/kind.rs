use serde::{Deserialize, Serialize};

///
/// ValueKind
///
/// Variant tag of a `Value`, used for diagnostics and type errors.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    Text,
    Date,
    List,
}

impl ValueKind {
    /// Stable human-readable value kind label for diagnostics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "boolean",
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "string",
            Self::Date => "date",
            Self::List => "list",
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
