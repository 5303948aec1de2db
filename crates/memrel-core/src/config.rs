use serde::{Deserialize, Serialize};

///
/// DbConfig
///
/// Per-database engine settings, fixed when the `Database` is constructed.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DbConfig {
    /// Emit plan summaries for every executor call at `info` level.
    pub debug: bool,

    /// Reject predicates with unrecognized operators (or a first node that is
    /// not WHERE / WHERE NOT) before evaluation instead of excluding rows.
    pub strict_predicates: bool,
}

impl DbConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            debug: false,
            strict_predicates: false,
        }
    }

    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub const fn with_strict_predicates(mut self, strict: bool) -> Self {
        self.strict_predicates = strict;
        self
    }
}
