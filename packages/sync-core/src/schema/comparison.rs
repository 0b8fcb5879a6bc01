//! Name comparison rule for tables, schemas and columns.

use serde::{Deserialize, Serialize};

/// How names are compared when resolving tables, columns and keys.
///
/// Carried by every [`SyncSet`](super::SyncSet) and
/// [`SyncTable`](crate::table::SyncTable) and passed explicitly to
/// structural equality checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NameComparison {
    /// Exact byte comparison
    Ordinal,
    /// ASCII case-insensitive comparison
    #[default]
    OrdinalIgnoreCase,
}

impl NameComparison {
    /// Compares two names under this rule.
    pub fn equals(&self, a: &str, b: &str) -> bool {
        match self {
            NameComparison::Ordinal => a == b,
            NameComparison::OrdinalIgnoreCase => a.eq_ignore_ascii_case(b),
        }
    }

    /// Returns true if `name` is in `names` under this rule.
    pub fn contains<S: AsRef<str>>(&self, names: &[S], name: &str) -> bool {
        names.iter().any(|n| self.equals(n.as_ref(), name))
    }

    /// Compares two optional strings, treating `None` and `""` alike.
    pub fn equals_opt(&self, a: Option<&str>, b: Option<&str>) -> bool {
        self.equals(a.unwrap_or(""), b.unwrap_or(""))
    }
}
