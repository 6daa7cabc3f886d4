//! Dependency requirements as declared in a manifest.
//!
//! Operators and versions are opaque strings: mooring records and displays
//! them but never evaluates constraint satisfaction. Every package resolves
//! to a single floating revision unless pinned by a lock file.

use std::fmt;

/// Characters that begin a version constraint operator.
const OPERATOR_CHARS: &[char] = &['=', '<', '>', '~', '^'];

/// Dependency names that refer to the host language runtime itself.
///
/// These are handled by the toolchain, not fetched as packages.
pub const LANGUAGE_NAMES: &[&str] = &["nim", "nimrod"];

/// One declared requirement: `name [operator version]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub operator: String,
    pub version: String,
}

impl Dependency {
    /// Parse a quoted requirement expression such as `pixie >= 5.0.6`.
    ///
    /// The expression splits at the first operator character; a bare name
    /// yields an empty operator and version. Compound operators (`>=`,
    /// `<=`) and compound ranges are kept verbatim in `operator` and
    /// `version`.
    pub fn parse(expr: &str) -> Dependency {
        let expr = expr.trim();

        match expr.find(OPERATOR_CHARS) {
            Some(idx) => {
                let name = expr[..idx].trim();
                let rest = &expr[idx..];
                let op_end = rest
                    .find(|c: char| !OPERATOR_CHARS.contains(&c))
                    .unwrap_or(rest.len());
                Dependency {
                    name: name.to_string(),
                    operator: rest[..op_end].to_string(),
                    version: rest[op_end..].trim().to_string(),
                }
            }
            None => Dependency {
                name: expr.to_string(),
                operator: String::new(),
                version: String::new(),
            },
        }
    }

    /// Whether this names the host language runtime rather than a package.
    pub fn is_language(&self) -> bool {
        LANGUAGE_NAMES
            .iter()
            .any(|lang| self.name.eq_ignore_ascii_case(lang))
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operator.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} {} {}", self.name, self.operator, self.version)
        }
    }
}
