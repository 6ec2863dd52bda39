//! Registry key of a migration script.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// Non-empty script name, e.g. `CreateUsers`.
///
/// Produced from a source's descriptive name by [`crate::naming::camelize`].
/// `Borrow<str>` lets name-keyed maps be queried with a plain `&str`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScriptName(String);

impl ScriptName {
    /// `None` for an empty name.
    pub fn try_new(name: impl Into<String>) -> Option<Self> {
        let s = name.into();
        if s.is_empty() {
            None
        } else {
            Some(Self(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScriptName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ScriptName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ScriptName {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ScriptName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for ScriptName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
