use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Contact detail (email, phone) that must never reach the logs in clear text.
///
/// `Debug` and `Display` print a redacted hint; serialization keeps the real
/// value because the presentation layer needs it on the ticket.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: AsRef<str>> Masked<T> {
    /// `jane@example.com` -> `j***@example.com`, `+1 234 567 8900` -> `***00`
    pub fn redacted(&self) -> String {
        let raw = self.0.as_ref();
        if raw.is_empty() {
            return String::new();
        }
        match raw.split_once('@') {
            Some((local, domain)) => {
                let first = local.chars().next().map(String::from).unwrap_or_default();
                format!("{}***@{}", first, domain)
            }
            None => {
                let tail: String = raw.chars().rev().take(2).collect::<Vec<_>>().into_iter().rev().collect();
                format!("***{}", tail)
            }
        }
    }
}

impl<T: AsRef<str>> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Masked({})", self.redacted())
    }
}

impl<T: AsRef<str>> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl From<String> for Masked<String> {
    fn from(value: String) -> Self {
        Self(value)
    }
}
