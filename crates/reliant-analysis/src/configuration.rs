//! Feature configurations.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The set of enabled features of one product. Features not in the set are
/// disabled.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Configuration(BTreeSet<String>);

impl Configuration {
    /// The configuration with every feature disabled.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&mut self, feature: impl Into<String>) {
        self.0.insert(feature.into());
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.0.contains(feature)
    }

    /// Enabled features, sorted.
    pub fn enabled(&self) -> &BTreeSet<String> {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse one line of a configuration list.
    ///
    /// Features are separated by commas and/or whitespace and `#` starts a
    /// comment. A lone `-` is the empty configuration. Returns `None` for
    /// lines with nothing to read.
    pub fn parse_line(line: &str) -> Option<Self> {
        let content = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        }
        .trim();
        if content.is_empty() {
            return None;
        }
        if content == "-" {
            return Some(Self::new());
        }
        Some(
            content
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|f| !f.is_empty())
                .collect(),
        )
    }

    /// Parse a configuration list, one configuration per line.
    pub fn parse_list(text: &str) -> Vec<Self> {
        text.lines().filter_map(Self::parse_line).collect()
    }
}

impl<S: Into<String>> FromIterator<S> for Configuration {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Configuration {
    /// Renders in the list format: `A, B`, or `-` when empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "-");
        }
        let features: Vec<&str> = self.iter().collect();
        write!(f, "{}", features.join(", "))
    }
}
