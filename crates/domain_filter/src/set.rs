//! DomainSet - normalized domain membership with suffix matching

use std::borrow::Cow;
use std::collections::HashSet;

/// Set of domains matched on label boundaries
///
/// A name matches when the name itself or any parent domain of it is in
/// the set: `example.com` matches `example.com` and `www.example.com`,
/// never `badexample.com`. Comparison is ASCII case-insensitive and
/// ignores a trailing root dot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainSet {
    entries: HashSet<String>,
}

impl DomainSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a domain, returns false for empty or duplicate entries
    pub fn insert(&mut self, domain: &str) -> bool {
        let normalized = normalize(domain);
        if normalized.is_empty() {
            return false;
        }
        self.entries.insert(normalized.into_owned())
    }

    /// Number of distinct entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `domain` is itself an entry (no suffix walk)
    pub fn contains_exact(&self, domain: &str) -> bool {
        self.entries.contains(normalize(domain).as_ref())
    }

    /// Whether `name` or one of its parent domains is an entry
    pub fn matches(&self, name: &str) -> bool {
        if self.entries.is_empty() {
            return false;
        }

        let normalized = normalize(name);
        let mut candidate: &str = &normalized;
        while !candidate.is_empty() {
            if self.entries.contains(candidate) {
                return true;
            }
            match candidate.find('.') {
                Some(idx) => candidate = &candidate[idx + 1..],
                None => break,
            }
        }
        false
    }

    /// Iterate over entries in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for DomainSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for domain in iter {
            set.insert(domain.as_ref());
        }
        set
    }
}

fn normalize(name: &str) -> Cow<'_, str> {
    let trimmed = name.trim();
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
    if trimmed.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(trimmed.to_ascii_lowercase())
    } else {
        Cow::Borrowed(trimmed)
    }
}
