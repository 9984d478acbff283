//! Domain list file parsing
//!
//! One domain per line. Blank lines and `#` comments are ignored, and
//! only the first field of a line is used, so `domain,annotation` style
//! lists load as plain domain lists.

use std::path::Path;

use crate::{DomainSet, FilterError, ListKind};

/// Parse the contents of a domain list
pub fn parse_domain_list(content: &str) -> DomainSet {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            line.split(|c: char| c == ',' || c.is_whitespace())
                .next()
                .filter(|field| !field.is_empty())
        })
        .collect()
}

/// Read and parse a domain list file
///
/// The whole file is read before a set is built, so a failed read never
/// yields a partial set.
pub async fn load_domain_file(list: ListKind, path: &Path) -> Result<DomainSet, FilterError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FilterError::Read {
            list,
            path: path.to_path_buf(),
            source,
        })?;
    Ok(parse_domain_list(&content))
}
