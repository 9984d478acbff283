//! # Domain Filter
//!
//! Skip-list / allow-list filtering shared by every sink.
//!
//! - [`DomainSet`]: normalized set of domains with label-boundary suffix
//!   matching
//! - [`DomainFilter`]: the two live sets behind lock-free atomic swaps,
//!   plus file-backed reloads
//!
//! ```ignore
//! let filter = DomainFilter::new(Some("skip.txt".into()), None);
//! filter.reload(ListKind::Skip).await?;
//! if filter.should_skip(FilterMode::SkipListOnly, "ads.example.com") {
//!     // drop
//! }
//! ```

mod error;
mod filter;
mod loader;
mod set;

pub use error::FilterError;
pub use filter::{DomainFilter, ListKind};
pub use loader::{load_domain_file, parse_domain_list};
pub use set::DomainSet;
