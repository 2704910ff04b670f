pub mod investor;
pub mod search;

pub use investor::{InvestorRecord, OutreachStatus};
pub use search::{RawSearchResult, SearchQuery};
