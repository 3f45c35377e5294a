pub mod blocklist;
pub mod catalog;
pub mod classification;
pub mod feed;
pub mod interest;
pub mod pagination;
pub mod scoring;
pub mod visibility;

pub use blocklist::CategoryBlocklist;
pub use catalog::CategoryCatalog;
pub use classification::{ClassificationRecord, ClassificationService};
pub use feed::{FeedPage, FeedService, SortMode};
pub use pagination::PageRequest;
pub use scoring::ScoringWeights;
pub use visibility::VisibilityFilter;
