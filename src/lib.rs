pub mod api;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod parser;

pub use api::AppState;
pub use catalog::{Catalog, ImportOptions, ImportReport, ImportSource, RankingSettings};
pub use models::{Media, MediaType, Partition};
pub use parser::{parse_lenient_records, ParseReport, RawRecord, RawValue};
