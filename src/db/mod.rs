mod repository;
mod schema;

pub use repository::{PurgeStats, Repository};
