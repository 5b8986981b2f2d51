mod fetcher;
mod reconcile;
mod resolver;

pub use fetcher::{parse_schedule, ScheduleFetcher};
pub use reconcile::Reconciler;
pub use resolver::{extract_show_id, ShowResolver};
