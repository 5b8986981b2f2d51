mod http;
mod releases;
mod shortener;

pub use http::{HttpClient, PageSource};
pub use releases::{is_listed, parse_latest_episode, ReleaseLookup};
pub use shortener::LinkShortener;

#[cfg(test)]
pub(crate) use http::stub;
