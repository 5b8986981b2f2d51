use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::services::PageSource;

static SHOW_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"var hs_showid = (\d+);").expect("valid show id pattern"));

/// Maps a show title to its upstream id, hitting the network only for
/// titles the store has never seen. Never writes to the store.
#[derive(Clone)]
pub struct ShowResolver {
    repository: Repository,
    source: Arc<dyn PageSource>,
}

impl ShowResolver {
    pub fn new(repository: Repository, source: Arc<dyn PageSource>) -> Self {
        Self { repository, source }
    }

    pub async fn resolve(&self, title: &str, link: &str) -> Result<i64> {
        if let Some(id) = self.repository.get_show_id_by_title(title).await? {
            return Ok(id);
        }

        tracing::debug!("Show {:?} not stored, fetching {}", title, link);
        let page = self.source.fetch_text(link).await?;
        extract_show_id(&page)
            .map_err(|e| AppError::Parse(format!("{} on {} for {:?}", e, link, title)))
    }
}

/// First `var hs_showid = N;` on the page. A missing marker and a number
/// too large for an id are both `Parse`, with different messages.
pub fn extract_show_id(page: &str) -> Result<i64> {
    let digits = SHOW_ID_RE
        .captures(page)
        .and_then(|cap| cap.get(1))
        .ok_or_else(|| AppError::Parse("no show id found".to_string()))?
        .as_str();
    digits
        .parse()
        .map_err(|_| AppError::Parse(format!("show id {} out of range", digits)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewShow;
    use crate::services::stub::StubSource;

    const LINK: &str = "https://example.org/shows/alpha";

    async fn setup(source: StubSource) -> (tempfile::TempDir, Repository, Arc<StubSource>, ShowResolver) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::new(dir.path().join("data.db").to_str().unwrap())
            .await
            .unwrap();
        let source = Arc::new(source);
        let resolver = ShowResolver::new(repo.clone(), source.clone());
        (dir, repo, source, resolver)
    }

    #[tokio::test]
    async fn stored_title_needs_no_fetch() {
        let (_dir, repo, source, resolver) = setup(StubSource::new()).await;
        repo.insert_show(NewShow {
            id: 77,
            title: "Alpha".to_string(),
            link: LINK.to_string(),
            airing_day: "Monday".to_string(),
            airing_time: "10:00".to_string(),
        })
        .await
        .unwrap();

        assert_eq!(resolver.resolve("Alpha", LINK).await.unwrap(), 77);
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn unknown_title_fetches_show_page_once() {
        let page = "<html><script>var hs_showid = 1234;</script></html>";
        let (_dir, repo, source, resolver) =
            setup(StubSource::new().with_page(LINK, page)).await;

        assert_eq!(resolver.resolve("Alpha", LINK).await.unwrap(), 1234);
        assert_eq!(source.requests(), vec![LINK.to_string()]);
        // resolving does not persist anything
        assert_eq!(repo.get_show_id_by_title("Alpha").await.unwrap(), None);
    }

    #[tokio::test]
    async fn page_without_id_is_a_parse_error() {
        let page = "<html><script>var something_else = 1;</script></html>";
        let (_dir, _repo, _source, resolver) =
            setup(StubSource::new().with_page(LINK, page)).await;

        assert!(matches!(
            resolver.resolve("Alpha", LINK).await,
            Err(AppError::Parse(_))
        ));
    }

    #[test]
    fn extracts_first_matching_id() {
        assert_eq!(extract_show_id("x var hs_showid = 9; var hs_showid = 10;").unwrap(), 9);
        assert!(matches!(
            extract_show_id("var hs_showid = abc;"),
            Err(AppError::Parse(msg)) if msg.contains("no show id")
        ));
    }

    #[tokio::test]
    async fn oversized_id_reports_range_not_absence() {
        let page = "<script>var hs_showid = 99999999999999999999;</script>";
        let (_dir, _repo, _source, resolver) =
            setup(StubSource::new().with_page(LINK, page)).await;

        match resolver.resolve("Alpha", LINK).await {
            Err(AppError::Parse(msg)) => {
                assert!(msg.contains("out of range"), "{}", msg);
                assert!(!msg.contains("no show id"), "{}", msg);
            }
            other => panic!("expected a parse error, got {:?}", other),
        }
    }
}
