use std::sync::Arc;

use scraper::{Html, Selector};

use crate::config::Endpoints;
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::Episode;

use super::http::PageSource;

const LABEL_SELECTOR: &str = "a.rls-label > strong";
const MAGNET_SELECTOR: &str = "span.hs-magnet-link > a";

pub struct ReleaseLookup {
    source: Arc<dyn PageSource>,
    endpoints: Endpoints,
    repository: Repository,
}

impl ReleaseLookup {
    pub fn new(source: Arc<dyn PageSource>, endpoints: Endpoints, repository: Repository) -> Self {
        Self {
            source,
            endpoints,
            repository,
        }
    }

    /// Whether the latest-releases feed mentions `title`. Plain substring
    /// match, so a title contained in another title also matches.
    pub async fn check_released(&self, title: &str) -> Result<bool> {
        let page = self.source.fetch_text(&self.endpoints.latest_releases()).await?;
        Ok(is_listed(&page, title))
    }

    /// Only stored shows have a known id; anything else is `NotFound`
    /// without touching the network.
    pub async fn get_latest_episode(&self, title: &str) -> Result<Episode> {
        let show_id = self
            .repository
            .get_show_id_by_title(title)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("show {:?}", title)))?;

        let page = self
            .source
            .fetch_text(&self.endpoints.show_episodes(show_id))
            .await?;
        let episode = parse_latest_episode(&page)?;
        tracing::debug!("Latest episode of {:?}: {}", title, episode.label);
        Ok(episode)
    }
}

pub fn is_listed(page: &str, title: &str) -> bool {
    page.contains(&title.replace('–', "-"))
}

/// First release label and the second and third magnet links of the
/// episode list. The first magnet is the lowest quality and is skipped.
pub fn parse_latest_episode(html: &str) -> Result<Episode> {
    let doc = Html::parse_document(html);
    let label_sel = Selector::parse(LABEL_SELECTOR)
        .map_err(|e| AppError::Parse(e.to_string()))?;
    let magnet_sel = Selector::parse(MAGNET_SELECTOR)
        .map_err(|e| AppError::Parse(e.to_string()))?;

    let label = doc
        .select(&label_sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .ok_or_else(|| AppError::Parse("no release label on episode page".to_string()))?;

    let magnets = doc
        .select(&magnet_sel)
        .take(3)
        .map(|a| {
            a.value()
                .attr("href")
                .ok_or_else(|| AppError::Parse("magnet anchor without href".to_string()))
        })
        .collect::<Result<Vec<&str>>>()?;
    if magnets.len() < 3 {
        return Err(AppError::Parse(format!(
            "expected 3 magnet links, found {}",
            magnets.len()
        )));
    }

    Ok(Episode {
        label,
        link_720p: magnets[1].to_string(),
        link_1080p: magnets[2].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewShow;
    use crate::services::stub::StubSource;

    fn episode_page(magnets: &[&str]) -> String {
        let links: String = magnets
            .iter()
            .map(|m| format!(r#"<span class="dl-type hs-magnet-link"><a title="Magnet Link" href="{m}">Magnet</a></span>"#))
            .collect();
        format!(
            r#"<div class="rls-info-container"><a class="rls-label"><span class="rls-date">10/18/26</span> Alpha - <strong>07</strong></a><div class="rls-links-container">{links}</div></div>
               <div class="rls-info-container"><a class="rls-label">Alpha - <strong>06</strong></a></div>"#
        )
    }

    #[test]
    fn picks_second_and_third_magnet() {
        let page = episode_page(&["magnet:?xt=480", "magnet:?xt=720", "magnet:?xt=1080"]);
        let episode = parse_latest_episode(&page).unwrap();

        assert_eq!(
            episode,
            Episode {
                label: "07".to_string(),
                link_720p: "magnet:?xt=720".to_string(),
                link_1080p: "magnet:?xt=1080".to_string(),
            }
        );
    }

    #[test]
    fn too_few_magnets_is_a_parse_error() {
        let page = episode_page(&["magnet:?xt=480", "magnet:?xt=720"]);
        assert!(matches!(parse_latest_episode(&page), Err(AppError::Parse(_))));
    }

    #[test]
    fn missing_label_is_a_parse_error() {
        let page = r#"<span class="hs-magnet-link"><a href="a">1</a></span>
                      <span class="hs-magnet-link"><a href="b">2</a></span>
                      <span class="hs-magnet-link"><a href="c">3</a></span>"#;
        assert!(matches!(parse_latest_episode(page), Err(AppError::Parse(_))));
    }

    #[test]
    fn release_check_normalizes_en_dash() {
        let page = "<li>Re-Zero - 45</li>";
        assert!(is_listed(page, "Re–Zero"));
        assert!(!is_listed(page, "Overlord"));
    }

    #[test]
    fn release_check_is_a_substring_match() {
        // "Alpha" also matches "Alpha Zero"
        assert!(is_listed("<li>Alpha Zero - 03</li>", "Alpha"));
    }

    async fn lookup(source: StubSource) -> (tempfile::TempDir, Repository, Arc<StubSource>, ReleaseLookup) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::new(dir.path().join("data.db").to_str().unwrap())
            .await
            .unwrap();
        let source = Arc::new(source);
        let endpoints =
            Endpoints::new("https://example.org", "/release-schedule/", "http://short.test/").unwrap();
        let lookup = ReleaseLookup::new(source.clone(), endpoints, repo.clone());
        (dir, repo, source, lookup)
    }

    #[tokio::test]
    async fn latest_episode_uses_stored_id() {
        let url = "https://example.org/api.php?method=getshows&type=show&showid=55";
        let page = episode_page(&["m480", "m720", "m1080"]);
        let (_dir, repo, source, lookup) = lookup(StubSource::new().with_page(url, page)).await;
        repo.insert_show(NewShow {
            id: 55,
            title: "Alpha".to_string(),
            link: "https://example.org/shows/alpha".to_string(),
            airing_day: "Monday".to_string(),
            airing_time: "10:00".to_string(),
        })
        .await
        .unwrap();

        let episode = lookup.get_latest_episode("Alpha").await.unwrap();
        assert_eq!(episode.link_720p, "m720");
        assert_eq!(source.requests(), vec![url.to_string()]);
    }

    #[tokio::test]
    async fn latest_episode_of_unknown_title_is_not_found() {
        let (_dir, _repo, source, lookup) = lookup(StubSource::new()).await;
        assert!(matches!(
            lookup.get_latest_episode("Nope").await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn check_released_reads_latest_feed() {
        let source = StubSource::new().with_page(
            "https://example.org/api.php?method=getlatest",
            "<ul><li>Alpha - 07</li></ul>",
        );
        let (_dir, _repo, _source, lookup) = lookup(source).await;

        assert!(lookup.check_released("Alpha").await.unwrap());
        assert!(!lookup.check_released("Beta").await.unwrap());
    }
}
