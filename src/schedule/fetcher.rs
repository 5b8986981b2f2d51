use std::sync::Arc;

use scraper::{ElementRef, Html, Selector};

use crate::config::Endpoints;
use crate::error::{AppError, Result};
use crate::models::{DaySelection, ScheduleRow, ScheduledShow};
use crate::services::PageSource;

use super::resolver::ShowResolver;

const TABLE_SELECTOR: &str = "#main > div > article > div > table";

/// Scrapes the release schedule. The last downloaded page is cached so the
/// reconciler can refresh once and read it several times.
pub struct ScheduleFetcher {
    source: Arc<dyn PageSource>,
    endpoints: Endpoints,
    days: Vec<String>,
    resolver: ShowResolver,
    page: Option<String>,
}

impl ScheduleFetcher {
    pub fn new(
        source: Arc<dyn PageSource>,
        endpoints: Endpoints,
        days: Vec<String>,
        resolver: ShowResolver,
    ) -> Self {
        Self {
            source,
            endpoints,
            days,
            resolver,
            page: None,
        }
    }

    pub fn days(&self) -> &[String] {
        &self.days
    }

    /// Download the schedule page, replacing the cached copy.
    pub async fn refresh(&mut self) -> Result<()> {
        let page = self.source.fetch_text(self.endpoints.schedule()).await?;
        tracing::debug!("Fetched schedule page ({} bytes)", page.len());
        self.page = Some(page);
        Ok(())
    }

    /// Rows of the cached page for the selected days, ids unresolved.
    pub fn rows(&self, days: &DaySelection) -> Result<Vec<ScheduleRow>> {
        let page = self
            .page
            .as_deref()
            .ok_or_else(|| AppError::Parse("schedule page has not been fetched".to_string()))?;
        parse_schedule(page, &self.days, days, &self.endpoints)
    }

    /// Resolve every row of the cached page for the selected days. The
    /// first row that fails to resolve aborts the whole call.
    pub async fn resolved(&self, days: &DaySelection) -> Result<Vec<ScheduledShow>> {
        let rows = self.rows(days)?;
        let mut shows = Vec::with_capacity(rows.len());
        for row in rows {
            let id = self.resolver.resolve(&row.title, &row.link).await?;
            shows.push(ScheduledShow::from_row(id, row));
        }
        Ok(shows)
    }

    /// Fetch the schedule and resolve every row of the selected days.
    /// Each call starts over from a fresh download.
    pub async fn iterate(&mut self, days: impl Into<DaySelection>) -> Result<Vec<ScheduledShow>> {
        let selection = days.into();
        self.refresh().await?;
        self.resolved(&selection).await
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AppError::Parse(format!("bad selector {:?}: {}", css, e)))
}

pub fn parse_schedule(
    html: &str,
    configured: &[String],
    selection: &DaySelection,
    endpoints: &Endpoints,
) -> Result<Vec<ScheduleRow>> {
    let doc = Html::parse_document(html);
    let table_sel = selector(TABLE_SELECTOR)?;
    let link_sel = selector("a")?;
    let cell_sel = selector("td")?;

    let tables: Vec<ElementRef> = doc.select(&table_sel).collect();
    let mut rows = Vec::new();

    for day in selection.resolve(configured) {
        let index = configured
            .iter()
            .position(|d| d == day)
            .ok_or_else(|| AppError::UnknownDay(day.to_string()))?;
        let table = tables.get(index).ok_or_else(|| {
            AppError::Parse(format!(
                "schedule has {} tables, none for {} (index {})",
                tables.len(),
                day,
                index
            ))
        })?;

        for tr in table_rows(*table) {
            let anchor = tr
                .select(&link_sel)
                .next()
                .ok_or_else(|| AppError::Parse(format!("{} row without a show link", day)))?;
            let title = element_text(anchor);
            let href = anchor
                .value()
                .attr("href")
                .ok_or_else(|| AppError::Parse(format!("{:?} link has no href", title)))?;
            let time = tr
                .select(&cell_sel)
                .nth(1)
                .map(element_text)
                .ok_or_else(|| AppError::Parse(format!("{:?} row has no time cell", title)))?;

            rows.push(ScheduleRow {
                day: day.to_string(),
                link: endpoints.show_page(href)?,
                title,
                time,
            });
        }
    }

    Ok(rows)
}

/// Direct `tr` children, looking through the `tbody` the parser inserts.
fn table_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(child),
            "tbody" | "thead" | "tfoot" => rows.extend(
                child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|e| e.value().name() == "tr"),
            ),
            _ => {}
        }
    }
    rows
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
