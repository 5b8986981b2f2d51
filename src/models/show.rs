use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Show {
    pub id: i64,
    pub title: String,
    pub link: String,
    pub airing_day: String,
    pub airing_time: String,
}

#[derive(Debug, Clone)]
pub struct NewShow {
    pub id: i64,
    pub title: String,
    pub link: String,
    pub airing_day: String,
    pub airing_time: String,
}

/// A schedule row before its show id has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRow {
    pub day: String,
    pub title: String,
    pub time: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledShow {
    pub id: i64,
    pub day: String,
    pub title: String,
    pub time: String,
    pub link: String,
}

impl ScheduledShow {
    pub fn from_row(id: i64, row: ScheduleRow) -> Self {
        Self {
            id,
            day: row.day,
            title: row.title,
            time: row.time,
            link: row.link,
        }
    }
}

impl From<ScheduledShow> for NewShow {
    fn from(show: ScheduledShow) -> Self {
        Self {
            id: show.id,
            title: show.title,
            link: show.link,
            airing_day: show.day,
            airing_time: show.time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Episode {
    pub label: String,
    pub link_720p: String,
    pub link_1080p: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Unchanged,
    MismatchFlushed,
}

/// Which schedule days to walk. `All` follows the configured day order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DaySelection {
    #[default]
    All,
    One(String),
    Many(Vec<String>),
}

impl DaySelection {
    pub fn resolve<'a>(&'a self, configured: &'a [String]) -> Vec<&'a str> {
        match self {
            DaySelection::All => configured.iter().map(String::as_str).collect(),
            DaySelection::One(day) => vec![day.as_str()],
            DaySelection::Many(days) => days.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for DaySelection {
    fn from(day: &str) -> Self {
        DaySelection::One(day.to_string())
    }
}

impl From<String> for DaySelection {
    fn from(day: String) -> Self {
        DaySelection::One(day)
    }
}

impl From<Vec<String>> for DaySelection {
    fn from(days: Vec<String>) -> Self {
        if days.is_empty() {
            DaySelection::All
        } else {
            DaySelection::Many(days)
        }
    }
}

impl From<Option<String>> for DaySelection {
    fn from(day: Option<String>) -> Self {
        day.map(DaySelection::One).unwrap_or_default()
    }
}
