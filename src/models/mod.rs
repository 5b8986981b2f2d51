mod show;
mod user;

pub use show::{DaySelection, Episode, NewShow, ScheduleRow, ScheduledShow, Show, UpdateOutcome};
pub use user::User;
