use chrono::{Datelike, Duration, NaiveDate, Weekday};
use tracing::{debug, error};

use crate::{
    config::PipelineConfig,
    error::Result,
    historical::summarize_history,
    intent::QueryIntent,
    metrics::{compute_metrics, week_bounds},
    models::{DataContext, DataSource, PageContext, RetrievalWindow},
    records::WAITING_STATUS,
    store::{BacklogFilter, OperationalStore, ScheduleFilter},
};

fn weekday_from_token(token: &str) -> Option<Weekday> {
    match token {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

fn window_for_token(token: &str, today: NaiveDate) -> Option<RetrievalWindow> {
    match token {
        "today" => Some(RetrievalWindow::single(today)),
        "tomorrow" => Some(RetrievalWindow::single(today + Duration::days(1))),
        "this week" => Some(RetrievalWindow {
            from: today,
            to: week_bounds(today).1,
        }),
        "next week" => {
            let (from, to) = week_bounds(today + Duration::days(7));
            Some(RetrievalWindow { from, to })
        }
        other => weekday_from_token(other).map(|weekday| {
            let ahead = (7 + weekday.num_days_from_monday()
                - today.weekday().num_days_from_monday())
                % 7;
            RetrievalWindow::single(today + Duration::days(i64::from(ahead)))
        }),
    }
}

/// Schedule window for this request.
///
/// A selected date on the page wins; otherwise the first recognised date entity
/// in the query; otherwise today.
pub fn resolve_window(
    intent: &QueryIntent,
    page: Option<&PageContext>,
    today: NaiveDate,
) -> RetrievalWindow {
    if let Some(date) = page.and_then(|p| p.selected_date) {
        return RetrievalWindow::single(date);
    }
    intent
        .entities
        .dates
        .iter()
        .find_map(|token| window_for_token(token, today))
        .unwrap_or_else(|| RetrievalWindow::single(today))
}

/// Collapse a failed source fetch into an empty result.
fn or_empty<T>(origin: DataSource, result: Result<Vec<T>>) -> Vec<T> {
    match result {
        Ok(records) => {
            debug!(source = %origin, records = records.len(), "Source fetched");
            records
        }
        Err(e) => {
            error!(source = %origin, "Error fetching source data: {}", e);
            Vec::new()
        }
    }
}

/// Fans out to every source for one request.
pub struct MultiSourceRetriever<'a> {
    store: &'a dyn OperationalStore,
    config: &'a PipelineConfig,
}

impl<'a> MultiSourceRetriever<'a> {
    pub fn new(store: &'a dyn OperationalStore, config: &'a PipelineConfig) -> Self {
        Self { store, config }
    }

    /// Run every fetch concurrently and join them. Never fails: a failing
    /// source contributes an empty list, failing metrics a zeroed snapshot.
    pub async fn retrieve(
        &self,
        window: RetrievalWindow,
        page: Option<&PageContext>,
        today: NaiveDate,
    ) -> DataContext {
        let schedule_filter = ScheduleFilter::for_window(window)
            .with_theatre(page.and_then(|p| p.selected_theatre.clone()))
            .with_specialty(page.and_then(|p| p.selected_specialty.clone()));
        let backlog_filter =
            BacklogFilter::with_status(WAITING_STATUS).limit(self.config.backlog_fetch_limit);

        let (schedules, staff, procedures, theatres, metrics, historical) = tokio::join!(
            self.store.schedules(&schedule_filter),
            self.store.staff(Some(self.config.staff_fetch_limit)),
            self.store.backlog(&backlog_filter),
            self.store.theatres(),
            compute_metrics(self.store, today, self.config),
            summarize_history(self.store, today, self.config.history_window_days),
        );

        DataContext {
            schedules: or_empty(DataSource::Schedule, schedules),
            staff: or_empty(DataSource::Staff, staff),
            procedures: or_empty(DataSource::Backlog, procedures),
            theatres: or_empty(DataSource::Resources, theatres),
            metrics,
            historical,
        }
    }
}
