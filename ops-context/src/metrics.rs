use chrono::{Datelike, Duration, NaiveDate};
use tracing::{debug, warn};

use crate::{
    config::PipelineConfig,
    models::MetricsSnapshot,
    records::{ProcedureRecord, ScheduleRecord, StaffRecord, WAITING_STATUS},
    store::{BacklogFilter, OperationalStore, ScheduleFilter},
};

/// Monday-to-Sunday week containing `day`.
pub fn week_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = day - Duration::days(i64::from(day.weekday().num_days_from_monday()));
    (monday, monday + Duration::days(6))
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Reduce raw records into today's metrics.
///
/// `week_sessions` is every session of the week containing `today`; today's
/// sessions are picked out of it. Turnover and cancellation come from the
/// records when any session carries the data, otherwise from the configured
/// placeholders.
pub fn aggregate(
    today: NaiveDate,
    week_sessions: &[ScheduleRecord],
    staff: &[StaffRecord],
    backlog: &[ProcedureRecord],
    config: &PipelineConfig,
) -> MetricsSnapshot {
    let today_utilization = mean(
        week_sessions
            .iter()
            .filter(|s| s.date == Some(today))
            .map(ScheduleRecord::utilization),
    )
    .unwrap_or(0.0);

    let week_utilization = mean(week_sessions.iter().map(ScheduleRecord::utilization)).unwrap_or(0.0);

    let staffing_level = if config.target_headcount > 0 {
        staff.len() as f64 / f64::from(config.target_headcount) * 100.0
    } else {
        0.0
    };

    let waiting_list_size = backlog.iter().filter(|p| p.is_waiting()).count();

    let avg_turnover_minutes = mean(
        week_sessions
            .iter()
            .filter_map(|s| s.turnover_minutes)
            .map(f64::from),
    )
    .unwrap_or(config.default_turnover_minutes);

    let cancellation_rate = if week_sessions.iter().any(|s| s.status.is_some()) {
        let cancelled = week_sessions.iter().filter(|s| s.is_cancelled()).count();
        cancelled as f64 / week_sessions.len() as f64 * 100.0
    } else {
        config.default_cancellation_rate
    };

    MetricsSnapshot {
        today_utilization,
        week_utilization,
        staffing_level,
        waiting_list_size,
        avg_turnover_minutes,
        cancellation_rate,
    }
}

/// Fetch the inputs for `today` and aggregate them.
///
/// Any failing fetch collapses the whole snapshot to zeros.
pub async fn compute_metrics(
    store: &dyn OperationalStore,
    today: NaiveDate,
    config: &PipelineConfig,
) -> MetricsSnapshot {
    let (week_start, week_end) = week_bounds(today);
    let week_filter = ScheduleFilter::between(week_start, week_end);
    let waiting_filter = BacklogFilter::with_status(WAITING_STATUS);

    let (sessions, staff, backlog) = tokio::join!(
        store.schedules(&week_filter),
        store.staff(None),
        store.backlog(&waiting_filter),
    );

    match (sessions, staff, backlog) {
        (Ok(sessions), Ok(staff), Ok(backlog)) => {
            let snapshot = aggregate(today, &sessions, &staff, &backlog, config);
            debug!(
                today_utilization = snapshot.today_utilization,
                staffing_level = snapshot.staffing_level,
                waiting_list_size = snapshot.waiting_list_size,
                "Metrics computed"
            );
            snapshot
        }
        (sessions, staff, backlog) => {
            let failure = [sessions.err(), staff.err(), backlog.err()]
                .into_iter()
                .flatten()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            warn!("Metrics computation failed, using zeroed snapshot: {}", failure);
            MetricsSnapshot::default()
        }
    }
}
