use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate};
use tracing::{debug, warn};

use crate::{
    models::{DailyUtilization, HistoricalSummary, IssueFrequency, PeakTime},
    records::ScheduleRecord,
    store::{OperationalStore, ScheduleFilter},
};

const PEAK_TIME_LIMIT: usize = 3;
const COMMON_ISSUE_LIMIT: usize = 5;

/// `HH:00` bucket for a start time such as `8:30` or `14:05`.
fn hour_bucket(start_time: &str) -> Option<String> {
    let hour: u32 = start_time.split(':').next()?.trim().parse().ok()?;
    (hour < 24).then(|| format!("{hour:02}:00"))
}

/// First day of the trailing window, or `None` when it falls outside the calendar.
fn window_start(today: NaiveDate, window_days: u32) -> Option<NaiveDate> {
    today.checked_sub_signed(Duration::days(i64::from(window_days)))
}

/// Summarise the `window_days` days before `today` from their sessions.
pub fn summarize(
    today: NaiveDate,
    window_days: u32,
    sessions: &[ScheduleRecord],
) -> HistoricalSummary {
    let Some(start) = window_start(today, window_days).filter(|_| window_days > 0) else {
        return HistoricalSummary::default();
    };

    let mut by_day: BTreeMap<NaiveDate, Vec<&ScheduleRecord>> = (0..window_days)
        .map(|offset| (start + Duration::days(i64::from(offset)), Vec::new()))
        .collect();
    for session in sessions {
        if let Some(bucket) = session.date.and_then(|d| by_day.get_mut(&d)) {
            bucket.push(session);
        }
    }

    let daily_trends = by_day
        .iter()
        .map(|(date, day_sessions)| {
            let utilization = if day_sessions.is_empty() {
                0.0
            } else {
                day_sessions.iter().map(|s| s.utilization()).sum::<f64>() / day_sessions.len() as f64
            };
            DailyUtilization {
                date: *date,
                sessions: day_sessions.len(),
                utilization: (utilization * 10.0).round() / 10.0,
            }
        })
        .collect();

    let windowed = || by_day.values().flatten();

    let mut hour_counts: BTreeMap<String, usize> = BTreeMap::new();
    for session in windowed() {
        if let Some(bucket) = session.start_time.as_deref().and_then(hour_bucket) {
            *hour_counts.entry(bucket).or_default() += 1;
        }
    }
    let mut peaks: Vec<(String, usize)> = hour_counts.into_iter().collect();
    peaks.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let peak_times = peaks
        .into_iter()
        .take(PEAK_TIME_LIMIT)
        .map(|(time, count)| PeakTime {
            time,
            avg_sessions: count as f64 / f64::from(window_days),
        })
        .collect();

    let mut issue_counts: HashMap<&str, usize> = HashMap::new();
    for issue in windowed().flat_map(|s| s.issues.iter()) {
        *issue_counts.entry(issue.as_str()).or_default() += 1;
    }
    let mut issues: Vec<IssueFrequency> = issue_counts
        .into_iter()
        .map(|(issue, frequency)| IssueFrequency {
            issue: issue.to_string(),
            frequency,
        })
        .collect();
    issues.sort_by(|a, b| b.frequency.cmp(&a.frequency).then_with(|| a.issue.cmp(&b.issue)));
    issues.truncate(COMMON_ISSUE_LIMIT);

    HistoricalSummary {
        window_days,
        daily_trends,
        peak_times,
        common_issues: issues,
    }
}

/// Fetch the trailing window and summarise it. Failures yield an empty summary.
pub async fn summarize_history(
    store: &dyn OperationalStore,
    today: NaiveDate,
    window_days: u32,
) -> HistoricalSummary {
    if window_days == 0 {
        return HistoricalSummary::default();
    }
    let Some(start) = window_start(today, window_days) else {
        warn!(window_days, "Historical window starts outside the calendar");
        return HistoricalSummary::default();
    };
    let filter = ScheduleFilter::between(start, today - Duration::days(1));

    match store.schedules(&filter).await {
        Ok(sessions) => {
            debug!(
                window_days,
                sessions = sessions.len(),
                "Historical window loaded"
            );
            summarize(today, window_days, &sessions)
        }
        Err(e) => {
            warn!("Historical summary unavailable: {}", e);
            HistoricalSummary::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryOperationalStore;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn session(id: &str, date: &str, start: &str, issues: &[&str]) -> ScheduleRecord {
        ScheduleRecord::from_document(
            id,
            &json!({
                "date": date,
                "startTime": start,
                "sessionType": "AM",
                "bookedMinutes": 120,
                "issues": issues,
            }),
        )
    }

    #[test]
    fn hour_bucket_normalises_start_times() {
        assert_eq!(hour_bucket("8:30"), Some("08:00".to_string()));
        assert_eq!(hour_bucket("14:05"), Some("14:00".to_string()));
        assert_eq!(hour_bucket("late"), None);
        assert_eq!(hour_bucket("25:00"), None);
    }

    #[test]
    fn daily_trends_cover_whole_window() {
        let sessions = vec![session("a", "2026-10-15", "08:00", &[])];
        let summary = summarize(today(), 7, &sessions);

        assert_eq!(summary.daily_trends.len(), 7);
        assert_eq!(
            summary.daily_trends.first().map(|d| d.date),
            NaiveDate::from_ymd_opt(2026, 10, 9)
        );
        let last = summary.daily_trends.last().unwrap();
        assert_eq!(last.date, NaiveDate::from_ymd_opt(2026, 10, 15).unwrap());
        assert_eq!(last.sessions, 1);
        assert_eq!(last.utilization, 50.0);
    }

    #[test]
    fn sessions_outside_window_are_ignored() {
        let sessions = vec![session("a", "2026-10-16", "08:00", &["Late start"])];
        let summary = summarize(today(), 7, &sessions);
        assert!(summary.peak_times.is_empty());
        assert!(summary.common_issues.is_empty());
    }

    #[test]
    fn peaks_and_issues_are_frequency_ranked() {
        let sessions = vec![
            session("a", "2026-10-14", "08:00", &["Late start", "Equipment delay"]),
            session("b", "2026-10-15", "08:30", &["Late start"]),
            session("c", "2026-10-15", "13:00", &["Late start"]),
            session("d", "2026-10-13", "10:00", &[]),
            session("e", "2026-10-12", "13:15", &[]),
            session("f", "2026-10-11", "17:00", &[]),
        ];
        let summary = summarize(today(), 7, &sessions);

        let times: Vec<_> = summary.peak_times.iter().map(|p| p.time.as_str()).collect();
        assert_eq!(times, vec!["08:00", "13:00", "10:00"]);
        assert!((summary.peak_times[0].avg_sessions - 2.0 / 7.0).abs() < 1e-9);

        assert_eq!(
            summary.common_issues,
            vec![
                IssueFrequency { issue: "Late start".to_string(), frequency: 3 },
                IssueFrequency { issue: "Equipment delay".to_string(), frequency: 1 },
            ]
        );
    }

    #[test]
    fn zero_window_is_empty() {
        assert!(summarize(today(), 0, &[]).is_empty());
    }

    #[test]
    fn window_past_calendar_start_is_empty() {
        let sessions = vec![session("a", "2026-10-15", "08:00", &["Late start"])];
        assert!(summarize(today(), u32::MAX, &sessions).is_empty());
    }

    #[tokio::test]
    async fn history_with_unrepresentable_window_is_empty() {
        let store = InMemoryOperationalStore::new();
        store.insert_schedule(json!({ "date": "2026-10-15", "startTime": "08:00" }));
        assert!(summarize_history(&store, today(), 200_000_000).await.is_empty());
        assert!(!summarize_history(&store, today(), 7).await.is_empty());
    }
}
