//! Threshold and pattern rules that turn a data context into insights.
//!
//! Every rule is evaluated independently and insights come out in rule order.
//! All comparisons are strict: a value sitting exactly on a threshold does not
//! fire.

use crate::models::{
    DataContext, Insight, InsightData, InsightKind, ScheduleConflict, Severity,
};
use crate::records::ScheduleRecord;

pub const CRITICAL_UTILIZATION: f64 = 95.0;
pub const MIN_STAFFING_LEVEL: f64 = 80.0;
pub const WAITING_LIST_ALERT: usize = 100;
pub const LOW_UTILIZATION: f64 = 70.0;
pub const CANCELLATION_RATE_ALERT: f64 = 5.0;

/// Every pair of sessions sharing theatre, date and start time.
///
/// Sessions missing any of the three never collide.
pub fn detect_schedule_conflicts(schedules: &[ScheduleRecord]) -> Vec<ScheduleConflict> {
    let mut conflicts = Vec::new();
    for (i, first) in schedules.iter().enumerate() {
        let (Some(theatre), Some(date), Some(time)) =
            (first.theatre.as_deref(), first.date, first.start_time.as_deref())
        else {
            continue;
        };
        for second in &schedules[i + 1..] {
            if second.theatre.as_deref() == Some(theatre)
                && second.date == Some(date)
                && second.start_time.as_deref() == Some(time)
            {
                conflicts.push(ScheduleConflict {
                    theatre: theatre.to_string(),
                    date,
                    time: time.to_string(),
                    sessions: [first.id.clone(), second.id.clone()],
                });
            }
        }
    }
    conflicts
}

pub fn generate_insights(data: &DataContext) -> Vec<Insight> {
    let metrics = &data.metrics;
    let mut insights = Vec::new();

    if metrics.today_utilization > CRITICAL_UTILIZATION {
        insights.push(Insight {
            kind: InsightKind::Alert,
            severity: Severity::High,
            title: "Theatre Capacity Critical".to_string(),
            description: format!(
                "Today's utilization is {:.1}% - near maximum capacity",
                metrics.today_utilization
            ),
            data: None,
            action: Some(
                "Consider adding evening sessions or rescheduling non-urgent cases".to_string(),
            ),
        });
    }

    if metrics.staffing_level < MIN_STAFFING_LEVEL {
        insights.push(Insight {
            kind: InsightKind::Alert,
            severity: Severity::High,
            title: "Staffing Below Target".to_string(),
            description: format!(
                "Current staffing at {:.0}% of target",
                metrics.staffing_level
            ),
            data: None,
            action: Some("Review bank/agency staff availability".to_string()),
        });
    }

    if metrics.waiting_list_size > WAITING_LIST_ALERT {
        insights.push(Insight {
            kind: InsightKind::Trend,
            severity: Severity::Medium,
            title: "Growing Waiting List".to_string(),
            description: format!(
                "{} procedures awaiting scheduling",
                metrics.waiting_list_size
            ),
            data: None,
            action: Some("Prioritize high-urgency cases and optimize scheduling".to_string()),
        });
    }

    let conflicts = detect_schedule_conflicts(&data.schedules);
    if !conflicts.is_empty() {
        insights.push(Insight {
            kind: InsightKind::Alert,
            severity: Severity::High,
            title: "Schedule Conflicts Detected".to_string(),
            description: format!(
                "Found {} potential scheduling conflicts",
                conflicts.len()
            ),
            data: Some(InsightData::Conflicts(conflicts)),
            action: Some("Review and resolve conflicts immediately".to_string()),
        });
    }

    if metrics.today_utilization < LOW_UTILIZATION {
        insights.push(Insight {
            kind: InsightKind::Opportunity,
            severity: Severity::Low,
            title: "Available Theatre Capacity".to_string(),
            description: format!(
                "Current utilization is {:.1}% - capacity available",
                metrics.today_utilization
            ),
            data: None,
            action: Some("Consider scheduling additional cases from waiting list".to_string()),
        });
    }

    if metrics.cancellation_rate > CANCELLATION_RATE_ALERT {
        insights.push(Insight {
            kind: InsightKind::Anomaly,
            severity: Severity::Medium,
            title: "Elevated Cancellation Rate".to_string(),
            description: format!(
                "Cancellation rate at {:.1}% (target: <3%)",
                metrics.cancellation_rate
            ),
            data: None,
            action: Some(
                "Investigate cancellation reasons and implement preventive measures".to_string(),
            ),
        });
    }

    insights
}
