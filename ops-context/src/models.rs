use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::intent::QueryCategory;
use crate::records::{ProcedureRecord, ScheduleRecord, StaffRecord, TheatreRecord};

/// Which screen the user is looking at when they ask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewType {
    Schedule,
    Staff,
    Procedures,
    Analytics,
    Settings,
    #[default]
    Home,
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ViewType::Schedule => "schedule",
            ViewType::Staff => "staff",
            ViewType::Procedures => "procedures",
            ViewType::Analytics => "analytics",
            ViewType::Settings => "settings",
            ViewType::Home => "home",
        };
        f.write_str(label)
    }
}

/// Page/location context supplied by the caller. Only narrows retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PageContext {
    pub current_page: String,
    #[serde(default)]
    pub view_type: ViewType,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_theatre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_specialty: Option<String>,
}

impl PageContext {
    pub fn new(current_page: impl Into<String>, view_type: ViewType) -> Self {
        Self {
            current_page: current_page.into(),
            view_type,
            ..Default::default()
        }
    }
}

/// The independent sources consulted during retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Schedule,
    Staff,
    Backlog,
    Resources,
    Metrics,
    Historical,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DataSource::Schedule => "schedule",
            DataSource::Staff => "staff",
            DataSource::Backlog => "backlog",
            DataSource::Resources => "resources",
            DataSource::Metrics => "metrics",
            DataSource::Historical => "historical",
        };
        f.write_str(label)
    }
}

/// Scalar aggregates for today. All zero when the computation failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub today_utilization: f64,
    pub week_utilization: f64,
    pub staffing_level: f64,
    pub waiting_list_size: usize,
    pub avg_turnover_minutes: f64,
    pub cancellation_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyUtilization {
    pub date: NaiveDate,
    pub sessions: usize,
    pub utilization: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakTime {
    /// Start-hour bucket, `HH:00`.
    pub time: String,
    pub avg_sessions: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueFrequency {
    pub issue: String,
    pub frequency: usize,
}

/// Coarse trailing-window trends. Best effort; every list may be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalSummary {
    pub window_days: u32,
    pub daily_trends: Vec<DailyUtilization>,
    pub peak_times: Vec<PeakTime>,
    pub common_issues: Vec<IssueFrequency>,
}

impl HistoricalSummary {
    pub fn is_empty(&self) -> bool {
        self.daily_trends.is_empty() && self.peak_times.is_empty() && self.common_issues.is_empty()
    }
}

/// Everything retrieved for one invocation. Every field is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DataContext {
    pub schedules: Vec<ScheduleRecord>,
    pub staff: Vec<StaffRecord>,
    pub procedures: Vec<ProcedureRecord>,
    pub theatres: Vec<TheatreRecord>,
    pub metrics: MetricsSnapshot,
    pub historical: HistoricalSummary,
}

impl DataContext {
    /// Sources that contributed to this context, in a fixed order.
    pub fn sources_used(&self) -> Vec<DataSource> {
        let mut sources = Vec::new();
        if !self.schedules.is_empty() {
            sources.push(DataSource::Schedule);
        }
        if !self.staff.is_empty() {
            sources.push(DataSource::Staff);
        }
        if !self.procedures.is_empty() {
            sources.push(DataSource::Backlog);
        }
        if !self.theatres.is_empty() {
            sources.push(DataSource::Resources);
        }
        sources.push(DataSource::Metrics);
        sources.push(DataSource::Historical);
        sources
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Alert,
    Opportunity,
    Trend,
    Anomaly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

/// Two sessions booked into the same theatre slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConflict {
    pub theatre: String,
    pub date: NaiveDate,
    pub time: String,
    pub sessions: [String; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InsightData {
    Conflicts(Vec<ScheduleConflict>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<InsightData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    High,
    Medium,
    Low,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::High => "high",
            Level::Medium => "medium",
            Level::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationCategory {
    Efficiency,
    Safety,
    Cost,
    Quality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub impact: Level,
    pub effort: Level,
    pub category: RecommendationCategory,
}

/// Inclusive date range used for schedule retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl RetrievalWindow {
    pub fn single(date: NaiveDate) -> Self {
        Self {
            from: date,
            to: date,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

impl fmt::Display for RetrievalWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.from == self.to {
            write!(f, "{}", self.from)
        } else {
            write!(f, "{} to {}", self.from, self.to)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextMetadata {
    pub timestamp: DateTime<Utc>,
    pub query_categories: Vec<QueryCategory>,
    pub sources_used: Vec<DataSource>,
    pub retrieval_window: RetrievalWindow,
    pub processing_time_ms: u64,
}

/// Top-level output of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_context: Option<PageContext>,
    pub data_context: DataContext,
    pub insights: Vec<Insight>,
    pub recommendations: Vec<Recommendation>,
    pub metadata: ContextMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_context_reads_camel_case() {
        let page: PageContext = serde_json::from_value(json!({
            "currentPage": "/schedule",
            "viewType": "schedule",
            "selectedDate": "2026-10-17",
            "selectedTheatre": "Theatre 1"
        }))
        .unwrap();

        assert_eq!(page.view_type, ViewType::Schedule);
        assert_eq!(page.selected_date, NaiveDate::from_ymd_opt(2026, 10, 17));
        assert_eq!(page.selected_theatre.as_deref(), Some("Theatre 1"));
        assert!(page.selected_specialty.is_none());
    }

    #[test]
    fn empty_data_context_still_reports_metric_sources() {
        let context = DataContext::default();
        assert_eq!(
            context.sources_used(),
            vec![DataSource::Metrics, DataSource::Historical]
        );
    }

    #[test]
    fn insight_serializes_kind_as_type() {
        let insight = Insight {
            kind: InsightKind::Opportunity,
            severity: Severity::Low,
            title: "Available Theatre Capacity".to_string(),
            description: "capacity available".to_string(),
            data: None,
            action: None,
        };
        let value = serde_json::to_value(&insight).unwrap();
        assert_eq!(value["type"], "opportunity");
        assert_eq!(value["severity"], "low");
        assert!(value.get("data").is_none());
    }

    #[test]
    fn window_display_collapses_single_day() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(RetrievalWindow::single(day).to_string(), "2026-10-16");
    }
}
