//! Serialises a [`ContextResult`] into the text block injected into the
//! assistant's system prompt.
//!
//! Sections always appear in the same order and are never omitted; empty data
//! renders as zero counts. Output depends only on the input value.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use crate::models::{ContextResult, InsightKind};

/// Schedule rows listed before truncating to a "... and N more" line.
pub const MAX_SCHEDULE_ROWS: usize = 10;
/// Recommendations listed, in rule order.
pub const MAX_RECOMMENDATIONS: usize = 3;

fn join_or_none<T: Display>(items: &[T]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn insight_tag(kind: InsightKind) -> &'static str {
    match kind {
        InsightKind::Alert => "ALERT",
        InsightKind::Opportunity => "OPPORTUNITY",
        InsightKind::Trend => "TREND",
        InsightKind::Anomaly => "ANOMALY",
    }
}

/// Display adapter over a borrowed result.
pub struct ContextBlock<'a>(pub &'a ContextResult);

impl ContextBlock<'_> {
    fn write_page(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Some(page) = &self.0.page_context else {
            return Ok(());
        };
        writeln!(f, "USER LOCATION: {}", page.current_page)?;
        writeln!(f, "   View Type: {}", page.view_type)?;
        if let Some(date) = page.selected_date {
            writeln!(f, "   Viewing Date: {}", date)?;
        }
        if let Some(theatre) = &page.selected_theatre {
            writeln!(f, "   Theatre: {}", theatre)?;
        }
        if let Some(specialty) = &page.selected_specialty {
            writeln!(f, "   Specialty: {}", specialty)?;
        }
        writeln!(f)
    }

    fn write_metrics(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let metrics = &self.0.data_context.metrics;
        writeln!(f, "KEY METRICS:")?;
        writeln!(f, "   Today's Utilization: {:.1}%", metrics.today_utilization)?;
        writeln!(f, "   Week Utilization: {:.1}%", metrics.week_utilization)?;
        writeln!(f, "   Staffing Level: {:.0}%", metrics.staffing_level)?;
        writeln!(f, "   Waiting List: {} procedures", metrics.waiting_list_size)?;
        writeln!(f, "   Avg Turnover: {:.0}min", metrics.avg_turnover_minutes)?;
        writeln!(f, "   Cancellation Rate: {:.1}%", metrics.cancellation_rate)?;
        writeln!(f)
    }

    fn write_insights(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let insights = &self.0.insights;
        writeln!(f, "PROACTIVE INSIGHTS ({}):", insights.len())?;
        if insights.is_empty() {
            writeln!(f, "   No thresholds crossed")?;
        }
        for (i, insight) in insights.iter().enumerate() {
            writeln!(
                f,
                "{}. [{}] [{}] {}",
                i + 1,
                insight.severity.as_str().to_uppercase(),
                insight_tag(insight.kind),
                insight.title
            )?;
            writeln!(f, "      {}", insight.description)?;
            if let Some(action) = &insight.action {
                writeln!(f, "      -> {}", action)?;
            }
        }
        writeln!(f)
    }

    fn write_recommendations(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let recommendations = &self.0.recommendations;
        writeln!(f, "SMART RECOMMENDATIONS ({}):", recommendations.len())?;
        if recommendations.is_empty() {
            writeln!(f, "   None")?;
        }
        for (i, rec) in recommendations.iter().take(MAX_RECOMMENDATIONS).enumerate() {
            writeln!(
                f,
                "{}. {} (Impact: {}, Effort: {})",
                i + 1,
                rec.title,
                rec.impact.as_str(),
                rec.effort.as_str()
            )?;
            writeln!(f, "      {}", rec.description)?;
        }
        writeln!(f)
    }

    fn write_schedule(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let schedules = &self.0.data_context.schedules;
        writeln!(f, "SCHEDULE DATA ({} sessions):", schedules.len())?;
        for (i, session) in schedules.iter().take(MAX_SCHEDULE_ROWS).enumerate() {
            let date = session
                .date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "undated".to_string());
            write!(f, "{}. {} - {}", i + 1, session.theatre_label(), date)?;
            if let Some(start) = &session.start_time {
                write!(f, " {}", start)?;
            }
            writeln!(f)?;
            if let Some(specialty) = &session.specialty {
                writeln!(f, "      Specialty: {}", specialty)?;
            }
            if let Some(surgeon) = &session.surgeon {
                writeln!(f, "      Surgeon: {}", surgeon)?;
            }
        }
        if schedules.len() > MAX_SCHEDULE_ROWS {
            writeln!(f, "... and {} more", schedules.len() - MAX_SCHEDULE_ROWS)?;
        }
        writeln!(f)
    }

    fn write_staff(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let staff = &self.0.data_context.staff;
        writeln!(f, "STAFF AVAILABLE ({} members):", staff.len())?;
        let mut by_role: BTreeMap<&str, usize> = BTreeMap::new();
        for member in staff {
            *by_role.entry(member.role.as_str()).or_default() += 1;
        }
        for (role, count) in by_role {
            writeln!(f, "   {}: {} available", role, count)?;
        }
        writeln!(f)
    }

    fn write_metadata(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let metadata = &self.0.metadata;
        writeln!(f, "CONTEXT METADATA:")?;
        writeln!(f, "   Generated At: {}", metadata.timestamp.to_rfc3339())?;
        writeln!(f, "   Processing Time: {}ms", metadata.processing_time_ms)?;
        writeln!(f, "   Schedule Window: {}", metadata.retrieval_window)?;
        writeln!(f, "   Data Sources: {}", join_or_none(&metadata.sources_used))?;
        writeln!(f, "   Query Type: {}", join_or_none(&metadata.query_categories))
    }
}

impl Display for ContextBlock<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.write_page(f)?;
        self.write_metrics(f)?;
        self.write_insights(f)?;
        self.write_recommendations(f)?;
        self.write_schedule(f)?;
        self.write_staff(f)?;
        self.write_metadata(f)
    }
}

/// Render the context block for prompt injection.
pub fn format_context(result: &ContextResult) -> String {
    ContextBlock(result).to_string()
}
