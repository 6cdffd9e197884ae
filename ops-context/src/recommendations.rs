use crate::models::{
    DataContext, Insight, InsightKind, Level, Recommendation, RecommendationCategory, Severity,
};

pub const TURNOVER_TARGET_MINUTES: f64 = 30.0;
pub const OVERSTAFFING_LEVEL: f64 = 105.0;

/// Derive recommendations in rule order. The list is not capped here.
pub fn generate_recommendations(data: &DataContext, insights: &[Insight]) -> Vec<Recommendation> {
    let metrics = &data.metrics;
    let mut recommendations = Vec::new();

    if metrics.avg_turnover_minutes > TURNOVER_TARGET_MINUTES {
        recommendations.push(Recommendation {
            title: "Optimize Theatre Turnover".to_string(),
            description: format!(
                "Average turnover time is {:.0}min. Implement parallel cleaning protocols to reduce to target of 20min",
                metrics.avg_turnover_minutes
            ),
            impact: Level::High,
            effort: Level::Medium,
            category: RecommendationCategory::Efficiency,
        });
    }

    if metrics.staffing_level > OVERSTAFFING_LEVEL {
        recommendations.push(Recommendation {
            title: "Review Staffing Levels".to_string(),
            description: format!(
                "Staffing is at {:.0}% of target. Review rosters to optimize cost without compromising safety",
                metrics.staffing_level
            ),
            impact: Level::Medium,
            effort: Level::Low,
            category: RecommendationCategory::Cost,
        });
    }

    recommendations.push(Recommendation {
        title: "Implement Predictive Scheduling".to_string(),
        description: "Use historical data to predict procedure durations more accurately, reducing overruns by 15%".to_string(),
        impact: Level::High,
        effort: Level::High,
        category: RecommendationCategory::Quality,
    });

    if insights
        .iter()
        .any(|i| i.kind == InsightKind::Alert && i.severity == Severity::High)
    {
        recommendations.push(Recommendation {
            title: "Deploy Real-time Alerts".to_string(),
            description: "Enable proactive notifications for conflicts, capacity issues, and safety concerns".to_string(),
            impact: Level::High,
            effort: Level::Low,
            category: RecommendationCategory::Safety,
        });
    }

    recommendations
}
