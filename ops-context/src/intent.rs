//! Rule-table classification of free-text operational questions.
//!
//! Markers match at word starts, so `sessions` hits the `session` marker while
//! `this` does not hit the casual greeting `hi`.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryCategory {
    Schedule,
    Staffing,
    Procedures,
    Analytics,
    Conflicts,
    WaitingList,
    Financial,
    Resources,
    Recommendations,
}

impl QueryCategory {
    pub const ALL: [QueryCategory; 9] = [
        QueryCategory::Schedule,
        QueryCategory::Staffing,
        QueryCategory::Procedures,
        QueryCategory::Analytics,
        QueryCategory::Conflicts,
        QueryCategory::WaitingList,
        QueryCategory::Financial,
        QueryCategory::Resources,
        QueryCategory::Recommendations,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QueryCategory::Schedule => "schedule",
            QueryCategory::Staffing => "staffing",
            QueryCategory::Procedures => "procedures",
            QueryCategory::Analytics => "analytics",
            QueryCategory::Conflicts => "conflicts",
            QueryCategory::WaitingList => "waiting-list",
            QueryCategory::Financial => "financial",
            QueryCategory::Resources => "resources",
            QueryCategory::Recommendations => "recommendations",
        }
    }
}

impl fmt::Display for QueryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    #[default]
    Neutral,
    Urgent,
    Analytical,
    Casual,
}

/// Actions the user asked for explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplicitAction {
    Display,
    Verify,
    Search,
    Compare,
    Forecast,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct QueryEntities {
    pub dates: Vec<String>,
    pub times: Vec<String>,
    pub specialties: Vec<String>,
}

/// Structured reading of one query. Immutable once derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct QueryIntent {
    pub categories: BTreeSet<QueryCategory>,
    pub entities: QueryEntities,
    pub sentiment: Sentiment,
    pub explicit_actions: Vec<ExplicitAction>,
}

impl QueryIntent {
    pub fn has_category(&self, category: QueryCategory) -> bool {
        self.categories.contains(&category)
    }
}

fn marker_regex(pattern: &str) -> Regex {
    Regex::new(&format!(r"\b(?:{pattern})")).expect("marker regex is valid")
}

static CATEGORY_RULES: LazyLock<Vec<(QueryCategory, Regex)>> = LazyLock::new(|| {
    [
        (
            QueryCategory::Schedule,
            "schedul|session|list|case|theatre|tomorrow|today",
        ),
        (
            QueryCategory::Staffing,
            "staff|team|people|nurse|surgeon|anaesthetist|available|roster",
        ),
        (QueryCategory::Procedures, "procedure|operation|surger|opcs"),
        (
            QueryCategory::Analytics,
            "analy[sz]|report|trend|pattern|utili[sz]ation|metric|kpi",
        ),
        (
            QueryCategory::Conflicts,
            "conflict|issue|problem|clash|overlap|alert",
        ),
        (QueryCategory::WaitingList, "wait|delay|backlog|queue"),
        (QueryCategory::Financial, "cost|budget|financ|tariff|spend"),
        (QueryCategory::Resources, "equipment|suppl|inventory|stock"),
        (
            QueryCategory::Recommendations,
            "insight|suggest|recommend|optimi[sz]|improv|what should",
        ),
    ]
    .into_iter()
    .map(|(category, pattern)| (category, marker_regex(pattern)))
    .collect()
});

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:tomorrow|today|monday|tuesday|wednesday|thursday|friday|saturday|sunday|next week|this week)\b",
    )
    .expect("date regex is valid")
});

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{1,2}:\d{2}\b|\b\d{1,2}\s?(?:am|pm)\b").expect("time regex is valid")
});

/// Specialty vocabulary: reported label and the word-start pattern that finds it.
static SPECIALTIES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("orthopaedics", r"\borthopaedic"),
        ("cardio", r"\bcardio"),
        ("neuro", r"\bneuro"),
        ("general surgery", r"\bgeneral surgery\b"),
        ("urology", r"\burolog"),
        ("gynae", r"\bgynae"),
        ("ent", r"\bent\b"),
        ("plastics", r"\bplastics\b"),
    ]
    .into_iter()
    .map(|(label, pattern)| (label, Regex::new(pattern).expect("specialty regex is valid")))
    .collect()
});

static SENTIMENT_RULES: LazyLock<Vec<(Sentiment, Regex)>> = LazyLock::new(|| {
    vec![
        (
            Sentiment::Urgent,
            marker_regex(r"urgent|emergenc|critical|asap|immediately|now\b"),
        ),
        (
            Sentiment::Analytical,
            marker_regex("analy[sz]|report|statistic|trend"),
        ),
        // Whole words: "hi" would otherwise catch "history".
        (
            Sentiment::Casual,
            Regex::new(r"\b(?:hi|hello|thanks|thank you|please|could you)\b")
                .expect("casual regex is valid"),
        ),
    ]
});

const ACTION_VERBS: [(&str, ExplicitAction); 5] = [
    ("show", ExplicitAction::Display),
    ("check", ExplicitAction::Verify),
    ("find", ExplicitAction::Search),
    ("compare", ExplicitAction::Compare),
    ("predict", ExplicitAction::Forecast),
];

/// Classify a query. Never fails; an unrecognised query yields an empty intent.
pub fn analyze_query(query: &str) -> QueryIntent {
    let lowered = query.to_lowercase();

    let categories = CATEGORY_RULES
        .iter()
        .filter(|(_, re)| re.is_match(&lowered))
        .map(|(category, _)| *category)
        .collect();

    let entities = QueryEntities {
        dates: DATE_RE
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .collect(),
        times: TIME_RE
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .collect(),
        specialties: SPECIALTIES
            .iter()
            .filter(|(_, re)| re.is_match(&lowered))
            .map(|(label, _)| label.to_string())
            .collect(),
    };

    let sentiment = SENTIMENT_RULES
        .iter()
        .find(|(_, re)| re.is_match(&lowered))
        .map(|(sentiment, _)| *sentiment)
        .unwrap_or_default();

    let explicit_actions = ACTION_VERBS
        .iter()
        .filter(|(verb, _)| lowered.contains(verb))
        .map(|(_, action)| *action)
        .collect();

    QueryIntent {
        categories,
        entities,
        sentiment,
        explicit_actions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_query_with_tomorrow() {
        let intent = analyze_query("Show tomorrow's sessions");
        assert!(intent.has_category(QueryCategory::Schedule));
        assert_eq!(intent.entities.dates, vec!["tomorrow"]);
        assert_eq!(intent.explicit_actions, vec![ExplicitAction::Display]);
        assert_eq!(intent.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn categories_are_not_exclusive() {
        let intent = analyze_query("Analyse staff utilisation and the waiting list backlog");
        let expected: BTreeSet<_> = [
            QueryCategory::Schedule,
            QueryCategory::Staffing,
            QueryCategory::Analytics,
            QueryCategory::WaitingList,
        ]
        .into_iter()
        .collect();
        assert_eq!(intent.categories, expected);
    }

    #[test]
    fn unrelated_query_has_no_categories() {
        let intent = analyze_query("What colour is the sky?");
        assert!(intent.categories.is_empty());
        assert!(intent.entities.dates.is_empty());
        assert!(intent.explicit_actions.is_empty());
    }

    #[test]
    fn categories_stay_in_vocabulary() {
        let intent = analyze_query(
            "urgent: check cost of equipment, suggest improvements, any clash in theatre 3 today?",
        );
        assert!(!intent.categories.is_empty());
        assert!(
            intent
                .categories
                .iter()
                .all(|c| QueryCategory::ALL.contains(c))
        );
    }

    #[test]
    fn extracts_times_and_specialties() {
        let intent =
            analyze_query("Is there an orthopaedic list at 8:30 or 2pm? Also ENT and cardiothoracic");
        assert_eq!(intent.entities.times, vec!["8:30", "2pm"]);
        assert_eq!(
            intent.entities.specialties,
            vec!["orthopaedics", "cardio", "ent"]
        );
    }

    #[test]
    fn specialty_needs_word_boundary() {
        let intent = analyze_query("How is the patient in recovery?");
        assert!(intent.entities.specialties.is_empty());
    }

    #[test]
    fn sentiment_first_rule_wins() {
        assert_eq!(
            analyze_query("Urgent: give me the trend report").sentiment,
            Sentiment::Urgent
        );
        assert_eq!(
            analyze_query("Please give me the trend report").sentiment,
            Sentiment::Analytical
        );
        assert_eq!(
            analyze_query("Hello, could you help?").sentiment,
            Sentiment::Casual
        );
        assert_eq!(
            analyze_query("Which theatre is this?").sentiment,
            Sentiment::Neutral
        );
    }

    #[test]
    fn urgency_markers_match_word_prefixes() {
        for query in [
            "We urgently need theatre 2 covered",
            "two emergencies came in",
            "this is critically late",
            "Cover theatre 3 now",
        ] {
            assert_eq!(analyze_query(query).sentiment, Sentiment::Urgent, "{query}");
        }
        assert_eq!(
            analyze_query("Show the theatre history for nowhere ward").sentiment,
            Sentiment::Neutral
        );
    }

    #[test]
    fn all_action_verbs_are_kept() {
        let intent = analyze_query("Find and compare, then predict and show");
        assert_eq!(
            intent.explicit_actions,
            vec![
                ExplicitAction::Display,
                ExplicitAction::Search,
                ExplicitAction::Compare,
                ExplicitAction::Forecast,
            ]
        );
    }

    #[test]
    fn week_phrases_are_dates() {
        let intent = analyze_query("Compare this week with next week and Friday");
        assert_eq!(intent.entities.dates, vec!["this week", "next week", "friday"]);
    }
}
