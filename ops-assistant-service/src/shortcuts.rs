//! Fast-path voice command table.
//!
//! A message is lowercased and trimmed, then tested against each shortcut's
//! patterns in table order; the first hit wins. Navigation and help shortcuts
//! answer on their own. Query shortcuts answer immediately and still let the
//! message continue into the context pipeline.

use std::sync::LazyLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShortcutCategory {
    Schedule,
    Staff,
    Status,
    Analytics,
    Navigation,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Navigate,
    Display,
    Query,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortcutAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Result of a matched shortcut.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutMatch {
    pub id: &'static str,
    pub category: ShortcutCategory,
    pub response: String,
    pub action: ShortcutAction,
    pub continue_to_pipeline: bool,
}

/// Catalogue entry for the listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortcutInfo {
    pub id: &'static str,
    pub category: ShortcutCategory,
    pub description: &'static str,
    pub examples: &'static [&'static str],
}

enum Reply {
    Fixed(&'static str),
    /// Schedule for today plus the given number of days.
    ScheduleFor {
        days_ahead: i64,
        label: &'static str,
    },
    Help,
}

struct Shortcut {
    id: &'static str,
    category: ShortcutCategory,
    patterns: &'static [&'static str],
    description: &'static str,
    examples: &'static [&'static str],
    reply: Reply,
    action: ActionKind,
    target: Option<&'static str>,
    filter: Option<&'static str>,
    continues: bool,
}

const HELP_EXAMPLE_LIMIT: usize = 10;

static SHORTCUTS: [Shortcut; 13] = [
    Shortcut {
        id: "show-schedule-today",
        category: ShortcutCategory::Schedule,
        patterns: &["show.*today", "today.*schedule", "what.*today", "schedule.*today"],
        description: "Show today's theatre schedule",
        examples: &["Show me today's schedule", "What's on today?", "Today's cases"],
        reply: Reply::ScheduleFor {
            days_ahead: 0,
            label: "today's",
        },
        action: ActionKind::Query,
        target: Some("schedule"),
        filter: None,
        continues: true,
    },
    Shortcut {
        id: "show-schedule-tomorrow",
        category: ShortcutCategory::Schedule,
        patterns: &["show.*tomorrow", "tomorrow.*schedule", "what.*tomorrow", "schedule.*tomorrow"],
        description: "Show tomorrow's theatre schedule",
        examples: &["Show me tomorrow", "What's on tomorrow?", "Tomorrow's schedule"],
        reply: Reply::ScheduleFor {
            days_ahead: 1,
            label: "tomorrow's",
        },
        action: ActionKind::Query,
        target: Some("schedule"),
        filter: None,
        continues: true,
    },
    Shortcut {
        id: "check-staff-availability",
        category: ShortcutCategory::Staff,
        patterns: &["staff.*available", "who.*available", "check.*staff", "available.*staff"],
        description: "Check staff availability",
        examples: &["Who's available?", "Check staff availability", "Available staff"],
        reply: Reply::Fixed("Checking current staff availability..."),
        action: ActionKind::Query,
        target: Some("staff"),
        filter: Some("available"),
        continues: true,
    },
    Shortcut {
        id: "show-staff-roster",
        category: ShortcutCategory::Staff,
        patterns: &["staff.*roster", "show.*roster", "roster.*today", "who.*working"],
        description: "Show staff roster",
        examples: &["Show me the roster", "Who's working today?", "Staff roster"],
        reply: Reply::Fixed("Loading staff roster..."),
        action: ActionKind::Navigate,
        target: Some("/staff"),
        filter: None,
        continues: true,
    },
    Shortcut {
        id: "check-readiness",
        category: ShortcutCategory::Status,
        patterns: &["check.*readiness", "ready.*theatre", "readiness.*check", "theatre.*ready"],
        description: "Check theatre readiness status",
        examples: &["Check readiness", "Are we ready?", "Theatre readiness"],
        reply: Reply::Fixed("Running theatre readiness check..."),
        action: ActionKind::Query,
        target: Some("readiness"),
        filter: None,
        continues: true,
    },
    Shortcut {
        id: "check-conflicts",
        category: ShortcutCategory::Status,
        patterns: &["check.*conflict", "any.*conflict", "conflict.*check", "schedule.*conflict"],
        description: "Check for schedule conflicts",
        examples: &["Check for conflicts", "Any conflicts?", "Schedule conflicts"],
        reply: Reply::Fixed("Scanning for schedule conflicts..."),
        action: ActionKind::Query,
        target: Some("conflicts"),
        filter: None,
        continues: true,
    },
    Shortcut {
        id: "show-utilization",
        category: ShortcutCategory::Analytics,
        patterns: &["show.*utili[sz]ation", "utili[sz]ation.*rate", "capacity.*usage", "how.*busy"],
        description: "Show theatre utilization metrics",
        examples: &["Show utilization", "How busy are we?", "Capacity usage"],
        reply: Reply::Fixed("Analyzing theatre utilization..."),
        action: ActionKind::Query,
        target: Some("utilization"),
        filter: None,
        continues: true,
    },
    Shortcut {
        id: "show-metrics",
        category: ShortcutCategory::Analytics,
        patterns: &["show.*metrics", "key.*metrics", "dashboard", "overview"],
        description: "Show key metrics dashboard",
        examples: &["Show metrics", "Dashboard", "Key metrics"],
        reply: Reply::Fixed("Loading key performance metrics..."),
        action: ActionKind::Navigate,
        target: Some("/analytics"),
        filter: None,
        continues: true,
    },
    Shortcut {
        id: "go-to-schedule",
        category: ShortcutCategory::Navigation,
        patterns: &["^go to schedule", "^navigate.*schedule", "^open schedule"],
        description: "Navigate to schedule view",
        examples: &["Go to schedule", "Open schedule", "Navigate to schedule"],
        reply: Reply::Fixed("Opening theatre schedule..."),
        action: ActionKind::Navigate,
        target: Some("/schedule"),
        filter: None,
        continues: false,
    },
    Shortcut {
        id: "go-to-staff",
        category: ShortcutCategory::Navigation,
        patterns: &["^go to staff", "^navigate.*staff", "^open staff"],
        description: "Navigate to staff view",
        examples: &["Go to staff", "Open staff", "Navigate to staff"],
        reply: Reply::Fixed("Opening staff management..."),
        action: ActionKind::Navigate,
        target: Some("/staff"),
        filter: None,
        continues: false,
    },
    Shortcut {
        id: "go-to-procedures",
        category: ShortcutCategory::Navigation,
        patterns: &[
            "^go to procedures",
            "^navigate.*procedures",
            "^open.*procedures",
            "^waiting list",
        ],
        description: "Navigate to procedures view",
        examples: &["Go to procedures", "Open procedures", "Waiting list"],
        reply: Reply::Fixed("Opening procedures and waiting list..."),
        action: ActionKind::Navigate,
        target: Some("/procedures"),
        filter: None,
        continues: false,
    },
    Shortcut {
        id: "help",
        category: ShortcutCategory::General,
        patterns: &["^help$", "what can you do", "show.*commands", "available.*commands"],
        description: "Show available voice commands",
        examples: &["Help", "What can you do?", "Show commands"],
        reply: Reply::Help,
        action: ActionKind::Display,
        target: None,
        filter: None,
        continues: false,
    },
    Shortcut {
        id: "quick-status",
        category: ShortcutCategory::Status,
        patterns: &["^status$", "^quick.*status", "^how.*doing", "^everything ok"],
        description: "Get quick status overview",
        examples: &["Status", "How are we doing?", "Everything OK?"],
        reply: Reply::Fixed("Getting quick status overview..."),
        action: ActionKind::Query,
        target: Some("status"),
        filter: None,
        continues: true,
    },
];

static COMPILED: LazyLock<Vec<Vec<Regex>>> = LazyLock::new(|| {
    SHORTCUTS
        .iter()
        .map(|shortcut| {
            shortcut
                .patterns
                .iter()
                .map(|pattern| Regex::new(pattern).expect("shortcut pattern is valid"))
                .collect()
        })
        .collect()
});

fn help_text() -> String {
    let commands = SHORTCUTS
        .iter()
        .filter_map(|s| s.examples.first())
        .take(HELP_EXAMPLE_LIMIT)
        .map(|example| format!("- {example}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Here are some quick voice commands you can use:\n\n{commands}\n\nOr just ask me anything about theatre operations!"
    )
}

impl Shortcut {
    fn resolve(&self, today: NaiveDate) -> ShortcutMatch {
        let mut data = self.filter.map(|filter| json!({ "filter": filter }));
        let response = match &self.reply {
            Reply::Fixed(text) => text.to_string(),
            Reply::ScheduleFor { days_ahead, label } => {
                let day = today + Duration::days(*days_ahead);
                data = Some(json!({ "date": day.format("%Y-%m-%d").to_string() }));
                format!(
                    "Loading {label} theatre schedule for {}...",
                    day.format("%A, %-d %B")
                )
            }
            Reply::Help => help_text(),
        };

        ShortcutMatch {
            id: self.id,
            category: self.category,
            response,
            action: ShortcutAction {
                kind: self.action,
                target: self.target.map(str::to_string),
                data,
            },
            continue_to_pipeline: self.continues,
        }
    }
}

/// First shortcut whose pattern matches `message`, if any.
pub fn match_shortcut(message: &str, today: NaiveDate) -> Option<ShortcutMatch> {
    let cleaned = message.trim().to_lowercase();
    SHORTCUTS
        .iter()
        .zip(COMPILED.iter())
        .find(|(_, patterns)| patterns.iter().any(|re| re.is_match(&cleaned)))
        .map(|(shortcut, _)| shortcut.resolve(today))
}

pub fn shortcut_catalogue() -> Vec<ShortcutInfo> {
    SHORTCUTS
        .iter()
        .map(|s| ShortcutInfo {
            id: s.id,
            category: s.category,
            description: s.description,
            examples: s.examples,
        })
        .collect()
}

/// Up to five shortcuts relevant to the page the user is on.
pub fn suggest_for_page(current_page: &str) -> Vec<ShortcutInfo> {
    let by_category = |category: ShortcutCategory, limit: usize| {
        shortcut_catalogue()
            .into_iter()
            .filter(move |s| s.category == category)
            .take(limit)
    };

    let mut suggestions: Vec<ShortcutInfo> = Vec::new();
    if current_page.contains("/schedule") {
        suggestions.extend(by_category(ShortcutCategory::Schedule, 3));
    } else if current_page.contains("/staff") {
        suggestions.extend(by_category(ShortcutCategory::Staff, 3));
    } else if current_page.contains("/analytics") {
        suggestions.extend(by_category(ShortcutCategory::Analytics, 3));
    }
    suggestions.extend(by_category(ShortcutCategory::Status, 2));
    suggestions.truncate(5);
    suggestions
}
