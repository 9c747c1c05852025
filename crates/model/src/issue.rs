use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Issue lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Open,
    InProgress,
    Blocked,
    Closed,
}

impl Status {
    /// Wire name as it appears in reports and the metrics cache.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Open => "open",
            Status::InProgress => "in_progress",
            Status::Blocked => "blocked",
            Status::Closed => "closed",
        }
    }

    /// Closed issues stop counting as active blockers.
    pub fn is_active(self) -> bool {
        !matches!(self, Status::Closed)
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Open
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Feature,
    Bug,
    Task,
    Epic,
    Question,
    Docs,
}

impl Default for IssueKind {
    fn default() -> Self {
        IssueKind::Task
    }
}

/// Dependency relation kind. Only `Blocks` contributes edges to the
/// analytic graph; the rest are carried through as opaque relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DepKind {
    Blocks,
    Related,
    ParentChild,
    DiscoveredFrom,
}

impl DepKind {
    pub fn is_blocking(self) -> bool {
        matches!(self, DepKind::Blocks)
    }
}

/// A typed edge declared by an issue: `issue_id` depends on
/// `depends_on_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(default)]
    pub issue_id: String,
    pub depends_on_id: String,
    #[serde(rename = "type")]
    pub kind: DepKind,
}

impl Dependency {
    pub fn blocks(issue_id: &str, depends_on_id: &str) -> Self {
        Self {
            issue_id: issue_id.to_string(),
            depends_on_id: depends_on_id.to_string(),
            kind: DepKind::Blocks,
        }
    }
}

/// A single issue as delivered by the snapshot producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance_criteria: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Status,
    /// 0 is most urgent, 4 least. Values outside 0..=4 are preserved
    /// but normalise to a neutral score.
    #[serde(default)]
    pub priority: i64,
    #[serde(default, rename = "issue_type")]
    pub kind: IssueKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
}

impl Issue {
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            design: None,
            acceptance_criteria: None,
            notes: None,
            status: Status::Open,
            priority: 2,
            kind: IssueKind::Task,
            created_at: None,
            updated_at: None,
            closed_at: None,
            labels: Vec::new(),
            assignee: None,
            dependencies: Vec::new(),
        }
    }

    /// IDs this issue declares a `blocks` dependency on.
    pub fn blocking_dependencies(&self) -> impl Iterator<Item = &str> {
        self.dependencies
            .iter()
            .filter(|d| d.kind.is_blocking())
            .map(|d| d.depends_on_id.as_str())
    }

    /// Concatenated searchable text: title plus the free-text fields
    /// and labels. Used for lexical scoring and embedding sync.
    pub fn search_document(&self) -> String {
        let mut doc = String::with_capacity(self.title.len() + 64);
        doc.push_str(&self.title);
        for field in [
            self.description.as_deref(),
            self.design.as_deref(),
            self.acceptance_criteria.as_deref(),
            self.notes.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            doc.push('\n');
            doc.push_str(field);
        }
        for label in &self.labels {
            doc.push('\n');
            doc.push_str(label);
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocking_dependencies_filter_informational_kinds() {
        let mut issue = Issue::new("B", "Beta");
        issue.dependencies = vec![
            Dependency::blocks("B", "A"),
            Dependency {
                issue_id: "B".to_string(),
                depends_on_id: "C".to_string(),
                kind: DepKind::Related,
            },
        ];

        let blocking: Vec<&str> = issue.blocking_dependencies().collect();
        assert_eq!(blocking, vec!["A"]);
    }

    #[test]
    fn search_document_includes_labels_and_text_fields() {
        let mut issue = Issue::new("A", "Fix benchmarks");
        issue.description = Some("Rendering performance".to_string());
        issue.labels = vec!["perf".to_string()];

        let doc = issue.search_document();
        assert!(doc.contains("Fix benchmarks"));
        assert!(doc.contains("Rendering performance"));
        assert!(doc.contains("perf"));
    }

    #[test]
    fn status_wire_names_round_trip() {
        for status in [
            Status::Open,
            Status::InProgress,
            Status::Blocked,
            Status::Closed,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }
}
