//! CSP/1 response assembly and rendering

use uuid::Uuid;

use engram_core::Relation;
use engram_search::ScoredResult;
use engram_store::Snapshot;

use crate::scope::scope_tags;

/// Most `mem:<uuid>` references per response.
const MAX_DATA_REFS: usize = 10;
/// Most relevance scores per response.
const MAX_SCORES: usize = 10;
/// Most snippet lines per response.
const MAX_SNIPPETS: usize = 3;
/// Scope tags are derived from this many top results.
const SCOPE_SOURCE_RESULTS: usize = 3;
/// Most link entries per response.
const MAX_LINKS: usize = 10;
/// Snippets carry at most this many characters of content.
const SNIPPET_CHARS: usize = 200;

/// Response status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Fail,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Fail => "FAIL",
        }
    }
}

/// An assembled CSP/1 response.
///
/// [`CspResponse::render`] emits fields in the grammar's fixed order, so
/// two responses built from identical inputs serialize identically.
#[derive(Debug, Clone)]
pub struct CspResponse {
    pub status: Status,
    pub scope: Vec<String>,
    pub data: String,
    pub relevance: Vec<f64>,
    pub rationale: Option<String>,
    /// `(uuid, escaped content)` pairs
    pub snippets: Vec<(Uuid, String)>,
    /// `(from, to, weight)` triples
    pub links: Vec<(String, String, f64)>,
}

impl CspResponse {
    fn new(status: Status) -> Self {
        Self {
            status,
            scope: Vec::new(),
            data: "none".to_string(),
            relevance: Vec::new(),
            rationale: None,
            snippets: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Serialize in the fixed field order:
    /// STATUS, SCOPE, DATA, RELEVANCE, RATIONALE, SNIPPET lines, LINKS.
    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(4 + self.snippets.len());
        lines.push(format!("STATUS {}", self.status.as_str()));
        lines.push(format!("SCOPE [{}]", self.scope.join(",")));
        lines.push(format!("DATA {}", self.data));

        if !self.relevance.is_empty() {
            let scores: Vec<String> =
                self.relevance.iter().map(|s| format!("{:.2}", s)).collect();
            lines.push(format!("RELEVANCE {}", scores.join(",")));
        }
        if let Some(rationale) = &self.rationale {
            lines.push(format!("RATIONALE {}", rationale));
        }
        for (uuid, snippet) in &self.snippets {
            lines.push(format!("SNIPPET {}:\"{}\"", uuid, snippet));
        }
        if !self.links.is_empty() {
            let entries: Vec<String> = self
                .links
                .iter()
                .map(|(from, to, weight)| format!("{}<->{}:{:.2}", from, to, weight))
                .collect();
            lines.push(format!("LINKS {}", entries.join(",")));
        }
        lines.join("\n")
    }
}

/// Acknowledge a stored episode.
pub fn format_episode_ack(uuid: Uuid) -> String {
    let mut response = CspResponse::new(Status::Ok);
    response.scope = vec!["memory".to_string(), "episode".to_string()];
    response.data = format!("episode:{}", uuid);
    response.rationale = Some("Episode stored in temporal knowledge graph".to_string());
    response.render()
}

/// Render ranked search results; an empty set is a FAIL with rationale,
/// never a bare OK.
pub fn format_search_response(results: &[ScoredResult]) -> String {
    if results.is_empty() {
        let mut response = CspResponse::new(Status::Fail);
        response.rationale = Some("No results found".to_string());
        return response.render();
    }

    let mut response = CspResponse::new(Status::Ok);
    response.scope = scope_tags(
        results
            .iter()
            .take(SCOPE_SOURCE_RESULTS)
            .map(|r| r.content.as_str()),
    );
    response.data = results
        .iter()
        .take(MAX_DATA_REFS)
        .map(|r| format!("mem:{}", r.uuid))
        .collect::<Vec<_>>()
        .join(",");
    response.relevance = results.iter().take(MAX_SCORES).map(|r| r.score).collect();
    response.snippets = results
        .iter()
        .take(MAX_SNIPPETS)
        .map(|r| (r.uuid, escape_snippet(&r.content)))
        .collect();
    response.render()
}

/// Render an entity's relations; no relations is still OK, since absence
/// of relations is not a failure.
pub fn format_relations_response(entity: &str, relations: &[Relation]) -> String {
    let mut response = CspResponse::new(Status::Ok);
    response.scope = vec![entity.to_string()];

    if relations.is_empty() {
        response.rationale = Some("No relations found".to_string());
        return response.render();
    }

    response.data = entity.to_string();
    response.links = relations
        .iter()
        .take(MAX_LINKS)
        .map(|r| (r.from_entity.clone(), r.to_entity.clone(), r.weight))
        .collect();
    response.render()
}

/// Render a point-in-time snapshot as links, or a "no known state" answer
/// when nothing was valid at the asked instant.
pub fn format_snapshot_response(snapshot: &Snapshot) -> String {
    let mut response = CspResponse::new(Status::Ok);
    response.scope = vec![snapshot.entity_name.clone()];

    if snapshot.is_empty() {
        response.rationale = Some(format!(
            "No known state at {}",
            snapshot.at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        ));
        return response.render();
    }

    response.data = snapshot.entity_name.clone();
    response.links = snapshot
        .relations
        .iter()
        .take(MAX_LINKS)
        .map(|r| (r.from_entity.clone(), r.to_entity.clone(), r.weight))
        .collect();
    response.render()
}

/// Render an operation failure. The FAIL line is the protocol's only
/// user-visible failure shape; faults never reach the caller's transport
/// unformatted.
pub fn format_error_response(rationale: &str) -> String {
    let mut response = CspResponse::new(Status::Fail);
    response.rationale = Some(rationale.to_string());
    response.render()
}

/// First 200 characters of content (on char boundaries), with backslashes,
/// double quotes, and line breaks escaped so a snippet stays one line.
fn escape_snippet(content: &str) -> String {
    let mut out = String::with_capacity(content.len().min(SNIPPET_CHARS) + 8);
    for c in content.chars().take(SNIPPET_CHARS) {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}
