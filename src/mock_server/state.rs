//! Mock server state management.
//!
//! Provides the in-memory data store for the mock BigGo PMS server. Records
//! are stored in their wire shape so handlers can serve them verbatim.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

/// Content served by `GET /export/{id}` for one report.
#[derive(Debug, Clone)]
pub struct ReportFile {
    /// File name suggested in `content-disposition`, without extension.
    pub file_stem: String,
    pub csv: String,
    pub json: Value,
    pub excel: Vec<u8>,
}

/// Shared state for the mock server.
///
/// This struct holds all the mock data that the server will serve.
/// It's wrapped in `Arc<RwLock<_>>` for concurrent access.
#[derive(Debug)]
pub struct MockState {
    /// Accepted client credentials: client ID to secret.
    pub clients: HashMap<String, String>,

    /// Lifetime reported for issued tokens, in seconds.
    pub token_lifetime_secs: i64,

    /// Tokens handed out so far.
    pub issued_tokens: HashSet<String>,

    /// Number of token requests received, successful or not.
    pub token_requests: usize,

    /// Platform records.
    pub platforms: Vec<Value>,

    /// Group records indexed by platform ID.
    pub groups: HashMap<String, Vec<Value>>,

    /// Report records indexed by platform ID.
    pub reports: HashMap<String, Vec<Value>>,

    /// Downloadable content indexed by report ID.
    pub report_files: HashMap<String, ReportFile>,

    /// Query parameters of the most recent report list request.
    pub last_report_query: Option<HashMap<String, String>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            clients: HashMap::new(),
            token_lifetime_secs: 3600,
            issued_tokens: HashSet::new(),
            token_requests: 0,
            platforms: Vec::new(),
            groups: HashMap::new(),
            reports: HashMap::new(),
            report_files: HashMap::new(),
            last_report_query: None,
        }
    }
}

impl MockState {
    /// Create a new empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create state wrapped in Arc<RwLock> for sharing.
    pub fn shared(self) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(self))
    }

    /// Accept a client ID/secret pair at the token endpoint.
    pub fn with_client(mut self, client_id: &str, client_secret: &str) -> Self {
        self.clients
            .insert(client_id.to_string(), client_secret.to_string());
        self
    }

    /// Set the lifetime reported for issued tokens.
    pub fn with_token_lifetime(mut self, secs: i64) -> Self {
        self.token_lifetime_secs = secs;
        self
    }

    /// Add a platform record.
    pub fn with_platform(mut self, platform: Value) -> Self {
        self.platforms.push(platform);
        self
    }

    /// Add a group record to a platform.
    pub fn with_group(mut self, platform_id: &str, group: Value) -> Self {
        self.groups
            .entry(platform_id.to_string())
            .or_default()
            .push(group);
        self
    }

    /// Add a report record to a platform, with its downloadable content.
    pub fn with_report(mut self, platform_id: &str, report: Value, file: ReportFile) -> Self {
        if let Some(id) = report.get("_id").and_then(Value::as_str) {
            self.report_files.insert(id.to_string(), file);
        }
        self.reports
            .entry(platform_id.to_string())
            .or_default()
            .push(report);
        self
    }

    pub fn has_platform(&self, platform_id: &str) -> bool {
        self.platforms
            .iter()
            .any(|p| p.get("_id").and_then(Value::as_str) == Some(platform_id))
    }

    /// Check a client ID/secret pair.
    pub fn accepts(&self, client_id: &str, client_secret: &str) -> bool {
        self.clients.get(client_id).map(String::as_str) == Some(client_secret)
    }

    /// Issue a new token and remember it.
    pub fn issue_token(&mut self) -> String {
        let token = format!("mock-token-{}", self.issued_tokens.len() + 1);
        self.issued_tokens.insert(token.clone());
        token
    }

    /// Forget every issued token, as if they all expired server-side.
    pub fn revoke_tokens(&mut self) {
        self.issued_tokens.clear();
    }

    /// List a platform's reports, applying group filter, sort, and paging.
    pub fn list_reports(
        &self,
        platform_id: &str,
        group_ids: Option<&str>,
        ascending: bool,
        start: usize,
        size: usize,
    ) -> Vec<Value> {
        let wanted: Option<Vec<&str>> = group_ids.map(|ids| ids.split(',').collect());

        let mut reports: Vec<&Value> = self
            .reports
            .get(platform_id)
            .map(|r| r.iter().collect())
            .unwrap_or_default();

        if let Some(wanted) = &wanted {
            reports.retain(|r| {
                r.get("pms_groupid")
                    .and_then(Value::as_str)
                    .is_some_and(|g| wanted.contains(&g))
            });
        }

        reports.sort_by_key(|r| {
            r.get("createtime")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        });
        if !ascending {
            reports.reverse();
        }

        reports.into_iter().skip(start).take(size).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(id: &str, group: &str, created: &str) -> Value {
        json!({ "_id": id, "pms_groupid": group, "createtime": created })
    }

    fn file() -> ReportFile {
        ReportFile {
            file_stem: "r".to_string(),
            csv: String::new(),
            json: Value::Null,
            excel: Vec::new(),
        }
    }

    #[test]
    fn test_state_accepts_registered_client_only() {
        let state = MockState::new().with_client("id", "secret");

        assert!(state.accepts("id", "secret"));
        assert!(!state.accepts("id", "wrong"));
        assert!(!state.accepts("other", "secret"));
    }

    #[test]
    fn test_state_issue_and_revoke_tokens() {
        let mut state = MockState::new();
        let first = state.issue_token();
        let second = state.issue_token();

        assert_ne!(first, second);
        assert!(state.issued_tokens.contains(&first));

        state.revoke_tokens();
        assert!(state.issued_tokens.is_empty());
    }

    #[test]
    fn test_state_list_reports_sorts_filters_and_pages() {
        let state = MockState::new()
            .with_report("p", report("r1", "g1", "2023-01-01"), file())
            .with_report("p", report("r2", "g2", "2023-02-01"), file())
            .with_report("p", report("r3", "g1", "2023-03-01"), file());

        let newest_first = state.list_reports("p", None, false, 0, 10);
        assert_eq!(newest_first[0]["_id"], "r3");
        assert_eq!(newest_first.len(), 3);

        let oldest_first = state.list_reports("p", None, true, 1, 1);
        assert_eq!(oldest_first.len(), 1);
        assert_eq!(oldest_first[0]["_id"], "r2");

        let only_g1 = state.list_reports("p", Some("g1"), true, 0, 10);
        assert_eq!(only_g1.len(), 2);

        assert!(state.list_reports("missing", None, true, 0, 10).is_empty());
        assert!(state.report_files.contains_key("r2"));
    }
}
