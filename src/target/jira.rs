//! Jira issues as migration target.
//!
//! Records are found with a JQL search. Each pending file goes up in its
//! own multipart request carrying the XSRF bypass header, and only 200
//! counts as accepted.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::auth::auth_header;
use crate::config::TargetConfig;
use crate::error::{Error, Result};
use crate::http::{ATLASSIAN_TOKEN_HEADER, build_client, check_identity, error_body};
use crate::model::{KeyRange, RecordKind, StagedFile, TargetRecord};
use crate::source::jira::{IssueAttachments, issue_attachments_url};

use super::{TargetApi, upload_each};

/// Target instance reached through `/rest/api/2`.
pub struct JiraTarget {
    client: reqwest::Client,
    base_url: String,
    auth: String,
    jql: String,
    key_field: Option<String>,
}

impl JiraTarget {
    pub fn new(config: &TargetConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: config.base_url.clone(),
            auth: auth_header(&config.credentials),
            jql: build_jql(
                &config.project_key,
                config.key_range,
                config.external_key_field.as_deref(),
            ),
            key_field: config.external_key_field.clone(),
        })
    }

    fn myself_url(&self) -> String {
        format!("{}/rest/api/2/myself", self.base_url)
    }

    fn search_url(&self) -> String {
        format!("{}/rest/api/2/search", self.base_url)
    }

    fn upload_url(&self, key: &str) -> String {
        format!("{}/rest/api/2/issue/{key}/attachments", self.base_url)
    }

    fn search_request(&self, page: usize, page_size: usize) -> SearchRequest<'_> {
        let mut fields = vec!["key"];
        if let Some(field) = self.key_field.as_deref() {
            fields.push(field);
        }
        SearchRequest {
            jql: &self.jql,
            start_at: page * page_size,
            max_results: page_size,
            fields,
        }
    }
}

/// JQL selecting the project's issues.
///
/// The range is pushed into the query only when the issue key itself is the
/// external key and both ends are known. With a key field configured the
/// range applies to the field value, which the engine filters on.
pub(crate) fn build_jql(
    project_key: &str,
    range: Option<KeyRange>,
    key_field: Option<&str>,
) -> String {
    let mut jql = format!("project = \"{project_key}\"");
    let server_side = range.filter(|r| key_field.is_none() && r.is_closed());
    if let Some(range) = server_side {
        jql.push_str(&format!(
            " AND (issuekey >= {project_key}-{} AND issuekey <= {project_key}-{})",
            range.start.max(1),
            range.end
        ));
    }
    jql.push_str(" ORDER BY key ASC");
    jql
}

/// What a search response status means for the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SearchStatus {
    Page,
    /// Jira answers 400 when the JQL matches nothing (e.g. unknown keys).
    NoMatches,
    Failed,
}

pub(crate) fn classify_search(status: StatusCode) -> SearchStatus {
    match status {
        StatusCode::OK => SearchStatus::Page,
        StatusCode::BAD_REQUEST => SearchStatus::NoMatches,
        _ => SearchStatus::Failed,
    }
}

pub(crate) fn upload_accepted(status: StatusCode) -> bool {
    status == StatusCode::OK
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    jql: &'a str,
    start_at: usize,
    max_results: usize,
    fields: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<JiraIssue>,
}

#[derive(Debug, Deserialize)]
struct JiraIssue {
    key: String,
    #[serde(default)]
    fields: Option<Map<String, Value>>,
}

impl From<JiraIssue> for TargetRecord {
    fn from(issue: JiraIssue) -> Self {
        Self {
            key: issue.key,
            fields: issue.fields,
            kind: RecordKind::Issue,
        }
    }
}

fn parse_search_response(body: &str) -> Result<Vec<TargetRecord>> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response.issues.into_iter().map(TargetRecord::from).collect())
}

impl TargetApi for JiraTarget {
    fn name(&self) -> &'static str {
        "jira"
    }

    async fn validate(&self) -> Result<bool> {
        check_identity(&self.client, &self.myself_url(), &self.auth, "target").await
    }

    async fn search(&self, page: usize, page_size: usize) -> Result<Vec<TargetRecord>> {
        let request = self.search_request(page, page_size);
        debug!(jql = %request.jql, start_at = request.start_at, "Searching target issues");

        let response = self
            .client
            .post(self.search_url())
            .header(AUTHORIZATION, &self.auth)
            .header(ACCEPT, "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        match classify_search(status) {
            SearchStatus::Page => parse_search_response(&response.text().await?),
            SearchStatus::NoMatches => {
                debug!(page, "Search returned no matching issues");
                Ok(Vec::new())
            }
            SearchStatus::Failed => {
                let body = error_body(response).await;
                Err(Error::remote_query(
                    format!("search issues (page {page})"),
                    &self.jql,
                    status,
                    body,
                ))
            }
        }
    }

    async fn list_existing_attachments(&self, record_key: &str) -> Result<Vec<String>> {
        let response = self
            .client
            .get(issue_attachments_url(&self.base_url, record_key))
            .header(AUTHORIZATION, &self.auth)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(Error::remote_query(
                "list target attachments",
                record_key,
                status,
                body,
            ));
        }

        let issue: IssueAttachments = response.json().await?;
        Ok(issue
            .into_attachments()
            .into_iter()
            .map(|a| a.filename)
            .collect())
    }

    async fn upload(&self, record_key: &str, files: &[StagedFile]) -> Result<()> {
        let url = self.upload_url(record_key);
        upload_each(record_key, files, upload_accepted, || {
            self.client
                .post(&url)
                .header(AUTHORIZATION, &self.auth)
                .header(ATLASSIAN_TOKEN_HEADER, "no-check")
        })
        .await
    }
}
