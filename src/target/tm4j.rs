//! TM4J test cases as migration target.
//!
//! Uses the `/rest/atm/1.0` API. The attachment endpoint takes one file
//! per request and answers 201 on success.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::auth::auth_header;
use crate::config::TargetConfig;
use crate::error::{Error, Result};
use crate::http::{build_client, check_identity, error_body};
use crate::model::{RecordKind, StagedFile, TargetRecord};

use super::{TargetApi, upload_each};

/// Target instance reached through `/rest/atm/1.0`.
pub struct Tm4jTarget {
    client: reqwest::Client,
    base_url: String,
    auth: String,
    project_key: String,
}

impl Tm4jTarget {
    pub fn new(config: &TargetConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: config.base_url.clone(),
            auth: auth_header(&config.credentials),
            project_key: config.project_key.clone(),
        })
    }

    fn search_url(&self) -> String {
        format!("{}/rest/atm/1.0/testcase/search", self.base_url)
    }

    fn attachments_url(&self, key: &str) -> String {
        format!("{}/rest/atm/1.0/testcase/{key}/attachments", self.base_url)
    }

    fn search_query(&self, page: usize, page_size: usize) -> Vec<(&'static str, String)> {
        vec![
            ("query", format!("projectKey = \"{}\"", self.project_key)),
            ("fields", "key,customFields".to_string()),
            ("startAt", (page * page_size).to_string()),
            ("maxResults", page_size.to_string()),
        ]
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestCase {
    key: String,
    #[serde(default)]
    custom_fields: Option<Map<String, Value>>,
}

impl From<TestCase> for TargetRecord {
    fn from(test_case: TestCase) -> Self {
        Self {
            key: test_case.key,
            fields: test_case.custom_fields,
            kind: RecordKind::TestCase,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Tm4jAttachment {
    #[serde(alias = "name")]
    filename: String,
}

pub(crate) fn upload_accepted(status: StatusCode) -> bool {
    status == StatusCode::CREATED
}

fn parse_search_response(body: &str) -> Result<Vec<TargetRecord>> {
    // Every entry is kept, even without custom fields: dropping any would
    // shorten the page and end pagination early.
    let test_cases: Vec<TestCase> = serde_json::from_str(body)?;
    Ok(test_cases.into_iter().map(TargetRecord::from).collect())
}

fn parse_attachments_response(body: &str) -> Result<Vec<String>> {
    let attachments: Vec<Tm4jAttachment> = serde_json::from_str(body)?;
    Ok(attachments.into_iter().map(|a| a.filename).collect())
}

impl TargetApi for Tm4jTarget {
    fn name(&self) -> &'static str {
        "tm4j"
    }

    async fn validate(&self) -> Result<bool> {
        let url = format!(
            "{}?query=status%20%3D%20Deprecated&fields=id,key",
            self.search_url()
        );
        check_identity(&self.client, &url, &self.auth, "target").await
    }

    async fn search(&self, page: usize, page_size: usize) -> Result<Vec<TargetRecord>> {
        debug!(project = %self.project_key, page, "Searching target test cases");

        let response = self
            .client
            .get(self.search_url())
            .query(&self.search_query(page, page_size))
            .header(AUTHORIZATION, &self.auth)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(Error::remote_query(
                format!("search test cases (page {page})"),
                &self.project_key,
                status,
                body,
            ));
        }

        parse_search_response(&response.text().await?)
    }

    async fn list_existing_attachments(&self, record_key: &str) -> Result<Vec<String>> {
        let response = self
            .client
            .get(self.attachments_url(record_key))
            .header(AUTHORIZATION, &self.auth)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(Error::remote_query(
                "list test case attachments",
                record_key,
                status,
                body,
            ));
        }

        parse_attachments_response(&response.text().await?)
    }

    async fn upload(&self, record_key: &str, files: &[StagedFile]) -> Result<()> {
        let url = self.attachments_url(record_key);
        upload_each(record_key, files, upload_accepted, || {
            self.client.post(&url).header(AUTHORIZATION, &self.auth)
        })
        .await
    }
}
