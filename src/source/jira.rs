//! Jira REST v2 source client.

use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::auth::auth_header;
use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::http::{build_client, check_identity, error_body};
use crate::model::AttachmentDescriptor;

use super::SourceApi;

use std::time::Duration;

/// Source instance reached through `/rest/api/2`.
pub struct JiraSource {
    client: reqwest::Client,
    base_url: String,
    auth: String,
}

impl JiraSource {
    pub fn new(config: &SourceConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: config.base_url.clone(),
            auth: auth_header(&config.credentials),
        })
    }

    fn myself_url(&self) -> String {
        format!("{}/rest/api/2/myself", self.base_url)
    }

    fn issue_attachments_url(&self, key: &str) -> String {
        issue_attachments_url(&self.base_url, key)
    }
}

/// `GET` URL returning only the attachment field of an issue.
pub(crate) fn issue_attachments_url(base_url: &str, key: &str) -> String {
    format!("{base_url}/rest/api/2/issue/{key}?fields=attachment")
}

/// Issue body restricted to `fields=attachment`.
#[derive(Debug, Deserialize)]
pub(crate) struct IssueAttachments {
    #[serde(default)]
    fields: Option<AttachmentFields>,
}

#[derive(Debug, Deserialize)]
struct AttachmentFields {
    #[serde(default)]
    attachment: Option<Vec<AttachmentDescriptor>>,
}

impl IssueAttachments {
    pub(crate) fn into_attachments(self) -> Vec<AttachmentDescriptor> {
        self.fields
            .and_then(|f| f.attachment)
            .unwrap_or_default()
    }
}

impl SourceApi for JiraSource {
    async fn validate(&self) -> Result<bool> {
        check_identity(&self.client, &self.myself_url(), &self.auth, "source").await
    }

    async fn list_attachments(&self, key: &str) -> Result<Vec<AttachmentDescriptor>> {
        let response = self
            .client
            .get(self.issue_attachments_url(key))
            .header(AUTHORIZATION, &self.auth)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(Error::remote_query("list source attachments", key, status, body));
        }

        let issue: IssueAttachments = response.json().await?;
        let attachments = issue.into_attachments();
        debug!(key, count = attachments.len(), "Listed source attachments");
        Ok(attachments)
    }

    async fn download(
        &self,
        key: &str,
        attachment: &AttachmentDescriptor,
        dest: &mut File,
    ) -> Result<u64> {
        let mut response = self
            .client
            .get(&attachment.content)
            .header(AUTHORIZATION, &self.auth)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(Error::remote_query(
                format!("download attachment '{}'", attachment.filename),
                key,
                status,
                body,
            ));
        }

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            dest.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        Ok(written)
    }
}
