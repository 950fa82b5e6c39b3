// src/report/publish.rs

//! Upload of the JUnit report to a ReportPortal instance.
//!
//! Three requests, each of which can fail independently:
//! 1. `POST /api/v1/{project}/launch/import` (multipart) creates a launch
//!    and answers with a message containing its UUID.
//! 2. `GET /api/v1/{project}/launch/uuid/{uuid}` resolves the numeric id.
//! 3. `PUT /api/v1/{project}/launch/{id}/update` attaches version, build
//!    and CI link attributes.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};

static LAUNCH_UUID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"id = (\S+)").expect("static regex is valid"));

static MAJOR_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(\d+)").expect("static regex is valid"));

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{step} returned status {status}: {body}")]
    Status {
        step: &'static str,
        status: u16,
        body: String,
    },

    #[error("malformed response from {step}: {detail}")]
    Malformed { step: &'static str, detail: String },
}

/// Connection settings; all three must be non-empty for publishing to happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPortalConfig {
    pub base_url: String,
    pub project: String,
    pub api_token: String,
}

impl ReportPortalConfig {
    /// `None` unless every part is present and non-empty.
    pub fn from_parts(
        base_url: Option<&str>,
        project: Option<&str>,
        api_token: Option<&str>,
    ) -> Option<Self> {
        fn non_empty(s: Option<&str>) -> Option<&str> {
            s.map(str::trim).filter(|s| !s.is_empty())
        }

        Some(Self {
            base_url: non_empty(base_url)?.trim_end_matches('/').to_string(),
            project: non_empty(project)?.to_string(),
            api_token: non_empty(api_token)?.to_string(),
        })
    }
}

/// Launch metadata derived from the artifact version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchAttributes {
    /// `2.13.1.0` for `2.13.1.0-b112`.
    pub version: String,
    /// `112` for `2.13.1.0-b112`; empty when there is no build suffix.
    pub build: String,
    /// `2.13`.
    pub major_version: String,
}

impl LaunchAttributes {
    pub fn from_version(version: &str) -> Self {
        let (full, build) = match version.split_once("-b") {
            Some((full, build)) => (full, build),
            None => (version, ""),
        };
        let major_version = MAJOR_VERSION
            .captures(version)
            .map(|c| format!("{}.{}", &c[1], &c[2]))
            .unwrap_or_else(|| full.to_string());

        Self {
            version: full.to_string(),
            build: build.to_string(),
            major_version,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImportResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
struct LaunchResponse {
    id: i64,
}

#[derive(Debug, Clone)]
pub struct ReportPortalClient {
    http: Client,
    config: ReportPortalConfig,
}

impl ReportPortalClient {
    pub fn new(config: ReportPortalConfig) -> Result<Self, PublishError> {
        let http = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ReportPortalConfig {
        &self.config
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/api/v1/{}/{}",
            self.config.base_url, self.config.project, path
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("accept", "*/*")
            .header("Authorization", format!("bearer {}", self.config.api_token))
    }

    /// Run all three steps and return the numeric launch id.
    pub async fn publish(
        &self,
        report_name: &str,
        xml: &str,
        version: &str,
        ci_url: &str,
    ) -> Result<i64, PublishError> {
        let attributes = LaunchAttributes::from_version(version);

        let launch_uuid = self.import_launch(report_name, xml, &attributes).await?;
        info!(%launch_uuid, "successfully posted launch");

        let launch_id = self.resolve_launch_id(&launch_uuid).await?;
        info!(launch_id, "successfully found launch id");

        self.update_attributes(launch_id, &attributes, ci_url).await?;
        info!(launch_id, "successfully updated launch attributes");

        Ok(launch_id)
    }

    async fn import_launch(
        &self,
        report_name: &str,
        xml: &str,
        attributes: &LaunchAttributes,
    ) -> Result<String, PublishError> {
        const STEP: &str = "launch import";

        let file = Part::text(xml.to_string())
            .file_name(format!("{}-{}", attributes.major_version, report_name))
            .mime_str("text/xml")?;
        let form = Form::new().part("file", file).text("type", "text/xml");

        let response = self
            .authorized(self.http.post(self.api_url("launch/import")))
            .multipart(form)
            .send()
            .await?;
        let body: ImportResponse = expect_ok(STEP, response).await?.json().await?;

        LAUNCH_UUID
            .captures(&body.message)
            .map(|c| c[1].to_string())
            .ok_or_else(|| PublishError::Malformed {
                step: STEP,
                detail: format!("no launch id in message '{}'", body.message),
            })
    }

    async fn resolve_launch_id(&self, launch_uuid: &str) -> Result<i64, PublishError> {
        const STEP: &str = "launch lookup";

        let response = self
            .authorized(
                self.http
                    .get(self.api_url(&format!("launch/uuid/{launch_uuid}"))),
            )
            .send()
            .await?;
        let body: LaunchResponse = expect_ok(STEP, response).await?.json().await?;
        Ok(body.id)
    }

    async fn update_attributes(
        &self,
        launch_id: i64,
        attributes: &LaunchAttributes,
        ci_url: &str,
    ) -> Result<(), PublishError> {
        const STEP: &str = "launch update";

        let payload = json!({
            "attributes": [
                {"key": "version", "value": attributes.version},
                {"key": "build", "value": attributes.build},
                {"key": "jenkins", "value": ci_url},
            ]
        });

        let response = self
            .authorized(
                self.http
                    .put(self.api_url(&format!("launch/{launch_id}/update"))),
            )
            .json(&payload)
            .send()
            .await?;
        expect_ok(STEP, response).await?;
        Ok(())
    }
}

async fn expect_ok(step: &'static str, response: Response) -> Result<Response, PublishError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    error!(step, status = status.as_u16(), %body, "ReportPortal request failed");
    Err(PublishError::Status {
        step,
        status: status.as_u16(),
        body,
    })
}
