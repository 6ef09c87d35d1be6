// ABOUTME: E2B provider talking to the control-plane REST API and the in-sandbox envd daemon
// ABOUTME: Creates and kills sandboxes, runs commands over Connect and uploads files

use super::envd::{self, StartRequest};
use super::{ExecResult, Provider, ProviderError, Result, SandboxInfo};
use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tplcheck_config::{constants, non_empty_var, var_or};
use tracing::{debug, info};

/// Upper bound for a single command, matching the platform SDK default
const COMMAND_TIMEOUT_SECS: u64 = 60;
const CONNECT_TIMEOUT_SECS: u64 = 10;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the E2B platform
#[derive(Debug, Clone)]
pub struct E2BConfig {
    pub api_key: String,
    pub domain: String,
    pub api_url: String,
    /// Fixed envd base URL instead of the per-sandbox host
    pub sandbox_url: Option<String>,
}

impl E2BConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        let domain = constants::DEFAULT_DOMAIN.to_string();
        Self {
            api_key: api_key.into(),
            api_url: format!("https://api.{}", domain),
            domain,
            sandbox_url: None,
        }
    }

    /// Load settings from `E2B_*` environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = non_empty_var(constants::E2B_API_KEY).ok_or_else(|| {
            ProviderError::Config(format!("{} is not set", constants::E2B_API_KEY))
        })?;
        let domain = var_or(constants::E2B_DOMAIN, constants::DEFAULT_DOMAIN);
        let api_url = non_empty_var(constants::E2B_API_URL)
            .unwrap_or_else(|| format!("https://api.{}", domain));

        Ok(Self {
            api_key,
            domain,
            api_url,
            sandbox_url: non_empty_var(constants::E2B_SANDBOX_URL),
        })
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_sandbox_url(mut self, sandbox_url: impl Into<String>) -> Self {
        self.sandbox_url = Some(sandbox_url.into());
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSandboxRequest<'a> {
    #[serde(rename = "templateID")]
    template_id: &'a str,
    timeout: u64,
    secure: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSandboxResponse {
    #[serde(rename = "sandboxID")]
    sandbox_id: String,
    #[serde(rename = "templateID")]
    template_id: String,
    #[serde(rename = "clientID")]
    client_id: Option<String>,
    envd_version: Option<String>,
    envd_access_token: Option<String>,
    domain: Option<String>,
}

#[derive(Debug, Serialize)]
struct AssignTagsRequest<'a> {
    target: &'a str,
    tags: &'a [String],
}

#[derive(Debug, Deserialize)]
struct AssignTagsResponse {
    #[serde(default)]
    tags: Vec<String>,
}

/// E2B provider for remote microVM sandboxes
pub struct E2BProvider {
    config: E2BConfig,
    http: Client,
}

impl E2BProvider {
    pub fn new(config: E2BConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(ProviderError::Config("E2B API key is required".to_string()));
        }

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;

        Ok(Self { config, http })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    fn envd_url(&self, sandbox: &SandboxInfo, path: &str) -> String {
        match &self.config.sandbox_url {
            Some(base) => format!("{}{}", base.trim_end_matches('/'), path),
            None => format!(
                "https://{}-{}.{}{}",
                envd::ENVD_PORT,
                sandbox.sandbox_id,
                sandbox.domain.as_deref().unwrap_or(&self.config.domain),
                path
            ),
        }
    }

    fn envd_request(&self, builder: RequestBuilder, sandbox: &SandboxInfo) -> RequestBuilder {
        let builder = builder
            .header("Authorization", envd::basic_auth(envd::DEFAULT_USER))
            .header("E2b-Sandbox-Id", &sandbox.sandbox_id)
            .header("E2b-Sandbox-Port", envd::ENVD_PORT.to_string());

        match &sandbox.envd_access_token {
            Some(token) => builder.header("X-Access-Token", token),
            None => builder,
        }
    }
}

fn send_error(err: reqwest::Error, timeout_secs: u64) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(timeout_secs)
    } else {
        ProviderError::Connection(err.to_string())
    }
}

async fn api_error(response: Response) -> ProviderError {
    let status = response.status();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| status.to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Authentication(message),
        _ => ProviderError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl Provider for E2BProvider {
    async fn create_sandbox(&self, template_ref: &str, timeout_secs: u64) -> Result<SandboxInfo> {
        debug!("Creating sandbox from template {}", template_ref);

        let response = self
            .http
            .post(self.api_url("/sandboxes"))
            .header("X-API-Key", &self.config.api_key)
            .timeout(Duration::from_secs(timeout_secs))
            .json(&CreateSandboxRequest {
                template_id: template_ref,
                timeout: timeout_secs,
                secure: true,
            })
            .send()
            .await
            .map_err(|e| send_error(e, timeout_secs))?;

        match response.status() {
            status if status.is_success() => {
                let created: CreateSandboxResponse = response
                    .json()
                    .await
                    .map_err(|e| ProviderError::Protocol(e.to_string()))?;
                info!(
                    "Created sandbox {} from template {}",
                    created.sandbox_id, template_ref
                );

                Ok(SandboxInfo {
                    sandbox_id: created.sandbox_id,
                    template_id: created.template_id,
                    client_id: created.client_id,
                    envd_version: created.envd_version,
                    envd_access_token: created.envd_access_token,
                    domain: created.domain,
                })
            }
            StatusCode::NOT_FOUND => Err(ProviderError::TemplateNotFound(template_ref.to_string())),
            _ => Err(api_error(response).await),
        }
    }

    async fn exec_command(&self, sandbox: &SandboxInfo, command: &str) -> Result<ExecResult> {
        debug!("Running `{}` in sandbox {}", command, sandbox.sandbox_id);

        let body = envd::encode_envelope(&StartRequest::shell(command))?;
        let request = self
            .http
            .post(self.envd_url(sandbox, envd::PROCESS_START_PATH))
            .header("Content-Type", envd::CONNECT_CONTENT_TYPE)
            .header("Connect-Protocol-Version", envd::CONNECT_PROTOCOL_VERSION)
            .timeout(Duration::from_secs(COMMAND_TIMEOUT_SECS))
            .body(body);

        let response = self
            .envd_request(request, sandbox)
            .send()
            .await
            .map_err(|e| send_error(e, COMMAND_TIMEOUT_SECS))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let stream = response
            .bytes()
            .await
            .map_err(|e| send_error(e, COMMAND_TIMEOUT_SECS))?;
        let result = envd::collect_exec_result(&stream)?;

        debug!(
            "`{}` exited with {} in sandbox {}",
            command, result.exit_code, sandbox.sandbox_id
        );
        Ok(result)
    }

    async fn write_file(&self, sandbox: &SandboxInfo, path: &str, contents: &[u8]) -> Result<()> {
        debug!(
            "Writing {} bytes to {} in sandbox {}",
            contents.len(),
            path,
            sandbox.sandbox_id
        );

        let file_name = path.rsplit('/').next().unwrap_or(path).to_string();
        let form = multipart::Form::new().part(
            "file",
            multipart::Part::bytes(contents.to_vec()).file_name(file_name),
        );

        let request = self
            .http
            .post(self.envd_url(sandbox, envd::FILES_PATH))
            .query(&[("path", path), ("username", envd::DEFAULT_USER)])
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .multipart(form);

        let response = self
            .envd_request(request, sandbox)
            .send()
            .await
            .map_err(|e| send_error(e, REQUEST_TIMEOUT_SECS))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }

    async fn kill_sandbox(&self, sandbox_id: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.api_url(&format!("/sandboxes/{}", sandbox_id)))
            .header("X-API-Key", &self.config.api_key)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| send_error(e, REQUEST_TIMEOUT_SECS))?;

        match response.status() {
            status if status.is_success() => {
                info!("Killed sandbox {}", sandbox_id);
                Ok(())
            }
            StatusCode::NOT_FOUND => {
                debug!("Sandbox {} was already gone", sandbox_id);
                Ok(())
            }
            _ => Err(api_error(response).await),
        }
    }

    async fn assign_tags(&self, target: &str, tags: &[String]) -> Result<Vec<String>> {
        let response = self
            .http
            .post(self.api_url("/templates/tags"))
            .header("X-API-Key", &self.config.api_key)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .json(&AssignTagsRequest { target, tags })
            .send()
            .await
            .map_err(|e| send_error(e, REQUEST_TIMEOUT_SECS))?;

        match response.status() {
            status if status.is_success() => {
                let assigned: AssignTagsResponse = response
                    .json()
                    .await
                    .map_err(|e| ProviderError::Protocol(e.to_string()))?;
                Ok(assigned.tags)
            }
            StatusCode::NOT_FOUND => Err(ProviderError::TemplateNotFound(target.to_string())),
            _ => Err(api_error(response).await),
        }
    }
}
