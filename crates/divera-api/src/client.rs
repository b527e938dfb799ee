// DIVERA v2 HTTP client
//
// Wraps `reqwest::Client` with access-key authentication, the
// `{ success, data, message }` envelope, and the status-code classification
// the rest of the workspace relies on. The access key travels as a query
// parameter, so URLs are never logged; only paths are.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{Envelope, PullAllData, SetStatusRequest, StatusRef};
use crate::transport::TransportConfig;
use crate::{PROBE_ALARM_PATH, PULL_ALL_PATH, SET_STATUS_PATH};

const ACCESS_KEY_PARAM: &str = "accesskey";
const UCR_PARAM: &str = "ucr";

/// Raw HTTP client for the DIVERA 24/7 v2 API.
///
/// One instance per access key. Every method takes the user-cluster
/// relation (`ucr`) explicitly, so a single client can serve several
/// subscriptions at once.
pub struct DiveraClient {
    http: reqwest::Client,
    base_url: Url,
    access_key: SecretString,
}

impl std::fmt::Debug for DiveraClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiveraClient")
            .field("base_url", &self.base_url.as_str())
            .field("access_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl DiveraClient {
    /// Create a client with its own `reqwest::Client` built from `transport`.
    pub fn new(
        base_url: Url,
        access_key: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, access_key))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    ///
    /// A base URL without a trailing `/` is treated as a directory, so
    /// `https://proxy.example/divera` keeps its `/divera` prefix.
    pub fn with_client(http: reqwest::Client, base_url: Url, access_key: SecretString) -> Self {
        Self {
            http,
            base_url: as_directory(base_url),
            access_key,
        }
    }

    /// The service base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The access key this client authenticates with.
    pub fn access_key(&self) -> &SecretString {
        &self.access_key
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Fetch the full pull-all document.
    ///
    /// `GET /api/v2/pull/all?accesskey=…[&ucr=…]`. Without `ucr` the service
    /// answers for the account's default relation.
    pub async fn pull_all(&self, ucr: Option<i64>) -> Result<PullAllData, Error> {
        let url = self.endpoint_url(PULL_ALL_PATH, ucr)?;
        debug!(path = PULL_ALL_PATH, ?ucr, "GET");

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        let envelope: Envelope<PullAllData> = self.parse_envelope(resp).await?;
        envelope.data.ok_or_else(|| Error::Deserialization {
            message: "pull-all response carried no data".into(),
            body: String::new(),
        })
    }

    /// Set the account owner's personnel status.
    ///
    /// `POST /api/v2/statusgeber/set-status` with `{"Status": {"id": N}}`.
    pub async fn set_status(&self, ucr: Option<i64>, status_id: i64) -> Result<(), Error> {
        let body = SetStatusRequest {
            status: StatusRef { id: status_id },
        };
        debug!(path = SET_STATUS_PATH, ?ucr, status_id, "POST");
        let _: Envelope<serde_json::Value> = self.post(SET_STATUS_PATH, ucr, &body).await?;
        Ok(())
    }

    /// Trigger a probe alarm for the relation's cluster.
    pub async fn trigger_probe_alarm(&self, ucr: Option<i64>) -> Result<(), Error> {
        debug!(path = PROBE_ALARM_PATH, ?ucr, "POST");
        let _: Envelope<serde_json::Value> = self
            .post(PROBE_ALARM_PATH, ucr, &serde_json::json!({}))
            .await?;
        Ok(())
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/{path}?accesskey=…[&ucr=…]`
    fn endpoint_url(&self, path: &str, ucr: Option<i64>) -> Result<Url, Error> {
        let mut url = self.base_url.join(path)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair(ACCESS_KEY_PARAM, self.access_key.expose_secret());
            if let Some(ucr) = ucr {
                query.append_pair(UCR_PARAM, &ucr.to_string());
            }
        }
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn post<B, T>(&self, path: &str, ucr: Option<i64>, body: &B) -> Result<Envelope<T>, Error>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint_url(path, ucr)?;
        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        self.parse_envelope(resp).await
    }

    /// Classify the HTTP status, then unwrap the `{ success, ... }` envelope.
    ///
    /// 401/403 → `Authentication`, 5xx → `Server`, other non-2xx → `Api`,
    /// unparseable body → `Deserialization`. A `success: false` envelope is
    /// `Authentication` when it rejects the access key, `Api` otherwise.
    async fn parse_envelope<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<Envelope<T>, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(status = status.as_u16(), len = body.len(), "response received");

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::Authentication {
                status: status.as_u16(),
                message: message_from_body(&body)
                    .unwrap_or_else(|| "access key rejected".into()),
            });
        }

        if status.is_server_error() {
            return Err(Error::Server {
                status: status.as_u16(),
                body,
            });
        }

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: message_from_body(&body)
                    .unwrap_or_else(|| format!("HTTP {status}: {}", preview(&body))),
                body,
            });
        }

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            Error::Deserialization {
                message: format!("{e} (body preview: {:?})", preview(&body)),
                body: body.clone(),
            }
        })?;

        if !envelope.success {
            if envelope.is_auth_failure() {
                return Err(Error::Authentication {
                    status: status.as_u16(),
                    message: envelope.failure_message(),
                });
            }
            return Err(Error::Api {
                status: status.as_u16(),
                message: envelope.failure_message(),
                body,
            });
        }

        Ok(envelope)
    }
}

fn as_directory(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Extract `message` from an error body if it is a JSON envelope.
fn message_from_body(body: &str) -> Option<String> {
    let envelope: Envelope<serde_json::Value> = serde_json::from_str(body).ok()?;
    Some(envelope.failure_message())
}

fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}
