//! Home Graph `requestSync` notifier.
//!
//! Tells the smart-home agent of a user that its device graph changed. Without
//! an API key nothing is sent.

use http::StatusCode;
use log::{debug, info};
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://homegraph.googleapis.com";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("sync request failed: {0}")]
    Transport(String),
    #[error("sync request for {agent_user_id} rejected: {status} {reason}")]
    Http {
        agent_user_id: String,
        status: u16,
        reason: String,
    },
    #[error("cannot encode sync request: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Skipped,
    Sent { status: u16, reason: String },
}

/// Something that can ask for a resync of one agent user.
pub trait Notifier {
    fn notify(&self, agent_user_id: &str) -> Result<NotifyOutcome, NotifyError>;
}

#[derive(Serialize)]
struct RequestSync<'a> {
    agent_user_id: &'a str,
}

pub struct SyncNotifier {
    agent: ureq::Agent,
    base_url: String,
    api_key: Option<String>,
}

impl SyncNotifier {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        let config = ureq::Agent::config_builder().http_status_as_error(false).build();
        SyncNotifier {
            agent: ureq::Agent::new_with_config(config),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

fn reason(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or("").to_string()
}

impl Notifier for SyncNotifier {
    fn notify(&self, agent_user_id: &str) -> Result<NotifyOutcome, NotifyError> {
        let Some(key) = &self.api_key else {
            debug!("no API key, sync for {agent_user_id} skipped");
            return Ok(NotifyOutcome::Skipped);
        };

        let body = serde_json::to_vec(&RequestSync { agent_user_id })?;
        let mut resp = self
            .agent
            .post(&format!("{}/v1/devices:requestSync", self.base_url))
            .query("key", key)
            .content_type("application/json")
            .send(&body[..])
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.body_mut().read_to_string().unwrap_or_default();
            debug!("requestSync {status}: {text}");
            return Err(NotifyError::Http {
                agent_user_id: agent_user_id.to_string(),
                status: status.as_u16(),
                reason: reason(status),
            });
        }
        info!("requestSync for {agent_user_id}: {status}");
        Ok(NotifyOutcome::Sent {
            status: status.as_u16(),
            reason: reason(status),
        })
    }
}
