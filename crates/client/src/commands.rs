//! Session command client
//!
//! Talks to the session's request/response API after handoff. Each command
//! kind is its own single-flight domain: a call made while another call of
//! the same kind is outstanding is rejected with `CommandStatus::Busy`.
//! Model and agent changes update the local selection before the request
//! resolves and are not rolled back if it fails.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use orca_protocol::{ConfigUpdate, PromptRequest, ServerInfo};
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use crate::endpoint::session_api_url;
use crate::error::CommandError;

const ERROR_BODY_PREVIEW_CHARS: usize = 240;

/// Outcome of a command that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// Request issued and acknowledged
    Sent,
    /// Another call of the same kind is in flight
    Busy,
    /// Precondition not met (empty prompt, unknown model or agent)
    Invalid,
}

/// Releases a single-flight flag when dropped, whatever way the call ends.
struct FlightGuard<'a>(&'a AtomicBool);

impl<'a> FlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SessionClient {
    http: Client,
    session: Arc<ServerInfo>,
    prompt_url: Url,
    config_url: Url,
    current_model: ArcSwap<String>,
    current_agent: ArcSwap<String>,
    prompt_in_flight: AtomicBool,
    model_in_flight: AtomicBool,
    agent_in_flight: AtomicBool,
}

impl SessionClient {
    /// Client for `session`, addressed through the server at `origin`.
    pub fn new(
        origin: &Url,
        session: Arc<ServerInfo>,
        request_timeout: Duration,
    ) -> Result<Self, CommandError> {
        let http = Client::builder().timeout(request_timeout).build()?;
        Self::with_http(http, origin, session)
    }

    pub fn with_http(
        http: Client,
        origin: &Url,
        session: Arc<ServerInfo>,
    ) -> Result<Self, CommandError> {
        let id = session.session_id.as_str();
        let prompt_url = session_api_url(origin, id, &["session", id, "message"])?;
        let config_url = session_api_url(origin, id, &["config"])?;

        Ok(Self {
            http,
            prompt_url,
            config_url,
            current_model: ArcSwap::from_pointee(session.current_model.clone()),
            current_agent: ArcSwap::from_pointee(session.current_agent.clone()),
            prompt_in_flight: AtomicBool::new(false),
            model_in_flight: AtomicBool::new(false),
            agent_in_flight: AtomicBool::new(false),
            session,
        })
    }

    pub fn session(&self) -> &ServerInfo {
        &self.session
    }

    /// Locally selected model (optimistic).
    pub fn current_model(&self) -> Arc<String> {
        self.current_model.load_full()
    }

    /// Locally selected agent (optimistic).
    pub fn current_agent(&self) -> Arc<String> {
        self.current_agent.load_full()
    }

    pub fn is_sending(&self) -> bool {
        self.prompt_in_flight.load(Ordering::Acquire)
    }

    /// Submit the text in `input` as a prompt.
    ///
    /// On acceptance `input` is emptied before the request goes out and is
    /// not restored if the request fails. Rejected calls leave it untouched.
    pub async fn submit_prompt(&self, input: &mut String) -> Result<CommandStatus, CommandError> {
        if input.trim().is_empty() {
            return Ok(CommandStatus::Invalid);
        }
        let Some(_guard) = FlightGuard::acquire(&self.prompt_in_flight) else {
            debug!(
                component = "session_commands",
                event = "session.prompt.busy",
                session_id = %self.session.session_id,
                "Prompt already in flight, ignoring"
            );
            return Ok(CommandStatus::Busy);
        };

        let text = std::mem::take(input);
        let request = self
            .http
            .post(self.prompt_url.clone())
            .json(&PromptRequest::text(text));
        let result = check(request.send().await).await;

        match &result {
            Ok(()) => info!(
                component = "session_commands",
                event = "session.prompt.sent",
                session_id = %self.session.session_id,
                "Prompt submitted"
            ),
            Err(e) => warn!(
                component = "session_commands",
                event = "session.prompt.failed",
                session_id = %self.session.session_id,
                error = %e,
                "Error sending prompt"
            ),
        }
        result.map(|()| CommandStatus::Sent)
    }

    /// Switch the session model. The local selection changes immediately.
    pub async fn set_model(&self, model: &str) -> Result<CommandStatus, CommandError> {
        if !self.session.has_model(model) {
            return Ok(CommandStatus::Invalid);
        }
        let Some(_guard) = FlightGuard::acquire(&self.model_in_flight) else {
            return Ok(CommandStatus::Busy);
        };

        self.current_model.store(Arc::new(model.to_string()));
        self.update_config("model", &ConfigUpdate::model(model))
            .await
            .map(|()| CommandStatus::Sent)
    }

    /// Make `name` the only enabled agent. The local selection changes
    /// immediately; the request carries every advertised agent.
    pub async fn set_agent(&self, name: &str) -> Result<CommandStatus, CommandError> {
        if self.session.agent(name).is_none() {
            return Ok(CommandStatus::Invalid);
        }
        let Some(_guard) = FlightGuard::acquire(&self.agent_in_flight) else {
            return Ok(CommandStatus::Busy);
        };

        self.current_agent.store(Arc::new(name.to_string()));
        let update = ConfigUpdate::exclusive_agent(&self.session.agents, name);
        self.update_config("agent", &update)
            .await
            .map(|()| CommandStatus::Sent)
    }

    async fn update_config(
        &self,
        field: &'static str,
        update: &ConfigUpdate,
    ) -> Result<(), CommandError> {
        let request = self.http.patch(self.config_url.clone()).json(update);
        let result = check(request.send().await).await;

        match &result {
            Ok(()) => info!(
                component = "session_commands",
                event = "session.config.updated",
                session_id = %self.session.session_id,
                field,
                "Session config updated"
            ),
            // Local selection stays as chosen.
            Err(e) => warn!(
                component = "session_commands",
                event = "session.config.failed",
                session_id = %self.session.session_id,
                field,
                error = %e,
                "Error updating session config"
            ),
        }
        result
    }
}

async fn check(response: reqwest::Result<reqwest::Response>) -> Result<(), CommandError> {
    let response = response?;
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(CommandError::Status {
        status: status.as_u16(),
        body: body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use orca_protocol::Agent;

    fn session() -> Arc<ServerInfo> {
        Arc::new(ServerInfo {
            url: "http://127.0.0.1:4096".to_string(),
            directory: "/src/app".to_string(),
            share_url: "https://share.example/s/1".to_string(),
            session_id: "ses_1".to_string(),
            current_model: "openai/gpt-5".to_string(),
            current_agent: "build".to_string(),
            models: vec!["openai/gpt-5".to_string()],
            agents: vec![Agent {
                name: "build".to_string(),
                description: None,
                mode: "primary".to_string(),
                built_in: true,
            }],
        })
    }

    // A loopback port with nothing listening: requests that go out are refused.
    fn refused_origin() -> Url {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);
        Url::parse(&format!("http://127.0.0.1:{port}")).unwrap()
    }

    fn client() -> SessionClient {
        SessionClient::new(&refused_origin(), session(), Duration::from_secs(2)).expect("client")
    }

    #[test]
    fn addresses_are_session_scoped() {
        let origin = Url::parse("http://127.0.0.1:8080").unwrap();
        let client =
            SessionClient::new(&origin, session(), Duration::from_secs(2)).expect("client");
        assert_eq!(
            client.prompt_url.as_str(),
            "http://127.0.0.1:8080/api/ses_1/session/ses_1/message"
        );
        assert_eq!(
            client.config_url.as_str(),
            "http://127.0.0.1:8080/api/ses_1/config"
        );
    }

    #[test]
    fn flight_guard_is_exclusive_and_released_on_drop() {
        let flag = AtomicBool::new(false);
        let guard = FlightGuard::acquire(&flag).expect("first acquire");
        assert!(FlightGuard::acquire(&flag).is_none());
        drop(guard);
        assert!(FlightGuard::acquire(&flag).is_some());
    }

    #[tokio::test]
    async fn blank_prompt_is_a_no_op() {
        let client = client();
        let mut input = "   \n\t".to_string();

        let status = client.submit_prompt(&mut input).await.expect("no request made");
        assert_eq!(status, CommandStatus::Invalid);
        assert_eq!(input, "   \n\t");
        assert!(!client.is_sending());
    }

    #[tokio::test]
    async fn unknown_model_and_agent_are_rejected_locally() {
        let client = client();

        assert_eq!(
            client.set_model("nobody/none").await.unwrap(),
            CommandStatus::Invalid
        );
        assert_eq!(client.set_agent("plan").await.unwrap(), CommandStatus::Invalid);
        assert_eq!(client.current_model().as_str(), "openai/gpt-5");
        assert_eq!(client.current_agent().as_str(), "build");
    }

    #[tokio::test]
    async fn failed_prompt_clears_input_and_flag() {
        let client = client();
        let mut input = "hello".to_string();

        assert!(client.submit_prompt(&mut input).await.is_err());
        assert!(input.is_empty());
        assert!(!client.is_sending());
    }

    #[tokio::test]
    async fn failed_model_change_keeps_local_selection() {
        let mut info = (*session()).clone();
        info.models.push("anthropic/claude-sonnet".to_string());
        let client = SessionClient::new(&refused_origin(), Arc::new(info), Duration::from_secs(2))
            .expect("client");

        assert!(client.set_model("anthropic/claude-sonnet").await.is_err());
        assert_eq!(client.current_model().as_str(), "anthropic/claude-sonnet");
    }
}
