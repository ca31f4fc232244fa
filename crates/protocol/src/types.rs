//! Core types shared across the protocol

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// A working directory the backend offers for a session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirectoryInfo {
    /// Display name, relative to the backend's search root
    pub name: String,
    /// Absolute path; the identity of the directory
    pub path: String,
}

/// Payload of `directoryList`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectoryList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub directories: Vec<DirectoryInfo>,
}

/// Payload of `selectDirectory`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectDirectory {
    pub path: String,
}

/// An agent profile advertised by the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub name: String,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub built_in: bool,
}

/// Session descriptor sent with `serverReady`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub url: String,
    pub directory: String,
    pub share_url: String,
    pub session_id: String,
    #[serde(default)]
    pub current_model: String,
    #[serde(default)]
    pub current_agent: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub models: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub agents: Vec<Agent>,
}

impl ServerInfo {
    pub fn has_model(&self, model: &str) -> bool {
        self.models.iter().any(|m| m == model)
    }

    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.name == name)
    }
}

// ---------------------------------------------------------------------------
// Session command bodies
// ---------------------------------------------------------------------------

/// One part of a prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromptPart {
    Text { text: String },
}

/// Body of the submit-prompt request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest {
    pub parts: Vec<PromptPart>,
}

impl PromptRequest {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![PromptPart::Text { text: text.into() }],
        }
    }
}

/// Enable/disable switch for one agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentToggle {
    pub disable: bool,
}

/// Partial session config sent with the update-config request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<BTreeMap<String, AgentToggle>>,
}

impl ConfigUpdate {
    pub fn model(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            agent: None,
        }
    }

    /// Enable `selected` and disable every other agent in `agents`.
    ///
    /// The remote config has no "leave unchanged" for agents, so the map
    /// always covers the full advertised set.
    pub fn exclusive_agent(agents: &[Agent], selected: &str) -> Self {
        let map = agents
            .iter()
            .map(|a| {
                (
                    a.name.clone(),
                    AgentToggle {
                        disable: a.name != selected,
                    },
                )
            })
            .collect();
        Self {
            model: None,
            agent: Some(map),
        }
    }
}

// Go backends encode empty slices as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
