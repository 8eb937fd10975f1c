//! NPC dialogue through an external text-completion service.
//!
//! The simulation never waits on the service. [`DialogueService`] runs each
//! request on its own tokio runtime and hands the finished reply to a
//! callback; the world picks replies up from a channel on its next tick.
//! With the service disabled, or when a request fails or times out, NPCs
//! answer from a small set of canned lines instead.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use ironvale_common::EntityId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::faction::Relationship;
use crate::needs::Mood;
use crate::npc::{ConversationEntry, Npc, Personality};

/// Placeholder shown while a reply is on its way.
pub const THINKING_TEXT: &str = "...";

// ============================================================================
// Errors and configuration
// ============================================================================

/// Errors from the completion service.
#[derive(Debug, Error)]
pub enum DialogueError {
    /// The service is switched off in configuration
    #[error("dialogue service is disabled")]
    Disabled,
    /// Network or protocol failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The service answered with a non-success status
    #[error("service returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, if readable
        body: String,
    },
    /// The service answered without any text
    #[error("service returned an empty response")]
    EmptyResponse,
    /// No answer within the configured timeout
    #[error("no response within {0:?}")]
    Timeout(Duration),
    /// The background runtime could not start
    #[error("failed to start dialogue runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Result alias for dialogue operations.
pub type DialogueResult<T> = Result<T, DialogueError>;

/// Completion service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    /// Use the service at all; when false NPCs answer with canned lines
    pub enabled: bool,
    /// Base URL of an OpenAI-compatible API
    pub api_url: String,
    /// Optional bearer token
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// Sampling temperature for replies
    pub temperature: f32,
    /// Token cap for replies
    pub max_tokens: u32,
    /// Seconds to wait before giving up on a request
    pub timeout_secs: f64,
    /// Line used when the service fails
    pub fallback_reply: String,
    /// Conversation entries included in the prompt
    pub history_window: usize,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: "http://localhost:8000/v1".to_string(),
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            max_tokens: 150,
            timeout_secs: 10.0,
            fallback_reply: "(They seem lost in thought.)".to_string(),
            history_window: 5,
        }
    }
}

impl DialogueConfig {
    /// Request timeout as a duration. Invalid values fall back to ten seconds.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs).unwrap_or(Duration::from_secs(10))
    }
}

// ============================================================================
// Prompt context
// ============================================================================

/// Everything the service is told about an NPC before it replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    /// Who is speaking
    pub npc: EntityId,
    /// NPC name
    pub npc_name: String,
    /// Personality, rendered as JSON in the prompt
    pub personality: Personality,
    /// Mood
    pub mood: Mood,
    /// Standing with the player
    pub relationship: Relationship,
    /// Most recent conversation, oldest first
    pub history: Vec<ConversationEntry>,
    /// Free-form facts about the current situation
    pub game_context: BTreeMap<String, serde_json::Value>,
}

impl ConversationContext {
    /// Captures an NPC's current state and its last `history_window` lines.
    #[must_use]
    pub fn from_npc(npc: &Npc, history_window: usize) -> Self {
        Self {
            npc: npc.id(),
            npc_name: npc.name().to_string(),
            personality: npc.personality.clone(),
            mood: npc.mood(),
            relationship: npc.relationship(),
            history: npc.recent_conversation(history_window),
            game_context: BTreeMap::new(),
        }
    }

    /// Adds a fact about the situation.
    #[must_use]
    pub fn with_game_context(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.game_context.insert(key.into(), value.into());
        self
    }

    /// Renders the system prompt.
    #[must_use]
    pub fn to_prompt(&self) -> String {
        let personality = serde_json::to_string_pretty(&self.personality).unwrap_or_default();
        let situation = serde_json::to_string_pretty(&self.game_context).unwrap_or_default();
        let mut prompt = format!(
            "You are a game NPC named {name}.\n\n\
             Personality:\n{personality}\n\n\
             Current mood: {mood}\n\
             Relationship with the player: {relationship}\n\n\
             Game context:\n{situation}\n\n\
             Conversation so far:\n",
            name = self.npc_name,
            mood = self.mood.as_str(),
            relationship = self.relationship.as_str(),
        );
        for entry in &self.history {
            prompt.push_str(&entry.speaker);
            prompt.push_str(": ");
            prompt.push_str(&entry.message);
            prompt.push('\n');
        }
        prompt.push_str(
            "\nReply to the player in character, consistent with your personality and \
             current state. Keep it under fifty words.",
        );
        prompt
    }

    /// Canned reply for this NPC.
    #[must_use]
    pub fn basic_reply(&self, message: &str) -> String {
        canned_reply(&self.npc_name, &self.personality, self.mood, message)
    }
}

/// Keyword-driven reply used when no completion service is available.
#[must_use]
pub fn basic_response(npc: &Npc, message: &str) -> String {
    canned_reply(npc.name(), &npc.personality, npc.mood(), message)
}

fn canned_reply(name: &str, personality: &Personality, mood: Mood, message: &str) -> String {
    let message = message.to_lowercase();
    if message.contains("hello") {
        if personality.kindness > 70 {
            format!("Hello! Lovely to meet you, I'm {name}.")
        } else if personality.aggression > 70 {
            format!("What do you want? I'm {name}.")
        } else {
            format!("Hello, I'm {name}.")
        }
    } else if message.contains("quest") {
        "I have no work for you right now.".to_string()
    } else if message.contains("help") {
        "If you need help, try asking around.".to_string()
    } else {
        match mood {
            Mood::Happy => "Feeling good today!",
            Mood::Angry => "I'm not in the mood.",
            _ if personality.kindness > 70 => "Nice to see you!",
            _ if personality.aggression > 70 => "What are you after?",
            _ => "Hmm...",
        }
        .to_string()
    }
}

/// Picks the option a free-text answer refers to. Falls back to the first
/// option when nothing matches.
#[must_use]
pub fn match_option<'a>(response: &str, options: &'a [String]) -> Option<&'a str> {
    let response = response.trim().to_lowercase();
    options
        .iter()
        .find(|option| {
            let option = option.to_lowercase();
            !response.is_empty() && (response.contains(&option) || option.contains(&response))
        })
        .or_else(|| options.first())
        .map(String::as_str)
}

// ============================================================================
// Backends
// ============================================================================

/// One completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System prompt
    pub system: String,
    /// User message
    pub user: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Token cap
    pub max_tokens: u32,
}

/// A text-completion service.
pub trait CompletionBackend: Send + Sync {
    /// Produces a completion for the request.
    fn complete(&self, request: CompletionRequest) -> BoxFuture<'_, DialogueResult<String>>;
}

/// OpenAI-compatible chat completions over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCompletionBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpCompletionBackend {
    /// Builds a client for the configured endpoint.
    pub fn from_config(config: &DialogueConfig) -> DialogueResult<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    /// Full chat-completions URL.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_url)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl CompletionBackend for HttpCompletionBackend {
    fn complete(&self, request: CompletionRequest) -> BoxFuture<'_, DialogueResult<String>> {
        async move {
            let body = ChatRequest {
                model: &self.model,
                messages: [
                    ChatMessage {
                        role: "system",
                        content: &request.system,
                    },
                    ChatMessage {
                        role: "user",
                        content: &request.user,
                    },
                ],
                temperature: request.temperature,
                max_tokens: request.max_tokens,
            };

            let mut builder = self.client.post(self.endpoint()).json(&body);
            if let Some(key) = &self.api_key {
                builder = builder.bearer_auth(key);
            }
            let response = builder.send().await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(DialogueError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let completion: ChatResponse = response.json().await?;
            completion
                .choices
                .into_iter()
                .next()
                .map(|choice| choice.message.content.trim().to_string())
                .filter(|text| !text.is_empty())
                .ok_or(DialogueError::EmptyResponse)
        }
        .boxed()
    }
}

// ============================================================================
// Transcript
// ============================================================================

/// One line in a conversation window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptLine {
    /// Who said it
    pub speaker: String,
    /// What they said
    pub text: String,
    /// True for a placeholder awaiting a reply
    pub pending: bool,
}

/// What a conversation window shows. Shared between the caller and the
/// request running in the background.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    lines: Vec<TranscriptLine>,
}

impl Transcript {
    /// Creates an empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a finished line.
    pub fn push(&mut self, speaker: impl Into<String>, text: impl Into<String>) {
        self.lines.push(TranscriptLine {
            speaker: speaker.into(),
            text: text.into(),
            pending: false,
        });
    }

    /// Appends a placeholder for a reply that is still on its way.
    pub fn push_thinking(&mut self, speaker: impl Into<String>) {
        self.lines.push(TranscriptLine {
            speaker: speaker.into(),
            text: THINKING_TEXT.to_string(),
            pending: true,
        });
    }

    /// Drops the speaker's latest placeholder, if any, then appends the reply.
    pub fn resolve(&mut self, speaker: &str, text: impl Into<String>) {
        if let Some(index) = self
            .lines
            .iter()
            .rposition(|line| line.pending && line.speaker == speaker)
        {
            self.lines.remove(index);
        }
        self.push(speaker, text);
    }

    /// All lines, oldest first.
    #[must_use]
    pub fn lines(&self) -> &[TranscriptLine] {
        &self.lines
    }

    /// Latest line.
    #[must_use]
    pub fn last(&self) -> Option<&TranscriptLine> {
        self.lines.last()
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// True while any reply is outstanding.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.lines.iter().any(|line| line.pending)
    }
}

// ============================================================================
// Service
// ============================================================================

/// A finished exchange, ready to be written into the NPC's memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueReply {
    /// NPC that replied
    pub npc: EntityId,
    /// NPC name
    pub npc_name: String,
    /// What the player said
    pub player_message: String,
    /// What the NPC answered
    pub reply: String,
    /// True if the reply is canned or a fallback rather than generated
    pub fallback: bool,
}

/// Sends conversation requests to a completion backend without blocking
/// the simulation.
pub struct DialogueService {
    config: DialogueConfig,
    backend: Arc<dyn CompletionBackend>,
    runtime: tokio::runtime::Runtime,
}

impl std::fmt::Debug for DialogueService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogueService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DialogueService {
    /// Creates a service that talks to the configured HTTP endpoint.
    pub fn from_config(config: DialogueConfig) -> DialogueResult<Self> {
        let backend = HttpCompletionBackend::from_config(&config)?;
        Self::new(config, Arc::new(backend))
    }

    /// Creates a service with an explicit backend.
    pub fn new(config: DialogueConfig, backend: Arc<dyn CompletionBackend>) -> DialogueResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("ironvale-dialogue")
            .enable_all()
            .build()?;
        Ok(Self {
            config,
            backend,
            runtime,
        })
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &DialogueConfig {
        &self.config
    }

    /// Whether requests go to the backend.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Asks the NPC for a reply.
    ///
    /// The player's line and a thinking placeholder are added to the
    /// transcript at once. When the reply arrives the placeholder is
    /// replaced and `on_complete` runs on the service's runtime thread.
    /// With the service disabled the canned reply is delivered before this
    /// returns. Requests are never cancelled.
    pub fn request_reply<F>(
        &self,
        context: ConversationContext,
        message: impl Into<String>,
        transcript: Arc<Mutex<Transcript>>,
        on_complete: F,
    ) where
        F: FnOnce(DialogueReply) + Send + 'static,
    {
        let message = message.into();
        {
            let mut transcript = transcript.lock();
            transcript.push("player", message.clone());
            transcript.push_thinking(context.npc_name.clone());
        }

        if !self.config.enabled {
            let reply = context.basic_reply(&message);
            deliver(&context, message, reply, true, &transcript, on_complete);
            return;
        }

        let request = CompletionRequest {
            system: context.to_prompt(),
            user: message.clone(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };
        let backend = Arc::clone(&self.backend);
        let timeout = self.config.timeout();
        let fallback_reply = self.config.fallback_reply.clone();

        debug!(npc = %context.npc_name, "Dialogue request sent");
        self.runtime.spawn(async move {
            let outcome = match tokio::time::timeout(timeout, backend.complete(request)).await {
                Ok(result) => result,
                Err(_) => Err(DialogueError::Timeout(timeout)),
            };
            let (reply, fallback) = match outcome {
                Ok(text) => (text, false),
                Err(error) => {
                    warn!(npc = %context.npc_name, %error, "Dialogue request failed, using fallback");
                    (fallback_reply, true)
                },
            };
            deliver(&context, message, reply, fallback, &transcript, on_complete);
        });
    }

    /// Asks the service which of `options` the NPC would choose in a
    /// situation. Delivers `None` when disabled or on failure.
    pub fn request_action<F>(
        &self,
        context: &ConversationContext,
        situation: impl Into<String>,
        options: Vec<String>,
        on_complete: F,
    ) where
        F: FnOnce(Option<String>) + Send + 'static,
    {
        if !self.config.enabled || options.is_empty() {
            on_complete(None);
            return;
        }

        let user = format!(
            "NPC: {}\nTraits: {}\nMood: {}\nRelationship: {}\n\n\
             Situation: {}\n\nOptions: {}\n\n\
             Pick the single most fitting option. Answer with its name only.",
            context.npc_name,
            context.personality.traits.join(", "),
            context.mood.as_str(),
            context.relationship.as_str(),
            situation.into(),
            options.join(", "),
        );
        let request = CompletionRequest {
            system: "You are a game AI helping an NPC decide what to do.".to_string(),
            user,
            temperature: 0.5,
            max_tokens: 50,
        };
        let backend = Arc::clone(&self.backend);
        let timeout = self.config.timeout();
        let npc_name = context.npc_name.clone();

        self.runtime.spawn(async move {
            let choice = match tokio::time::timeout(timeout, backend.complete(request)).await {
                Ok(Ok(answer)) => match_option(&answer, &options).map(str::to_string),
                Ok(Err(error)) => {
                    warn!(npc = %npc_name, %error, "Action request failed");
                    None
                },
                Err(_) => {
                    warn!(npc = %npc_name, ?timeout, "Action request timed out");
                    None
                },
            };
            on_complete(choice);
        });
    }
}

fn deliver<F>(
    context: &ConversationContext,
    player_message: String,
    reply: String,
    fallback: bool,
    transcript: &Mutex<Transcript>,
    on_complete: F,
) where
    F: FnOnce(DialogueReply),
{
    transcript.lock().resolve(&context.npc_name, reply.clone());
    on_complete(DialogueReply {
        npc: context.npc,
        npc_name: context.npc_name.clone(),
        player_message,
        reply,
        fallback,
    });
}
