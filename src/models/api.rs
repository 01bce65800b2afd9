use serde::{ Serialize, Deserialize, Serializer };
use serde::ser::SerializeStruct;

/// The widget sends `conversationId`; other clients send `conversation_id`.
/// Both are read as separate keys so a body carrying both still parses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default, rename = "conversationId")]
    pub conversation_id_camel: Option<String>,
}

impl ChatRequest {
    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or(self.conversation_id_camel.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub conversation_id: String,
    pub message_count: usize,
}

// Written with both key spellings: snake_case for API clients, camelCase
// for the bundled widget.
impl Serialize for ChatResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ChatResponse", 5)?;
        state.serialize_field("response", &self.response)?;
        state.serialize_field("conversation_id", &self.conversation_id)?;
        state.serialize_field("message_count", &self.message_count)?;
        state.serialize_field("conversationId", &self.conversation_id)?;
        state.serialize_field("messageCount", &self.message_count)?;
        state.end()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalyticsResponse {
    pub total_conversations: usize,
    pub total_messages: usize,
    pub average_messages: f64,
}

impl Serialize for AnalyticsResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AnalyticsResponse", 6)?;
        state.serialize_field("total_conversations", &self.total_conversations)?;
        state.serialize_field("total_messages", &self.total_messages)?;
        state.serialize_field("average_messages", &self.average_messages)?;
        state.serialize_field("totalConversations", &self.total_conversations)?;
        state.serialize_field("totalMessages", &self.total_messages)?;
        state.serialize_field("averageMessages", &self.average_messages)?;
        state.end()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into(), details: None }
    }

    pub fn with_details(mut self, details: Option<String>) -> Self {
        self.details = details;
        self
    }
}
