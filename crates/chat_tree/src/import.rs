//! Transcript import - turns an exported linear chat into a conversation tree.
//!
//! Expected shape:
//!
//! ```json
//! {
//!   "metadata": { "title": "...", "user": { "name": "...", "email": "..." },
//!                 "dates": { "created": "...", "updated": "...", "exported": "..." } },
//!   "messages": [ { "role": "Prompt", "say": "..." }, { "role": "Response", "say": "..." } ]
//! }
//! ```

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::{Result, TreeError};
use crate::tree::{
    ChatNode, ConversationDates, ConversationTree, NodeId, TreeMetadata, UserInfo,
};

pub const UNTITLED_CONVERSATION: &str = "Untitled Conversation";
pub const UNKNOWN_USER: &str = "Unknown User";

const PROMPT_ROLE: &str = "Prompt";
const RESPONSE_ROLE: &str = "Response";

/// Id of the imported node at `index` in transcript order.
pub fn imported_node_id(index: usize) -> NodeId {
    format!("node-{index}")
}

/// Parse a transcript from JSON text.
pub fn import_conversation_str(input: &str) -> Result<ConversationTree> {
    let value: Value =
        serde_json::from_str(input).map_err(|e| TreeError::InvalidFormat(e.to_string()))?;
    import_conversation(&value)
}

/// Build a linear conversation tree from a parsed transcript.
pub fn import_conversation(value: &Value) -> Result<ConversationTree> {
    let object = value
        .as_object()
        .ok_or_else(|| TreeError::InvalidFormat("expected a JSON object".to_string()))?;
    let metadata = object
        .get("metadata")
        .and_then(Value::as_object)
        .ok_or_else(|| TreeError::InvalidFormat("missing metadata object".to_string()))?;
    let messages = object
        .get("messages")
        .and_then(Value::as_array)
        .ok_or_else(|| TreeError::InvalidFormat("missing messages array".to_string()))?;

    let pairs = pair_messages(messages);
    if pairs.is_empty() {
        return Err(TreeError::EmptyConversation);
    }

    let count = pairs.len();
    let mut nodes = HashMap::with_capacity(count);
    for (index, (prompt, response)) in pairs.into_iter().enumerate() {
        let parent_id = index.checked_sub(1).map(imported_node_id);
        let mut node = ChatNode::imported(imported_node_id(index), prompt, response, parent_id);
        if index + 1 < count {
            node.child_ids.push(imported_node_id(index + 1));
        }
        nodes.insert(node.id.clone(), node);
    }

    log::debug!(
        "Imported {} exchanges from {} transcript entries",
        count,
        messages.len()
    );

    ConversationTree::from_parts(parse_metadata(metadata), nodes, imported_node_id(0))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum EntryRole {
    Prompt,
    Response,
    Other,
}

fn entry(value: &Value) -> (EntryRole, &str) {
    let role = match value.get("role").and_then(Value::as_str) {
        Some(PROMPT_ROLE) => EntryRole::Prompt,
        Some(RESPONSE_ROLE) => EntryRole::Response,
        _ => EntryRole::Other,
    };
    let say = value.get("say").and_then(Value::as_str).unwrap_or_default();
    (role, say)
}

/// Pair each prompt with the response right after it.
///
/// A prompt not followed by a response gets an empty one; responses with no
/// unpaired prompt before them are dropped, as are unknown entries.
fn pair_messages(messages: &[Value]) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut dropped = 0usize;
    let mut index = 0;

    while index < messages.len() {
        let (role, say) = entry(&messages[index]);
        if role != EntryRole::Prompt {
            dropped += 1;
            index += 1;
            continue;
        }

        match messages.get(index + 1).map(entry) {
            Some((EntryRole::Response, response)) => {
                pairs.push((say.to_string(), response.to_string()));
                index += 2;
            }
            _ => {
                pairs.push((say.to_string(), String::new()));
                index += 1;
            }
        }
    }

    if dropped > 0 {
        log::debug!("Dropped {} unpaired transcript entries", dropped);
    }
    pairs
}

fn string_field(object: Option<&Map<String, Value>>, key: &str) -> Option<String> {
    object
        .and_then(|o| o.get(key))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn parse_metadata(metadata: &Map<String, Value>) -> TreeMetadata {
    let user = metadata.get("user").and_then(Value::as_object);
    let dates = metadata.get("dates").and_then(Value::as_object);

    TreeMetadata {
        title: string_field(Some(metadata), "title")
            .unwrap_or_else(|| UNTITLED_CONVERSATION.to_string()),
        user: UserInfo {
            name: string_field(user, "name").unwrap_or_else(|| UNKNOWN_USER.to_string()),
            email: string_field(user, "email").unwrap_or_default(),
        },
        dates: ConversationDates {
            created: string_field(dates, "created").unwrap_or_default(),
            updated: string_field(dates, "updated").unwrap_or_default(),
            exported: string_field(dates, "exported").unwrap_or_default(),
        },
    }
}
