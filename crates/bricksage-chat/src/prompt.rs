//! Prompt assembly for the LEGO expert assistant.
//!
//! The system prompt carries three context blocks: structured rows from the
//! local catalog, semantic search hits, and fresh results from the provider
//! APIs. Each set renders as one compact JSON line.

use bricksage_core::LegoSet;

use crate::types::ChatMessage;

/// Retrieved context handed to the LLM.
#[derive(Debug, Clone, Default)]
pub struct AssistantContext {
    /// Rows from the structured catalog query (name LIKE / filters).
    pub structured: Vec<LegoSet>,
    /// Semantic search hits.
    pub semantic: Vec<LegoSet>,
    /// Fresh results from the live provider APIs.
    pub live: Vec<LegoSet>,
}

impl AssistantContext {
    pub fn is_empty(&self) -> bool {
        self.structured.is_empty() && self.semantic.is_empty() && self.live.is_empty()
    }

    /// All sets across the three blocks, live results first, deduplicated
    /// by set_id.
    pub fn all_sets(&self) -> Vec<LegoSet> {
        let mut seen = std::collections::HashSet::new();
        self.live
            .iter()
            .chain(&self.semantic)
            .chain(&self.structured)
            .filter(|s| seen.insert(s.set_id.clone()))
            .cloned()
            .collect()
    }
}

/// Build the message array for the LLM: system prompt with context blocks,
/// conversation history, then the current user message.
pub fn build_messages(
    context: &AssistantContext,
    conversation_history: &[ChatMessage],
    user_message: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(conversation_history.len() + 2);

    let system_prompt = if context.is_empty() {
        "You are a LEGO expert assistant. No catalog context was retrieved for \
         this question; answer from general knowledge and say when you are \
         unsure. Provide a concise, informative response for LEGO collectors."
            .to_string()
    } else {
        format!(
            "You are a LEGO expert assistant. Use the following context to answer \
             the user's query.\n\
             Structured Data:\n{}\n\
             Semantic Search Results:\n{}\n\
             API Data:\n{}\n\
             Provide a concise, informative response for LEGO collectors.",
            render_sets(&context.structured),
            render_sets(&context.semantic),
            render_sets(&context.live),
        )
    };

    messages.push(ChatMessage::system(system_prompt));

    for msg in conversation_history {
        messages.push(msg.clone());
    }

    messages.push(ChatMessage::user(user_message));

    messages
}

fn render_sets(sets: &[LegoSet]) -> String {
    if sets.is_empty() {
        return "(none)".to_string();
    }
    sets.iter()
        .map(|s| serde_json::to_string(s).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn falcon() -> LegoSet {
        LegoSet {
            set_id: "75192".into(),
            name: "Millennium Falcon".into(),
            theme: "Star Wars".into(),
            piece_count: 7541,
            price: Some(849.99),
            release_year: Some(2017),
            description: None,
        }
    }

    #[test]
    fn test_system_prompt_carries_context() {
        let context = AssistantContext {
            structured: vec![falcon()],
            semantic: Vec::new(),
            live: Vec::new(),
        };
        let messages = build_messages(&context, &[], "how many pieces?");

        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("Millennium Falcon"));
        assert!(messages[0].content.contains("Structured Data"));
        assert_eq!(messages.last().unwrap().content, "how many pieces?");
    }

    #[test]
    fn test_empty_context_fallback_prompt() {
        let messages = build_messages(&AssistantContext::default(), &[], "hi");
        assert!(messages[0].content.contains("No catalog context"));
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn test_history_spliced_between_system_and_user() {
        let history = vec![
            ChatMessage::user("earlier question"),
            ChatMessage {
                role: "assistant".into(),
                content: "earlier answer".into(),
            },
        ];
        let messages = build_messages(&AssistantContext::default(), &history, "follow-up");

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].content, "earlier question");
        assert_eq!(messages[2].content, "earlier answer");
        assert_eq!(messages[3].content, "follow-up");
    }

    #[test]
    fn test_all_sets_dedups_live_first() {
        let context = AssistantContext {
            structured: vec![falcon()],
            semantic: vec![falcon()],
            live: vec![falcon()],
        };
        let sets = context.all_sets();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].set_id, "75192");
    }
}
