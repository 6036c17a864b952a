//! Task-completion override injection.
//!
//! Once a participant moves past the study task, the assistant is told to stop
//! working on it by a system message placed right after the condition's system
//! prompt. When the task is active again, every such message is stripped.

use super::entities::Message;

/// Marker substring identifying an override system message.
pub const OVERRIDE_MARKER: &str = "CRITICAL OVERRIDE";

/// Override instruction inserted while the task is inactive.
pub const TASK_COMPLETE_OVERRIDE: &str = "CRITICAL OVERRIDE: The main task is now complete. \
You must politely decline any requests to continue or restart the task. \
Suggested responses:\n\
- 'That activity is complete.'\n\
- 'I've finished helping with that. Feel free to continue with the survey!'\n\
You may still have friendly conversations about other topics.";

/// Produce the outbound message sequence for the given task state.
///
/// Never touches `conversation`; the result is always a fresh vector.
/// Applying twice with the same `task_active` yields the same sequence as
/// applying once.
pub fn apply_task_override(conversation: &[Message], task_active: bool) -> Vec<Message> {
    if task_active {
        return conversation
            .iter()
            .filter(|m| !m.is_system_with(OVERRIDE_MARKER))
            .cloned()
            .collect();
    }

    let mut outbound = conversation.to_vec();
    if outbound.iter().any(|m| m.is_system_with(OVERRIDE_MARKER)) {
        return outbound;
    }

    let override_message = Message::system(TASK_COMPLETE_OVERRIDE);
    if outbound.len() < 2 {
        outbound.push(override_message);
    } else {
        outbound.insert(1, override_message);
    }
    outbound
}
