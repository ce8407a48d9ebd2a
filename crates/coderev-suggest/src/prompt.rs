use coderev_core::ChatTurn;

pub const SYSTEM_PROMPT: &str = "You are a helpful coding assistant.";

pub fn system_prompt() -> String {
    SYSTEM_PROMPT.to_string()
}

/// Wrap already-sanitized code for the user turn.
pub fn user_message(code: &str) -> String {
    format!("User provided code:\n{code}")
}

/// System, user, then the criterion's instruction as an assistant-priming turn.
pub fn build_messages(code: &str, instruction: &str) -> Vec<ChatTurn> {
    vec![
        ChatTurn::system(system_prompt()),
        ChatTurn::user(user_message(code)),
        ChatTurn::assistant(instruction),
    ]
}
