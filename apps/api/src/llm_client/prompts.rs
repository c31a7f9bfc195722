// Cross-provider prompt fragments. The batch prompt itself lives in
// suggestion::prompts.

/// System message for chat-style providers.
pub const JSON_ONLY_SYSTEM: &str = "You are a helpful assistant that outputs only JSON.";
