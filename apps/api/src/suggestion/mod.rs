// AI suggestion pipeline: prompt → provider → extract → normalize.
// All provider HTTP goes through llm_client; nothing here talks to the network.

pub mod autofill;
pub mod extract;
pub mod handlers;
pub mod normalize;
pub mod pipeline;
pub mod prompts;
