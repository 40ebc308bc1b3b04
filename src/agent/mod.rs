//! Agents, the agent tree and the per-step model loop.

pub mod agent;
pub mod callbacks;
pub mod contents;
pub mod flow;
pub mod tree;

pub use agent::LlmAgent;
pub use callbacks::{BeforeModelCallback, CallbackContext};
pub use tree::AgentTree;
