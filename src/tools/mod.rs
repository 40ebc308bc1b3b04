//! Tool system for function calling.

pub mod arguments;
pub mod greeting;
pub mod tool;
pub mod transfer;
pub mod types;
pub mod weather;

pub use arguments::ToolArguments;
pub use greeting::{say_goodbye_tool, say_hello_tool};
pub use tool::{AgentTool, Tool, ToolContext};
pub use transfer::TransferToAgentTool;
pub use types::AgentToolParameters;
pub use weather::{TemperatureUnit, WeatherTool};
