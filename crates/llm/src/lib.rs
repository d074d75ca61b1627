pub mod gateway;
pub mod prompt;
pub mod search;

pub use gateway::{GatewayClient, GatewayConfig, LlmError};
pub use prompt::build_system_prompt;
pub use search::{SearchClient, SearchConfig};
