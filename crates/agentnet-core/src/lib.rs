pub mod config;
pub mod error;
pub mod event;
pub mod traits;
pub mod types;

pub use config::AppConfig;
pub use error::{AgentNetError, Result};
pub use event::{BuilderEvent, EventBus};
pub use traits::Backend;
pub use types::*;
