pub mod app_config;
pub mod credential;
pub mod guild;
pub mod proxy;

pub use app_config::{FetchConfig, LoggingConfig};
pub use credential::Credential;
pub use guild::{FetchOutcome, FetchResult, GuildSummary};
pub use proxy::{ParsedProxy, ProxyDescriptor};
