pub mod cache;
pub mod errors;
pub mod logging;
pub mod root;
pub mod routing;
pub mod server;
pub mod upstream;

pub use cache::CacheConfig;
pub use errors::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use root::{CliOverrides, Config};
pub use routing::{LocalPtrConfig, RoutingConfig};
pub use server::ServerConfig;
pub use upstream::{UpstreamGroup, UpstreamProtocol, UpstreamsConfig};
