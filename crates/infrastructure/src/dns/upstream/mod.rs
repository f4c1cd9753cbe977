pub mod pool;
pub mod registry;

pub use pool::{UpstreamPool, UpstreamResult};
pub use registry::UpstreamRegistry;
