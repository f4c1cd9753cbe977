#![allow(dead_code)]
pub mod builders;
pub mod dns_server_mock;
pub mod mock_resolver;

pub use builders::*;
pub use dns_server_mock::{MockBehavior, MockDnsServer};
pub use mock_resolver::StaticResolver;
