pub mod dns;
pub mod shutdown;

pub use dns::start_dns_server;
pub use shutdown::shutdown_signal;
