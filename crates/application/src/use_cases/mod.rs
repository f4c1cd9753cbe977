pub mod dns;

pub use dns::{Answer, DnsResolution, HandleDnsQueryUseCase};
