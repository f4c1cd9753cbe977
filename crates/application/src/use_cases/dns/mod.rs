mod handle_dns_query;
mod resolution;

pub use handle_dns_query::HandleDnsQueryUseCase;
pub use resolution::{Answer, DnsResolution};
