mod block_networks;
mod pattern;
mod reverse_name;
mod router;
mod rule;

pub use block_networks::BlockNetworks;
pub use pattern::{DomainPattern, MatchMode};
pub use reverse_name::{reverse_name, ReverseNames};
pub use router::{QueryRouter, Route};
pub use rule::{ForwardRule, RuleAction};
