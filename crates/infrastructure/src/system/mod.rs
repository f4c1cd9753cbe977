pub mod interfaces;

pub use interfaces::InterfaceAddresses;
