pub mod host_network;
pub mod host_platform;
pub mod traits;

#[cfg(test)]
pub mod mock;
