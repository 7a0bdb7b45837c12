//! connection supervision and status core of an escape-room prop
//!
//! a `Prop` joins the network, keeps an mqtt session with last will, publishes
//! boot telemetry once and status periodically and after every command, and
//! restarts the device on a `reboot` command or when the link or the broker
//! cannot be recovered.

pub mod common;
pub mod driver;
pub mod entity;
pub mod http_server;
pub mod mqtt_client;
pub mod prop_controller;
pub mod util;

pub use common::error::{ErrorCode, PropError};
pub use driver::traits::network::Credentials;
pub use driver::traits::platform::PlatformFamily;
pub use prop_controller::prop::{Prop, PropDrivers};
pub use prop_controller::workers::loop_thread::{run_loop, spawn_loop};
