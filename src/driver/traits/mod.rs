//! seams to the collaborators the prop drives: radio link, message bus,
//! hardware platform and the local admin page

pub mod admin;
pub mod bus;
pub mod network;
pub mod platform;
