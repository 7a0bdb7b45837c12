pub mod link_supervisor;
pub mod prop;
pub mod status_reporter;
pub mod workers;
