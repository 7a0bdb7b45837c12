use crate::common::error::PropError;

/// what the admin page shows about the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPage {
    pub name: String,
    pub version: String,
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminRequest {
    Reboot,
}

/// local administrative http interaction (status and update page)
pub trait AdminServer {
    fn begin(&mut self, page: AdminPage) -> Result<(), PropError>;

    /// serve pending interaction, returns the requests the loop must act on
    fn handle_client(&mut self) -> Vec<AdminRequest>;
}
