//! supervisory loop
//! multi core platforms run it on a dedicated thread, single core platforms
//! call `run_loop` (or `Prop::tick`) from their own main loop

use std::thread::{self, JoinHandle};

use crate::common::error::{ErrorCode, PropError};
use crate::prop_controller::prop::Prop;
use crate::{info, warn};

const LOG_TAG: &str = "loop_thread";

pub const LOOP_THREAD_NAME: &str = "ee_prop";

/// tick and yield until the prop requests a restart
pub fn run_loop(prop: &mut Prop) {
    info!(LOG_TAG, "supervisory loop started, family: {:?}", prop.family());
    while !prop.is_halted() {
        prop.tick();
        if prop.is_halted() {
            break;
        }
        prop.idle();
    }
    warn!(LOG_TAG, "supervisory loop stopped, device restart pending");
}

/// move the prop onto its own thread, the handle joins once the loop stops
pub fn spawn_loop(mut prop: Prop) -> Result<JoinHandle<()>, PropError> {
    thread::Builder::new()
        .name(LOOP_THREAD_NAME.to_string())
        .spawn(move || run_loop(&mut prop))
        .map_err(|e| PropError {
            code: ErrorCode::UnknownError,
            msg: format!("cannot spawn supervisory loop thread: {e}"),
        })
}
