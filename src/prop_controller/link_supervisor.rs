//! radio link supervision
//! - blocking attach at boot with a poll ceiling, restart when exceeded
//! - debounced reattach while the link is down

use crate::driver::traits::network::{Credentials, Network};
use crate::driver::traits::platform::{Platform, RestartReason};
use crate::common::error::{ErrorCode, PropError};
use crate::util::time::has_elapsed;
use crate::{debug, error, info, warn};

const LOG_TAG: &str = "link_supervisor";

pub const ATTACH_POLL_INTERVAL_MS: u32 = 100;
/// failed polls tolerated before the radio is considered wedged
pub const ATTACH_POLL_LIMIT: u32 = 30;
pub const REATTACH_COOLDOWN_MS: u32 = 5_000;
/// conservative transmit power applied after every successful attach
pub const TX_POWER_DBM: i8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Attached,
    Detached,
}

pub struct LinkSupervisor {
    network: Box<dyn Network + Send>,
    state: LinkState,
    // loss detection or last reattach, whichever is later
    last_mark: u32,
    reattach_count: u32,
}

impl LinkSupervisor {
    pub fn new(network: Box<dyn Network + Send>) -> Self {
        LinkSupervisor {
            network,
            state: LinkState::Detached,
            last_mark: 0,
            reattach_count: 0,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn reattach_count(&self) -> u32 {
        self.reattach_count
    }

    pub fn network(&self) -> &dyn Network {
        self.network.as_ref()
    }

    /// join the network, polling until attached
    /// more than ATTACH_POLL_LIMIT failed polls restart the device
    pub fn attach(
        &mut self,
        hostname: &str,
        credentials: &Credentials,
        platform: &mut dyn Platform,
    ) -> Result<(), PropError> {
        info!(LOG_TAG, "connecting to network, ssid: {}", credentials.ssid);
        self.network.set_hostname(hostname);
        self.network.begin(credentials);

        let mut polls = 0;
        while !self.network.is_attached() {
            platform.delay(ATTACH_POLL_INTERVAL_MS);
            polls += 1;
            debug!(LOG_TAG, "waiting for network, poll: {}", polls);
            if polls > ATTACH_POLL_LIMIT {
                error!(
                    LOG_TAG,
                    "network not attached after {} polls, restarting device", polls
                );
                platform.restart(RestartReason::LinkAttachTimeout);
                return Err(PropError::new(
                    ErrorCode::FatalRestart,
                    "network attach timed out",
                ));
            }
        }

        self.network.set_transmit_power(TX_POWER_DBM);
        self.state = LinkState::Attached;
        info!(
            LOG_TAG,
            "network attached, address: {:?}, rssi: {}",
            self.network.local_address(),
            self.network.signal_strength()
        );
        Ok(())
    }

    /// once per tick, never blocks
    /// a lost link is rejoined at most once per cooldown window
    pub fn check_health(&mut self, platform: &dyn Platform) -> LinkState {
        let now = platform.millis();

        if self.network.is_attached() {
            if self.state == LinkState::Detached {
                info!(LOG_TAG, "network link restored");
            }
            self.state = LinkState::Attached;
            return self.state;
        }

        if self.state == LinkState::Attached {
            warn!(LOG_TAG, "network link lost");
            self.state = LinkState::Detached;
            self.last_mark = now;
            return self.state;
        }

        if has_elapsed(now, self.last_mark, REATTACH_COOLDOWN_MS) {
            self.reattach_count += 1;
            warn!(
                LOG_TAG,
                "network still down, reattaching, attempt: {}", self.reattach_count
            );
            self.network.reattach();
            self.last_mark = now;
        }
        self.state
    }

    /// leave the network ahead of a restart
    pub fn detach(&mut self) {
        info!(LOG_TAG, "detaching from network");
        self.network.detach();
        self.state = LinkState::Detached;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::driver::mock::{world, Call, FakeNetwork, FakePlatform, SharedWorld};

    fn supervisor(world: &SharedWorld) -> (LinkSupervisor, FakePlatform) {
        (
            LinkSupervisor::new(Box::new(FakeNetwork(world.clone()))),
            FakePlatform(world.clone()),
        )
    }

    #[test]
    fn test_attach_after_a_few_polls() {
        let world = world();
        world.lock().unwrap().attach_after_polls = Some(5);
        let (mut link, mut platform) = supervisor(&world);

        link.attach("Lock1", &Credentials::new("props", "secret"), &mut platform)
            .unwrap();

        let w = world.lock().unwrap();
        assert_eq!(link.state(), LinkState::Attached);
        assert_eq!(w.count(|c| *c == Call::Delay(ATTACH_POLL_INTERVAL_MS)), 5);
        assert_eq!(w.calls.first(), Some(&Call::SetHostname("Lock1".to_string())));
        // transmit power follows the join
        assert_eq!(w.calls.last(), Some(&Call::SetTxPower(TX_POWER_DBM)));
        assert_eq!(w.restarts(), 0);
    }

    #[test]
    fn test_attach_timeout_restarts_once() {
        let world = world();
        world.lock().unwrap().attach_after_polls = None;
        let (mut link, mut platform) = supervisor(&world);

        let err = link
            .attach("Lock1", &Credentials::new("props", "secret"), &mut platform)
            .unwrap_err();

        let w = world.lock().unwrap();
        assert!(err.is_fatal());
        assert_eq!(w.restarts(), 1);
        assert_eq!(w.calls.last(), Some(&Call::Restart(RestartReason::LinkAttachTimeout)));
        assert_eq!(w.count(|c| matches!(c, Call::Delay(_))), (ATTACH_POLL_LIMIT + 1) as usize);
        assert_eq!(w.count(|c| matches!(c, Call::SetTxPower(_))), 0);
    }

    #[test]
    fn test_reattach_is_debounced() {
        let world = world();
        let (mut link, mut platform) = supervisor(&world);
        link.attach("Lock1", &Credentials::new("props", "secret"), &mut platform)
            .unwrap();
        world.lock().unwrap().lose_link();

        // 30 seconds of ticks every 10 ms with the link down
        let mut reattach_times = Vec::new();
        for _ in 0..3_000 {
            let before = link.reattach_count();
            assert_eq!(link.check_health(&platform), LinkState::Detached);
            if link.reattach_count() > before {
                reattach_times.push(platform.millis());
            }
            platform.delay(10);
        }

        assert!(!reattach_times.is_empty());
        // the first rejoin waits out the cooldown after detection
        assert!(reattach_times[0] > REATTACH_COOLDOWN_MS);
        for pair in reattach_times.windows(2) {
            assert!(pair[1] - pair[0] > REATTACH_COOLDOWN_MS);
        }
        assert_eq!(
            world.lock().unwrap().count(|c| *c == Call::Reattach),
            reattach_times.len()
        );
    }

    #[test]
    fn test_debounce_across_clock_wraparound() {
        let world = world();
        let (mut link, mut platform) = supervisor(&world);
        link.attach("Lock1", &Credentials::new("props", "secret"), &mut platform)
            .unwrap();
        {
            let mut w = world.lock().unwrap();
            w.now = u32::MAX - 2_000;
            w.lose_link();
        }

        link.check_health(&platform);
        platform.delay(4_000);
        link.check_health(&platform);
        assert_eq!(link.reattach_count(), 0);
        platform.delay(1_500);
        link.check_health(&platform);
        assert_eq!(link.reattach_count(), 1);
    }

    #[test]
    fn test_link_restored() {
        let world = world();
        world.lock().unwrap().reattach_succeeds = true;
        let (mut link, mut platform) = supervisor(&world);
        link.attach("Lock1", &Credentials::new("props", "secret"), &mut platform)
            .unwrap();
        world.lock().unwrap().lose_link();

        assert_eq!(link.check_health(&platform), LinkState::Detached);
        platform.delay(REATTACH_COOLDOWN_MS + 1);
        assert_eq!(link.check_health(&platform), LinkState::Detached);
        assert_eq!(link.check_health(&platform), LinkState::Attached);
        assert_eq!(link.reattach_count(), 1);
    }
}
