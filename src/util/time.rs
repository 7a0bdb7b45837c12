//! arithmetic on the wrapping millisecond counter

/// milliseconds from `since` to `now`, correct across one wraparound
pub fn elapsed_millis(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

/// true once strictly more than `period` has passed since `since`
pub fn has_elapsed(now: u32, since: u32, period: u32) -> bool {
    elapsed_millis(now, since) > period
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_elapsed_across_wraparound() {
        let since = u32::MAX - 999;
        let now = since.wrapping_add(5_001);
        assert_eq!(now, 4_001);
        assert_eq!(elapsed_millis(now, since), 5_001);
        assert!(has_elapsed(now, since, 5_000));
        assert!(!has_elapsed(now, since, 5_001));
    }
}
