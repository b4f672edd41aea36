use super::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn policy(base_ms: u64, max_ms: u64, jitter: f64) -> ReconnectPolicy {
    ReconnectPolicy {
        max_attempts: 10,
        base_delay: Duration::from_millis(base_ms),
        max_delay: Duration::from_millis(max_ms),
        jitter,
    }
}

#[test]
fn delays_double_until_capped() {
    let mut backoff = Backoff::new(policy(1_000, 10_000, 0.0));
    let delays: Vec<u64> = (0..6)
        .map(|_| u64::try_from(backoff.next_delay().as_millis()).unwrap())
        .collect();
    assert_eq!(delays, vec![1_000, 2_000, 4_000, 8_000, 10_000, 10_000]);
    assert_eq!(backoff.attempts(), 6);
}

#[test]
fn reset_starts_over_from_base() {
    let mut backoff = Backoff::new(policy(100, 10_000, 0.0));
    backoff.next_delay();
    backoff.next_delay();
    backoff.reset();
    assert_eq!(backoff.attempts(), 0);
    assert_eq!(backoff.next_delay(), Duration::from_millis(100));
}

#[test]
fn jitter_stays_within_bounds() {
    let mut rng = StdRng::seed_from_u64(7);
    for attempt in 0..5_u32 {
        let mut backoff = Backoff::new(policy(1_000, 60_000, 0.5));
        for _ in 0..attempt {
            backoff.next_delay_with(&mut rng);
        }
        let nominal = 1_000_u64 * 2_u64.pow(attempt);
        let delay = u64::try_from(backoff.next_delay_with(&mut rng).as_millis()).unwrap();
        assert!(delay >= nominal / 2, "attempt {attempt}: {delay} < {}", nominal / 2);
        assert!(delay <= nominal + nominal / 2, "attempt {attempt}: {delay} too large");
    }
}

#[test]
fn jittered_delay_never_exceeds_max() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut backoff = Backoff::new(policy(1_000, 3_000, 1.0));
    for _ in 0..50 {
        assert!(backoff.next_delay_with(&mut rng) <= Duration::from_millis(3_000));
    }
}

#[test]
fn huge_attempt_counts_do_not_overflow() {
    let mut backoff = Backoff::new(policy(1, 5_000, 0.0));
    for _ in 0..200 {
        backoff.next_delay();
    }
    assert_eq!(backoff.next_delay(), Duration::from_millis(5_000));
}
