use super::*;
use std::collections::HashMap;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn from_lookup_uses_defaults_when_unset() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
    assert_eq!(cfg, ClientConfig::default());
    assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
    assert_eq!(cfg.history_capacity, 100);
    assert_eq!(cfg.reconnect.max_attempts, 10);
    assert_eq!(cfg.reconnect.base_delay, Duration::from_millis(1_000));
    assert_eq!(cfg.reconnect.max_delay, Duration::from_millis(10_000));
}

#[test]
fn from_lookup_parses_overrides() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[
        ("LIVEFEED_URL", " wss://dash.example.test/ws "),
        ("LIVEFEED_RECONNECT_ATTEMPTS", "3"),
        ("LIVEFEED_RECONNECT_DELAY_MS", "250"),
        ("LIVEFEED_RECONNECT_DELAY_MAX_MS", "2000"),
        ("LIVEFEED_RECONNECT_JITTER", "0"),
        ("LIVEFEED_HISTORY_CAPACITY", "20"),
    ]))
    .unwrap();

    assert_eq!(cfg.endpoint, "wss://dash.example.test/ws");
    assert_eq!(
        cfg.reconnect,
        ReconnectPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_millis(2_000),
            jitter: 0.0,
        }
    );
    assert_eq!(cfg.history_capacity, 20);
}

#[test]
fn from_lookup_ignores_unparsable_values() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[
        ("LIVEFEED_RECONNECT_ATTEMPTS", "lots"),
        ("LIVEFEED_HISTORY_CAPACITY", "-1"),
    ]))
    .unwrap();
    assert_eq!(cfg.reconnect.max_attempts, DEFAULT_RECONNECT_ATTEMPTS);
    assert_eq!(cfg.history_capacity, DEFAULT_HISTORY_CAPACITY);
}

#[test]
fn from_lookup_rejects_inverted_delays() {
    let err = ClientConfig::from_lookup(lookup_from(&[
        ("LIVEFEED_RECONNECT_DELAY_MS", "5000"),
        ("LIVEFEED_RECONNECT_DELAY_MAX_MS", "100"),
    ]))
    .unwrap_err();
    assert_eq!(err, ConfigError::InvalidDelays { base_ms: 5000, max_ms: 100 });
}

#[test]
fn validate_rejects_bad_jitter_and_empty_endpoint() {
    let mut cfg = ClientConfig::default();
    cfg.reconnect.jitter = 1.5;
    assert!(matches!(cfg.validate(), Err(ConfigError::InvalidJitter(_))));

    let cfg = ClientConfig::new("");
    assert_eq!(cfg.validate(), Err(ConfigError::EmptyEndpoint));
}

#[test]
fn zero_history_capacity_is_rejected() {
    let mut cfg = ClientConfig::default();
    cfg.history_capacity = 0;
    assert_eq!(cfg.validate(), Err(ConfigError::ZeroHistoryCapacity));

    let err = ClientConfig::from_lookup(lookup_from(&[("LIVEFEED_HISTORY_CAPACITY", "0")])).unwrap_err();
    assert_eq!(err, ConfigError::ZeroHistoryCapacity);
}
