use dnsward_domain::Config;

#[test]
fn default_config_has_two_cloudflare_endpoints() {
    let config = Config::default();
    assert_eq!(config.dns_servers.len(), 2);
    assert_eq!(config.metrics_port, 9090);
    assert!(config.log_queries);
    assert!(!config.blocklist_disable_updates);
}

#[test]
fn default_config_validates() {
    Config::default().validate().expect("default config must validate");
}

#[test]
fn empty_endpoint_list_fails_validation() {
    let mut config = Config::default();
    config.dns_servers.clear();
    assert!(config.validate().is_err());
}

#[test]
fn non_ip_override_key_fails_validation() {
    let mut config = Config::default();
    config
        .overrides_by_client_addr
        .insert("not-an-ip".to_string(), Default::default());
    assert!(config.validate().is_err());
}

#[test]
fn policy_for_falls_back_to_default() {
    let mut config = Config::default();
    config.default_client_config.disable_blocklisting = true;

    let policy = config.policy_for("10.0.0.5");
    assert!(policy.disable_blocklisting);
}

#[test]
fn policy_for_uses_explicit_override() {
    let mut config = Config::default();
    let mut override_cfg = dnsward_domain::OverridableConfig::default();
    override_cfg.reject_all_queries = true;
    config
        .overrides_by_client_addr
        .insert("192.168.1.10".to_string(), override_cfg);

    let policy = config.policy_for("192.168.1.10");
    assert!(policy.reject_all_queries);
}

#[test]
fn config_round_trips_through_json() {
    let config = Config::default();
    let serialized = serde_json::to_string(&config).unwrap();
    let deserialized: Config = serde_json::from_str(&serialized).unwrap();
    assert_eq!(deserialized.dns_servers, config.dns_servers);
}
