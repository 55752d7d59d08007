// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;

use super::RelayConfig;

fn parse(args: &[&str]) -> anyhow::Result<RelayConfig> {
    let argv = std::iter::once("coop-relay").chain(args.iter().copied());
    Ok(RelayConfig::try_parse_from(argv)?)
}

#[test]
fn defaults_match_reference_deployment() -> anyhow::Result<()> {
    let config = parse(&[])?;
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, 3001);
    assert_eq!(config.allowed_origins, vec!["http://localhost:3000".to_owned()]);
    assert!(!config.any_origin());
    config.validate()?;
    Ok(())
}

#[test]
fn origins_split_on_comma() -> anyhow::Result<()> {
    let config = parse(&["--allowed-origin", "http://a.test,http://b.test"])?;
    assert_eq!(config.allowed_origins.len(), 2);
    Ok(())
}

#[test]
fn wildcard_origin_detected() -> anyhow::Result<()> {
    let config = parse(&["--allowed-origin", "*"])?;
    assert!(config.any_origin());
    Ok(())
}

#[yare::parameterized(
    zero_buffer = { &["--send-buffer", "0"] },
    zero_ping = { &["--ping-interval-ms", "0"] },
    zero_pong = { &["--pong-timeout-ms", "0"] },
    bad_format = { &["--log-format", "xml"] },
)]
fn validate_rejects(args: &[&str]) {
    let config = match parse(args) {
        Ok(c) => c,
        Err(e) => unreachable!("args should parse: {e}"),
    };
    assert!(config.validate().is_err());
}

#[test]
fn durations_convert_millis() -> anyhow::Result<()> {
    let config = parse(&["--ping-interval-ms", "1500", "--pong-timeout-ms", "250"])?;
    assert_eq!(config.ping_interval(), std::time::Duration::from_millis(1500));
    assert_eq!(config.pong_timeout(), std::time::Duration::from_millis(250));
    Ok(())
}
