//! CLI parse tests.

use super::{Cli, CliCommand};
use clap::Parser;
use clap_complete::Shell;
use std::path::Path;

fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}

#[test]
fn cli_parse_host() {
    match parse(&["snare", "host"]) {
        CliCommand::Host { ephemeral } => assert!(!ephemeral),
        _ => panic!("expected Host"),
    }
    match parse(&["snare", "host", "--ephemeral"]) {
        CliCommand::Host { ephemeral } => assert!(ephemeral),
        _ => panic!("expected Host with --ephemeral"),
    }
}

#[test]
fn cli_parse_import_har() {
    match parse(&["snare", "import-har", "capture.har"]) {
        CliCommand::ImportHar {
            path,
            allow_cookies,
            send,
        } => {
            assert_eq!(path, Path::new("capture.har"));
            assert!(!allow_cookies);
            assert!(!send);
        }
        _ => panic!("expected ImportHar"),
    }
}

#[test]
fn cli_parse_import_har_flags() {
    match parse(&[
        "snare",
        "import-har",
        "/tmp/x.har",
        "--allow-cookies",
        "--send",
    ]) {
        CliCommand::ImportHar {
            allow_cookies,
            send,
            ..
        } => {
            assert!(allow_cookies);
            assert!(send);
        }
        _ => panic!("expected ImportHar with flags"),
    }
}

#[test]
fn cli_parse_scan_dom() {
    match parse(&["snare", "scan-dom", "page.json"]) {
        CliCommand::ScanDom { document } => assert_eq!(document, Path::new("page.json")),
        _ => panic!("expected ScanDom"),
    }
}

#[test]
fn cli_parse_links_min_size() {
    match parse(&["snare", "links"]) {
        CliCommand::Links { min_size } => assert_eq!(min_size, None),
        _ => panic!("expected Links"),
    }
    match parse(&["snare", "links", "--min-size", "1.5MB"]) {
        CliCommand::Links { min_size } => assert_eq!(min_size, Some(1_572_864)),
        _ => panic!("expected Links with --min-size"),
    }
}

#[test]
fn cli_rejects_bad_size() {
    assert!(Cli::try_parse_from(["snare", "links", "--min-size", "lots"]).is_err());
}

#[test]
fn cli_parse_list_ops() {
    match parse(&["snare", "toggle", "link_1700000000000_3"]) {
        CliCommand::Toggle { id } => assert_eq!(id, "link_1700000000000_3"),
        _ => panic!("expected Toggle"),
    }
    match parse(&["snare", "remove", "menu_1"]) {
        CliCommand::Remove { id } => assert_eq!(id, "menu_1"),
        _ => panic!("expected Remove"),
    }
    assert!(matches!(parse(&["snare", "clear"]), CliCommand::Clear));
    assert!(matches!(parse(&["snare", "send"]), CliCommand::Send));
    assert!(matches!(
        parse(&["snare", "test-connection"]),
        CliCommand::TestConnection
    ));
}

#[test]
fn cli_parse_probe() {
    match parse(&["snare", "probe", "https://example.com/file.iso"]) {
        CliCommand::Probe { url } => assert_eq!(url, "https://example.com/file.iso"),
        _ => panic!("expected Probe"),
    }
}

#[test]
fn cli_parse_completions() {
    match parse(&["snare", "completions", "bash"]) {
        CliCommand::Completions { shell } => assert_eq!(shell, Shell::Bash),
        _ => panic!("expected Completions"),
    }
}

#[test]
fn cli_requires_an_id() {
    assert!(Cli::try_parse_from(["snare", "toggle"]).is_err());
    assert!(Cli::try_parse_from(["snare", "frobnicate"]).is_err());
}

#[test]
fn cli_parse_man() {
    assert!(matches!(parse(&["snare", "man"]), CliCommand::Man));
}

#[test]
fn cli_definition_is_consistent() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}
