// tests/logging_levels.rs

use buildwatch::cli::LogLevel;
use buildwatch::logging::resolve_level;
use tracing::Level;

#[test]
fn cli_flag_wins_over_env() {
    assert_eq!(resolve_level(Some(LogLevel::Trace), Some("error")), Level::TRACE);
    assert_eq!(resolve_level(Some(LogLevel::Warn), None), Level::WARN);
}

#[test]
fn env_value_is_used_without_flag() {
    assert_eq!(resolve_level(None, Some("debug")), Level::DEBUG);
    assert_eq!(resolve_level(None, Some(" WARNING ")), Level::WARN);
    assert_eq!(resolve_level(None, Some("Error")), Level::ERROR);
}

#[test]
fn defaults_to_info() {
    assert_eq!(resolve_level(None, None), Level::INFO);
    assert_eq!(resolve_level(None, Some("chatty")), Level::INFO);
    assert_eq!(resolve_level(None, Some("")), Level::INFO);
}

#[test]
fn every_cli_level_maps() {
    let pairs = [
        (LogLevel::Error, Level::ERROR),
        (LogLevel::Warn, Level::WARN),
        (LogLevel::Info, Level::INFO),
        (LogLevel::Debug, Level::DEBUG),
        (LogLevel::Trace, Level::TRACE),
    ];
    for (cli, level) in pairs {
        assert_eq!(Level::from(cli), level);
    }
}
