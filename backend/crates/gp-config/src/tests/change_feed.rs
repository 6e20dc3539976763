use crate::Config;
use crate::tests::{EnvGuard, setup_config_dir};

use googletest::assert_that;
use googletest::prelude::{anything, err, ok};
use serial_test::serial;

// =========================================================================
// Validation Tests - Change Feed
// =========================================================================

#[test]
#[serial]
fn given_empty_channel_when_validate_then_error() {
    // Given
    let _temp = setup_config_dir();
    let _channel = EnvGuard::set("GP_FEED_CHANNEL", "");

    // When
    let config = Config::load().unwrap();
    let result = config.validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
#[serial]
fn given_jitter_above_max_when_validate_then_error() {
    // Given
    let _temp = setup_config_dir();
    let _jitter = EnvGuard::set("GP_FEED_JITTER", "1.5");

    // When
    let config = Config::load().unwrap();
    let result = config.validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
#[serial]
fn given_backoff_cap_below_base_when_validate_then_error() {
    // Given
    let _temp = setup_config_dir();
    let _base = EnvGuard::set("GP_FEED_BACKOFF_BASE_MS", "5000");
    let _cap = EnvGuard::set("GP_FEED_BACKOFF_MAX_SECS", "2");

    // When
    let config = Config::load().unwrap();
    let result = config.validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
#[serial]
fn given_custom_channel_when_validate_then_ok() {
    // Given
    let _temp = setup_config_dir();
    let _channel = EnvGuard::set("GP_FEED_CHANNEL", "node_events");

    // When
    let config = Config::load().unwrap();
    let result = config.validate();

    // Then
    assert_that!(result, ok(anything()));
}
