// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use autodiscover::logger::LogLevel;
use autodiscover::settings::AutodiscoverSettings;
use autodiscover::Error;
use tracing::level_filters::LevelFilter;

// Installs the process-wide subscriber, so it lives alone in this binary.
#[test]
fn test_init_logging_applies_configured_level() {
    let settings = AutodiscoverSettings {
        log_level: LogLevel::Debug,
        ..AutodiscoverSettings::default()
    };

    settings.init_logging().expect("first init should succeed");
    assert_eq!(LevelFilter::current(), LevelFilter::DEBUG);

    assert!(matches!(settings.init_logging(), Err(Error::Settings(_))));
}
