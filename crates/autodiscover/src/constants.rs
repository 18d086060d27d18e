// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Well-known event keys and sizing constants.

/// Capacity of each listener queue. A full queue blocks the publisher.
pub const QUEUE_CAPACITY: usize = 100;

/// Marker key of events announcing a new data source.
pub const START_KEY: &str = "start";

/// Marker key of events announcing a data source went away.
pub const STOP_KEY: &str = "stop";

/// Key holding the candidate configuration list of an event.
pub const CONFIG_KEY: &str = "config";

/// Key holding the metadata map attached to runners.
pub const META_KEY: &str = "meta";

/// Discriminator field read by the registry to select a factory.
pub const TYPE_KEY: &str = "type";

/// Builder type installed implicitly when hints mode is enabled.
pub const HINTS_BUILDER: &str = "hints";

/// Appender type of the built-in conditional config appender.
pub const CONFIG_APPENDER: &str = "config";
