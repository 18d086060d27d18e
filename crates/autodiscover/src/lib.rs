// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! # Autodiscover
//!
//! Control plane that keeps the right set of ingestion workers ("runners")
//! alive while the fleet of data sources changes underneath it.
//!
//! ## Overview
//!
//! ```text
//! Provider ──publish──> Bus ──filtered──> Listener ──> Autodiscover worker
//!                                                        │
//!                        Adapter::create_config(event) <─┤
//!                        Config::hash()                <─┤
//!                        MetaStore::store()            <─┤
//!                        Runners::has() / add()        <─┤
//!                        Adapter::create() + start()   <─┘
//! ```
//!
//! - [`bus`]: in-process publish/subscribe with per-listener key filters
//! - [`registry`]: named factories for providers, builders and appenders
//! - [`pipeline`]: builders → appenders → template stage
//! - [`runners`] and [`meta`]: state owned by the controller worker
//! - [`autodiscover`]: the controller tying everything together

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod adapter;
pub mod autodiscover;
pub mod bus;
pub mod config;
pub mod constants;
pub mod errors;
pub mod event;
pub mod logger;
pub mod meta;
pub mod pipeline;
pub mod registry;
pub mod runners;
pub mod settings;

pub use adapter::{Adapter, FactoryAdapter, Provider, Runner, RunnerFactory};
pub use autodiscover::{Autodiscover, OptionalAutodiscover};
pub use bus::{Bus, Listener};
pub use config::{Config, ConfigHash};
pub use errors::{Error, Result};
pub use event::Event;
pub use meta::{MetaCell, MetaStore};
pub use registry::Registry;
pub use runners::Runners;
