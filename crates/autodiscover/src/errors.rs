// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Errors raised while wiring or driving autodiscover
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{kind} name is required")]
    EmptyName { kind: &'static str },

    #[error("{kind} '{name}' is already registered")]
    AlreadyRegistered { kind: &'static str, name: String },

    #[error("{kind} config is missing the `type` field")]
    MissingType { kind: &'static str },

    #[error("unknown autodiscover {kind} '{name}'")]
    UnknownType { kind: &'static str, name: String },

    #[error("hints can only be enabled when no explicit builders are configured")]
    HintsWithBuilders,

    #[error("event does not carry a valid `config` list")]
    MissingConfigs,

    #[error("failed to unpack config: {0}")]
    Unpack(#[from] serde_json::Error),

    #[error("failed to hash config: {0}")]
    Hash(String),

    #[error("autodiscover must be created inside a Tokio runtime")]
    NoRuntime,

    #[error("invalid settings: {0}")]
    Settings(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
