// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TourError {
    #[error("Configuration unavailable: {0}")]
    ConfigUnavailable(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Cannot reach the Kubernetes API")]
    Connection(#[source] kube::Error),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rejected by the API server ({code} {reason}): {message}")]
    RemoteRejection {
        code: u16,
        reason: String,
        message: String,
    },

    #[error("Change observer failed: {0}")]
    Observer(String),

    #[error("Step '{step}' failed")]
    Step {
        step: String,
        source: Box<TourError>,
    },

    #[error("Kubernetes API error")]
    Other(#[source] kube::Error),
}

impl TourError {
    pub fn is_already_exists(&self) -> bool {
        matches!(self, TourError::AlreadyExists(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TourError::NotFound(_))
    }

    /// Attach the name of the orchestration step that produced this error
    pub fn in_step(self, step: impl Into<String>) -> Self {
        TourError::Step {
            step: step.into(),
            source: Box::new(self),
        }
    }
}

impl From<kube::Error> for TourError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(resp) if resp.code == 409 && resp.reason == "AlreadyExists" => {
                TourError::AlreadyExists(resp.message)
            }
            kube::Error::Api(resp) if resp.code == 404 => TourError::NotFound(resp.message),
            kube::Error::Api(resp) => TourError::RemoteRejection {
                code: resp.code,
                reason: resp.reason,
                message: resp.message,
            },
            kube::Error::InferConfig(e) => TourError::ConfigUnavailable(e.to_string()),
            e @ (kube::Error::HyperError(_) | kube::Error::Service(_) | kube::Error::Auth(_)) => {
                TourError::Connection(e)
            }
            e => TourError::Other(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, TourError>;
