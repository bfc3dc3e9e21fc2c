//! Failure taxonomy for a routed question

use crate::types::Source;

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// Routing generation call failed; no branch can be chosen
    #[error("Error classifying question: {0:#}")]
    ClassificationFailure(anyhow::Error),

    /// A knowledge-source call failed or returned a malformed payload.
    /// The display text doubles as the degraded in-band answer.
    #[error("Error calling {endpoint} endpoint: {reason:#}")]
    DownstreamUnavailable {
        endpoint: Source,
        reason: anyhow::Error,
    },

    /// Fusion generation failed or produced nothing usable
    #[error("Error processing combined query: {0:#}")]
    FusionFailure(anyhow::Error),
}

impl RouteError {
    pub fn downstream(endpoint: Source, reason: anyhow::Error) -> Self {
        RouteError::DownstreamUnavailable { endpoint, reason }
    }
}
