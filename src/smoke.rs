//! Manual smoke test for the inference endpoint.
//!
//! Fires a run of well-typed requests followed by a run of requests whose
//! `Year` input declares `INT64` but carries text, and records the status the
//! server answered each one with, stopping at the first request that gets no
//! HTTP answer at all. Nothing is asserted: the point is to eyeball
//! that the server accepts the first kind and rejects the second.

use std::fmt;

use reqwest::StatusCode;
use tracing::{info, warn};

use crate::client::InferenceClient;
use crate::v2::{Datatype, InferRequest, InputTensor, PredictionRequest, TensorValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Valid,
    Invalid,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadKind::Valid => write!(f, "valid"),
            PayloadKind::Invalid => write!(f, "invalid"),
        }
    }
}

/// What came back for one smoke request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmokeReply {
    Status(StatusCode),
    /// The request never got an HTTP answer. Holds the transport error text.
    Failed(String),
}

/// One smoke request. `index` counts from 1 within its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeOutcome {
    pub kind: PayloadKind,
    pub index: usize,
    pub reply: SmokeReply,
}

impl SmokeOutcome {
    pub fn status(&self) -> Option<StatusCode> {
        match &self.reply {
            SmokeReply::Status(status) => Some(*status),
            SmokeReply::Failed(_) => None,
        }
    }
}

impl fmt::Display for SmokeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reply {
            SmokeReply::Status(status) => {
                write!(f, "{} request {}: {}", self.kind, self.index, status)
            }
            SmokeReply::Failed(error) => {
                write!(f, "{} request {}: failed: {}", self.kind, self.index, error)
            }
        }
    }
}

/// Outcomes in the order the requests were sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmokeReport {
    pub outcomes: Vec<SmokeOutcome>,
}

impl SmokeReport {
    /// Statuses of the requests that got an HTTP answer.
    pub fn statuses(&self) -> Vec<u16> {
        self.outcomes
            .iter()
            .filter_map(SmokeOutcome::status)
            .map(|s| s.as_u16())
            .collect()
    }

    /// The transport failure that ended the run early, if any.
    pub fn aborted(&self) -> Option<&SmokeOutcome> {
        self.outcomes
            .last()
            .filter(|o| matches!(o.reply, SmokeReply::Failed(_)))
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Known-good payload.
pub fn valid_payload() -> InferRequest {
    InferRequest::from(&PredictionRequest::new(
        "Nintendo Switch",
        2021,
        "Adventure",
        "Nintendo",
    ))
}

/// Same shape as [`valid_payload`], but `Year` holds a text placeholder while
/// still declaring `INT64`.
pub fn invalid_payload() -> InferRequest {
    InferRequest::from_inputs([
        InputTensor::bytes("Platform", "Nintendo Switch"),
        InputTensor::mislabeled(
            "Year",
            Datatype::Int64,
            TensorValue::Bytes("invalid_year".to_string()),
        ),
        InputTensor::bytes("Genre", "Adventure"),
        InputTensor::bytes("Publisher", "Nintendo"),
    ])
}

/// Sends `valid_count` valid requests, then `invalid_count` invalid ones,
/// one at a time.
///
/// HTTP error statuses are recorded like any other. A transport failure is
/// recorded as the last outcome and ends the run, so the report always holds
/// every status that arrived before it.
pub async fn send_batch(
    client: &InferenceClient,
    valid_count: usize,
    invalid_count: usize,
) -> SmokeReport {
    let mut report = SmokeReport::default();
    let runs = [
        (PayloadKind::Valid, valid_count, valid_payload()),
        (PayloadKind::Invalid, invalid_count, invalid_payload()),
    ];

    for (kind, count, payload) in runs {
        for index in 1..=count {
            let reply = match client.post_infer(&payload).await {
                Ok(response) => SmokeReply::Status(response.status()),
                Err(e) => SmokeReply::Failed(e.to_string()),
            };

            match &reply {
                SmokeReply::Status(status) => info!(%kind, index, %status, "smoke request sent"),
                SmokeReply::Failed(error) => warn!(%kind, index, %error, "smoke request failed"),
            }

            let failed = matches!(reply, SmokeReply::Failed(_));
            report.outcomes.push(SmokeOutcome { kind, index, reply });
            if failed {
                return report;
            }
        }
    }

    report
}
