use reqwest::{StatusCode, header};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::MODEL_NAME;
use super::tensor::InputTensor;
use crate::client::InferenceClient;
use crate::error::{PredictError, Result};

/// Attributes of a game whose North American sales are being predicted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionRequest {
    pub platform: String,
    pub year: i64,
    pub genre: String,
    pub publisher: String,
}

impl PredictionRequest {
    pub fn new(
        platform: impl Into<String>,
        year: i64,
        genre: impl Into<String>,
        publisher: impl Into<String>,
    ) -> Self {
        Self {
            platform: platform.into(),
            year,
            genre: genre.into(),
            publisher: publisher.into(),
        }
    }
}

/// Body of `POST /v2/models/{model}/infer`.
///
/// Inputs always go out as Platform, Year, Genre, Publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InferRequest {
    inputs: [InputTensor; 4],
}

impl InferRequest {
    pub(crate) fn from_inputs(inputs: [InputTensor; 4]) -> Self {
        Self { inputs }
    }

    pub fn inputs(&self) -> &[InputTensor] {
        &self.inputs
    }
}

impl From<&PredictionRequest> for InferRequest {
    fn from(req: &PredictionRequest) -> Self {
        Self::from_inputs([
            InputTensor::bytes("Platform", req.platform.as_str()),
            InputTensor::int64("Year", req.year),
            InputTensor::bytes("Genre", req.genre.as_str()),
            InputTensor::bytes("Publisher", req.publisher.as_str()),
        ])
    }
}

#[derive(Debug, Deserialize)]
pub struct InferResponse {
    #[serde(default)]
    pub model_name: Option<String>,
    pub outputs: Vec<OutputTensor>,
}

#[derive(Debug, Deserialize)]
pub struct OutputTensor {
    #[serde(default)]
    pub name: Option<String>,
    pub data: Vec<serde_json::Value>,
}

impl InferResponse {
    /// `outputs[0].data[0]` as a float.
    pub fn first_prediction(&self) -> Result<f64> {
        let output = self.outputs.first().ok_or_else(|| {
            PredictError::MalformedResponse("response has no outputs".to_string())
        })?;

        let value = output.data.first().ok_or_else(|| {
            PredictError::MalformedResponse("first output has no data".to_string())
        })?;

        value.as_f64().ok_or_else(|| {
            PredictError::MalformedResponse(format!(
                "first output element is not a number: {}",
                value
            ))
        })
    }
}

/// Rounds a sales estimate to 3 decimal places.
///
/// Rounds the exact binary value of `value`, with exact ties going to the
/// even digit, so `0.0625` gives `0.062` and `1.0005` (stored just below the
/// tie) gives `1.0`. Values too large to scale by 1000 come back unchanged.
pub fn round_sales(value: f64) -> f64 {
    if !(value * 1000.0).is_finite() {
        return value;
    }
    format!("{:.3}", value).parse().unwrap_or(value)
}

impl InferenceClient {
    /// Predicts North American sales, in millions of units, rounded to 3
    /// decimals.
    ///
    /// Any status other than 200 comes back as [`PredictError::Rejected`]
    /// carrying the server's body. Transport failures are returned as-is;
    /// nothing is retried.
    pub async fn predict(&self, request: &PredictionRequest) -> Result<f64> {
        let response = self.post_infer(&InferRequest::from(request)).await?;
        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            warn!(%status, body = %body, "inference request rejected");
            return Err(PredictError::Rejected { status, body });
        }

        let parsed: InferResponse = serde_json::from_str(&body).map_err(|e| {
            PredictError::MalformedResponse(format!("failed to parse response: {}", e))
        })?;

        let sales = round_sales(parsed.first_prediction()?);
        info!(
            model = parsed.model_name.as_deref().unwrap_or(MODEL_NAME),
            output = parsed.outputs.first().and_then(|o| o.name.as_deref()),
            platform = %request.platform,
            year = request.year,
            sales,
            "prediction received"
        );
        Ok(sales)
    }

    /// Sends one infer request and hands back the raw response.
    pub(crate) async fn post_infer(&self, body: &InferRequest) -> Result<reqwest::Response> {
        let url = self.infer_url();
        debug!(%url, payload = ?body, "posting inference request");

        let response = self
            .http()
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await?;

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::v2::Datatype;

    fn switch_request() -> PredictionRequest {
        PredictionRequest::new("Nintendo Switch", 2021, "Adventure", "Nintendo")
    }

    #[test]
    fn serializes_inputs_in_fixed_order() {
        let body = serde_json::to_string(&InferRequest::from(&switch_request())).unwrap();
        assert_eq!(
            body,
            concat!(
                r#"{"inputs":["#,
                r#"{"name":"Platform","shape":[1],"datatype":"BYTES","data":["Nintendo Switch"]},"#,
                r#"{"name":"Year","shape":[1],"datatype":"INT64","data":[2021]},"#,
                r#"{"name":"Genre","shape":[1],"datatype":"BYTES","data":["Adventure"]},"#,
                r#"{"name":"Publisher","shape":[1],"datatype":"BYTES","data":["Nintendo"]}"#,
                r#"]}"#
            )
        );
    }

    #[test]
    fn serialization_is_deterministic() {
        let first = serde_json::to_vec(&InferRequest::from(&switch_request())).unwrap();
        let second = serde_json::to_vec(&InferRequest::from(&switch_request())).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn only_year_is_int64() {
        let body = InferRequest::from(&switch_request());
        for input in body.inputs() {
            assert!(input.is_well_typed());
            let expected = if input.name() == "Year" {
                Datatype::Int64
            } else {
                Datatype::Bytes
            };
            assert_eq!(input.datatype(), expected, "{}", input.name());
        }
    }

    #[test]
    fn rounds_to_three_decimals() {
        assert_eq!(round_sales(3.14159), 3.142);
        assert_eq!(round_sales(12.0), 12.0);
        assert_eq!(round_sales(0.0004), 0.0);
        assert_eq!(round_sales(-1.23456), -1.235);
    }

    #[test]
    fn rounds_exact_binary_value_with_ties_to_even() {
        let cases = [
            (0.0625, 0.062),
            (0.1875, 0.188),
            (1.0005, 1.0),
            (0.1235, 0.123),
            (2.675, 2.675),
            (-0.0625, -0.062),
            (1e306, 1e306),
            (f64::MAX, f64::MAX),
        ];
        for (value, expected) in cases {
            assert_eq!(round_sales(value), expected, "round_sales({value})");
        }
    }

    #[test]
    fn non_finite_values_pass_through() {
        assert_eq!(round_sales(f64::INFINITY), f64::INFINITY);
        assert_eq!(round_sales(f64::NEG_INFINITY), f64::NEG_INFINITY);
        assert!(round_sales(f64::NAN).is_nan());
    }

    #[test]
    fn rounding_is_idempotent() {
        for value in [3.14159, 0.1, 2.71828, 12.3456, 1e-4, 987.6543] {
            let once = round_sales(value);
            assert_eq!(round_sales(once), once);
        }
    }

    #[test]
    fn first_prediction_ignores_extra_fields() {
        let parsed: InferResponse = serde_json::from_str(
            r#"{"model_name":"video-game-sales-model","id":"abc",
                "outputs":[{"name":"predict","shape":[1],"datatype":"FP64","data":[1.5,2.5]}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.model_name.as_deref(), Some("video-game-sales-model"));
        assert_eq!(parsed.outputs[0].name.as_deref(), Some("predict"));
        assert_eq!(parsed.first_prediction().unwrap(), 1.5);
    }

    #[test]
    fn empty_outputs_is_malformed() {
        let parsed: InferResponse = serde_json::from_str(r#"{"outputs":[]}"#).unwrap();
        assert!(matches!(
            parsed.first_prediction(),
            Err(PredictError::MalformedResponse(_))
        ));
    }

    #[test]
    fn empty_data_is_malformed() {
        let parsed: InferResponse =
            serde_json::from_str(r#"{"outputs":[{"data":[]}]}"#).unwrap();
        let err = parsed.first_prediction().unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed inference response: first output has no data"
        );
    }

    #[test]
    fn non_numeric_data_is_malformed() {
        let parsed: InferResponse =
            serde_json::from_str(r#"{"outputs":[{"data":["lots"]}]}"#).unwrap();
        assert!(matches!(
            parsed.first_prediction(),
            Err(PredictError::MalformedResponse(_))
        ));
    }

    #[test]
    fn missing_outputs_fails_to_parse() {
        assert!(serde_json::from_str::<InferResponse>(r#"{"model_name":"x"}"#).is_err());
    }
}
