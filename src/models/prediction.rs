//! Prediction request/response model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::{AppError, AppResult};

/// Body of `POST /predict`
#[derive(Debug, Deserialize, Validate)]
pub struct PredictRequest {
    #[serde(rename = "contractData")]
    #[validate(required(message = "The field 'contractData' is required"))]
    pub contract_data: Option<Map<String, Value>>,

    #[serde(rename = "sinistreData")]
    #[validate(required(message = "The field 'sinistreData' is required"))]
    pub sinistre_data: Option<Map<String, Value>>,

    #[serde(default)]
    pub metadata: Option<RequestMetadata>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RequestMetadata {
    #[serde(rename = "requestId", default)]
    pub request_id: Option<Value>,
}

impl PredictRequest {
    /// Parse and validate a raw body
    pub fn from_body(body: &[u8]) -> AppResult<Self> {
        let no_data = || AppError::ValidationError("No data provided".to_string());

        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(no_data());
        }

        let value: Value = serde_json::from_slice(body)
            .map_err(|e| AppError::ValidationError(format!("Malformed JSON body: {}", e)))?;

        match &value {
            Value::Null => return Err(no_data()),
            Value::Object(map) if map.is_empty() => return Err(no_data()),
            Value::Object(_) => {}
            _ => {
                return Err(AppError::ValidationError(
                    "Request body must be a JSON object".to_string(),
                ))
            }
        }

        let request: PredictRequest = serde_json::from_value(value)
            .map_err(|e| AppError::ValidationError(format!("Invalid request body: {}", e)))?;
        request.validate()?;

        Ok(request)
    }

    /// Client-supplied request id, if any
    pub fn request_id(&self) -> Option<String> {
        match self.metadata.as_ref()?.request_id.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictResponse {
    pub prediction: PredictionBody,
    pub model: ModelInfo,
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionBody {
    pub is_fraud: bool,
    pub confidence: f64,
    pub anomaly_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub version: String,
    pub algorithm: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub request_id: String,
    pub processing_time_ms: u64,
    pub timestamp: String,
    pub service: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation_message(result: AppResult<PredictRequest>) -> String {
        match result {
            Err(AppError::ValidationError(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_empty_bodies_have_no_data() {
        for body in ["", "  ", "null", "{}"] {
            assert_eq!(validation_message(PredictRequest::from_body(body.as_bytes())), "No data provided");
        }
    }

    #[test]
    fn test_missing_contract_data_reported_first() {
        let msg = validation_message(PredictRequest::from_body(br#"{"other": 1}"#));
        assert_eq!(msg, "The field 'contractData' is required");
    }

    #[test]
    fn test_missing_sinistre_data() {
        let msg = validation_message(PredictRequest::from_body(br#"{"contractData": {}}"#));
        assert_eq!(msg, "The field 'sinistreData' is required");
    }

    #[test]
    fn test_wrong_shapes_are_validation_errors() {
        assert!(PredictRequest::from_body(b"[1, 2]").is_err());
        assert!(PredictRequest::from_body(b"{not json").is_err());
        assert!(PredictRequest::from_body(br#"{"contractData": 5, "sinistreData": {}}"#).is_err());
    }

    #[test]
    fn test_request_id_from_metadata() {
        let req = PredictRequest::from_body(
            br#"{"contractData": {}, "sinistreData": {}, "metadata": {"requestId": "abc-1"}}"#,
        )
        .unwrap();
        assert_eq!(req.request_id().as_deref(), Some("abc-1"));

        let numeric = PredictRequest::from_body(
            br#"{"contractData": {}, "sinistreData": {}, "metadata": {"requestId": 42}}"#,
        )
        .unwrap();
        assert_eq!(numeric.request_id().as_deref(), Some("42"));

        let bare = PredictRequest::from_body(br#"{"contractData": {}, "sinistreData": {}}"#).unwrap();
        assert_eq!(bare.request_id(), None);
    }

    #[test]
    fn test_response_field_names() {
        let response = PredictResponse {
            prediction: PredictionBody { is_fraud: true, confidence: 0.9, anomaly_score: -0.1 },
            model: ModelInfo {
                version: "1.1.0".into(),
                algorithm: "IsolationForest".into(),
                kind: "real".into(),
            },
            metadata: ResponseMetadata {
                request_id: "r".into(),
                processing_time_ms: 3,
                timestamp: "t".into(),
                service: "s".into(),
            },
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["prediction"]["isFraud"], true);
        assert_eq!(json["prediction"]["anomalyScore"], -0.1);
        assert_eq!(json["model"]["type"], "real");
        assert_eq!(json["metadata"]["requestId"], "r");
        assert_eq!(json["metadata"]["processingTimeMs"], 3);
    }
}
