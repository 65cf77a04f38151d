use crate::error::{QueryError, Result};
use crate::types::{Extract, JobId, RefId};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// start an extraction
    Request,
    /// poll an extraction
    Status,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Request => "request",
            Action::Status => "status",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One query as it arrives from the dashboard, keyed by its ref id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataQuery {
    pub ref_id: RefId,
    pub json: Vec<u8>,
}

/// The JSON body of a query.
///
/// Field names are matched without regard to case, so `JobId`, `jobId` and `JOBID` all fill
/// `job_id`. A `null` counts as a missing field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryModel {
    #[serde(default, deserialize_with = "null_as_default")]
    pub action: String,
    #[serde(rename = "JobId", default, deserialize_with = "null_as_default")]
    pub job_id: JobId,
    /// only for action=request
    #[serde(rename = "Extract", default, skip_serializing_if = "Option::is_none")]
    pub extract: Option<Extract>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// spelling of each field on the wire, keyed by its lowercase form
fn canonical_key(key: String) -> String {
    match key.to_ascii_lowercase().as_str() {
        "action" => "action".to_string(),
        "jobid" => "JobId".to_string(),
        "extract" => "Extract".to_string(),
        _ => key,
    }
}

impl QueryModel {
    pub fn request(job_id: impl Into<JobId>, extract: Extract) -> Self {
        Self {
            action: Action::Request.to_string(),
            job_id: job_id.into(),
            extract: Some(extract),
        }
    }

    pub fn status(job_id: impl Into<JobId>) -> Self {
        Self {
            action: Action::Status.to_string(),
            job_id: job_id.into(),
            extract: None,
        }
    }

    pub fn from_json(json: &[u8]) -> Result<Self> {
        let value = match serde_json::from_slice::<Value>(json).map_err(QueryError::Json)? {
            Value::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(key, value)| (canonical_key(key), value))
                    .collect(),
            ),
            // a bare null decodes to an empty query
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        serde_json::from_value(value).map_err(QueryError::Json)
    }

    pub fn to_json(&self) -> Vec<u8> {
        // a struct of strings and integer lists always serializes
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn action(&self) -> Result<Action> {
        match self.action.as_str() {
            "request" => Ok(Action::Request),
            "status" => Ok(Action::Status),
            other => Err(QueryError::UnknownAction(other.to_string())),
        }
    }
}

/// Input handed to the extraction state machine.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepFunctionInput<'a> {
    pub job_id: &'a str,
    pub bucket: &'a str,
    pub extract: &'a Extract,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_request_query() {
        let query = QueryModel::from_json(
            br#"{"action": "request", "JobId": "test-job-123", "Extract": {"file1.pcap": [1, 2, 3]}}"#,
        )
        .unwrap();
        assert!(matches!(query.action(), Ok(Action::Request)));
        assert_eq!(query.job_id, "test-job-123");
        assert_eq!(query.extract.unwrap()["file1.pcap"], vec![1, 2, 3]);
    }

    #[test]
    fn missing_fields_default() {
        let query = QueryModel::from_json(br#"{"action": "status", "Extract": null}"#).unwrap();
        assert_eq!(query.job_id, "");
        assert_eq!(query.extract, None);
        assert!(matches!(query.action(), Ok(Action::Status)));
    }

    #[test]
    fn field_names_ignore_case() {
        let query = QueryModel::from_json(
            br#"{"Action": "request", "jobId": "job-1", "extract": {"a.pcap": [1]}}"#,
        )
        .unwrap();
        assert_eq!(
            query,
            QueryModel::request("job-1", Extract::from([("a.pcap".to_string(), vec![1])]))
        );

        let query = QueryModel::from_json(br#"{"ACTION": "status", "JOBID": "job-1"}"#).unwrap();
        assert_eq!(query, QueryModel::status("job-1"));
    }

    #[test]
    fn null_fields_are_empty() {
        let query = QueryModel::from_json(br#"{"action": "status", "JobId": null}"#).unwrap();
        assert_eq!(query.job_id, "");

        let query = QueryModel::from_json(b"null").unwrap();
        assert_eq!(query, QueryModel::default());
    }

    #[test]
    fn wrong_field_type_is_rejected() {
        let err = QueryModel::from_json(br#"{"action": "status", "jobId": 7}"#).unwrap_err();
        assert!(err.to_string().starts_with("json unmarshal"));
        assert!(QueryModel::from_json(b"[]").is_err());
    }

    #[test]
    fn unknown_action() {
        let query = QueryModel::from_json(br#"{"action": "unknown"}"#).unwrap();
        let err = query.action().unwrap_err();
        assert_eq!(err.to_string(), "unknown action: 'unknown'");
    }

    #[test]
    fn invalid_json() {
        let err = QueryModel::from_json(b"invalid json").unwrap_err();
        assert!(err.to_string().starts_with("json unmarshal"));
    }

    #[test]
    fn serializes_with_dashboard_field_names() {
        let json = QueryModel::status("job-1").to_json();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value, serde_json::json!({"action": "status", "JobId": "job-1"}));
    }

    #[test]
    fn step_function_input_shape() {
        let extract = Extract::from([("file1.pcap".to_string(), vec![1, 2, 3])]);
        let input = StepFunctionInput {
            job_id: "test-job-123",
            bucket: "test-bucket",
            extract: &extract,
        };
        assert_eq!(
            serde_json::to_string(&input).unwrap(),
            r#"{"jobId":"test-job-123","bucket":"test-bucket","extract":{"file1.pcap":[1,2,3]}}"#
        );
    }
}
