//! Datasource instance settings.
//!
//! Settings arrive in the shape Grafana stores them for a datasource instance: plain options
//! under `jsonData`, credentials under `secureJsonData`.

use crate::error::SettingsError;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Raw settings of one datasource instance.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSettings {
    #[serde(default)]
    pub json_data: Map<String, Value>,
    #[serde(default)]
    pub secure_json_data: HashMap<String, String>,
}

impl InstanceSettings {
    pub fn from_json(bytes: &[u8]) -> Result<Self, SettingsError> {
        serde_json::from_slice(bytes).map_err(|err| SettingsError::Load(err.to_string()))
    }
}

/// The two settings every query depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSettings {
    #[serde(default)]
    pub step_function_arn: String,
    #[serde(default)]
    pub s3_bucket: String,
}

impl PluginSettings {
    pub fn new(step_function_arn: impl Into<String>, s3_bucket: impl Into<String>) -> Self {
        Self {
            step_function_arn: step_function_arn.into(),
            s3_bucket: s3_bucket.into(),
        }
    }

    pub fn load(instance: &InstanceSettings) -> Result<Self, SettingsError> {
        serde_json::from_value(Value::Object(instance.json_data.clone()))
            .map_err(|err| SettingsError::Load(err.to_string()))
    }

    /// Checks the ARN before the bucket.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.step_function_arn.is_empty() {
            return Err(SettingsError::MissingStepFunctionArn);
        }
        if self.s3_bucket.is_empty() {
            return Err(SettingsError::MissingS3Bucket);
        }
        Ok(())
    }
}

/// How to reach AWS. Unset values fall back to the SDK's default provider chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwsSettings {
    pub region: Option<String>,
    pub profile: Option<String>,
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Role assumed on top of the resolved credentials.
    pub assume_role_arn: Option<String>,
    pub external_id: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct AwsJsonData {
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    profile: Option<String>,
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default)]
    assume_role_arn: Option<String>,
    #[serde(default)]
    external_id: Option<String>,
}

impl AwsSettings {
    pub fn load(instance: &InstanceSettings) -> Result<Self, SettingsError> {
        let json: AwsJsonData = serde_json::from_value(Value::Object(instance.json_data.clone()))
            .map_err(|err| SettingsError::Load(err.to_string()))?;
        let secret = |key: &str| non_empty(instance.secure_json_data.get(key).cloned());
        Ok(Self {
            region: non_empty(json.region),
            profile: non_empty(json.profile),
            endpoint: non_empty(json.endpoint),
            access_key: secret("accessKey"),
            secret_key: secret("secretKey"),
            assume_role_arn: non_empty(json.assume_role_arn),
            external_id: non_empty(json.external_id),
        })
    }

    /// Static keys, only when both halves are configured.
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (&self.access_key, &self.secret_key) {
            (Some(access_key), Some(secret_key)) => Some((access_key.as_str(), secret_key.as_str())),
            _ => None,
        }
    }
}

// grafana stores cleared options as empty strings
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
