//! JSON config file (`--config`). Only keys the environment leaves unset are
//! taken from it; see [`super::Settings::layered_over`].

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::strategy::DEFAULT_MIN_SAVINGS_THRESHOLD;

const REQUIRED_SECTIONS: [&str; 2] = ["providers", "optimization"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_name: Option<String>,
    pub providers: ProvidersSection,
    pub optimization: OptimizationSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvidersSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure: Option<AzureSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcp: Option<GcpSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AwsSection {
    pub region: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AzureSection {
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GcpSection {
    pub project_id: Option<String>,
    #[serde(default)]
    pub credentials_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSection {
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default)]
    pub min_savings_threshold: Option<f64>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        anyhow::ensure!(
            ext.as_deref() == Some("json"),
            "unsupported config file format: {} (expected .json)",
            path.display()
        );

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let raw: Value = serde_json::from_str(text).context("config file is not valid JSON")?;
        let errors = validate(&raw);
        if !errors.is_empty() {
            anyhow::bail!("{}", errors.join("; "));
        }
        serde_json::from_value(raw).context("failed to decode config file")
    }

    /// Starting point written by `config init`.
    pub fn template() -> Self {
        Self {
            org_name: Some(String::new()),
            providers: ProvidersSection {
                aws: Some(AwsSection {
                    region: Some("us-east-1".to_string()),
                    profile: Some("default".to_string()),
                }),
                azure: Some(AzureSection {
                    subscription_id: Some(String::new()),
                    tenant_id: Some(String::new()),
                }),
                gcp: Some(GcpSection {
                    project_id: Some(String::new()),
                    credentials_path: Some(String::new()),
                }),
            },
            optimization: OptimizationSection {
                thresholds: Thresholds {
                    min_savings_threshold: Some(DEFAULT_MIN_SAVINGS_THRESHOLD),
                },
                call_timeout_secs: None,
            },
        }
    }

    pub fn template_json() -> anyhow::Result<String> {
        serde_json::to_string_pretty(&Self::template()).context("failed to encode config template")
    }
}

/// Every problem found, so a broken file is reported in one go.
pub fn validate(raw: &Value) -> Vec<String> {
    let mut errors = Vec::new();
    let Some(root) = raw.as_object() else {
        return vec!["config file must be a JSON object".to_string()];
    };

    for section in REQUIRED_SECTIONS {
        match root.get(section) {
            Some(Value::Object(_)) => {}
            Some(_) => errors.push(format!("section {section} must be an object")),
            None => errors.push(format!("missing required section: {section}")),
        }
    }

    if let Some(Value::Object(providers)) = root.get("providers") {
        let key_fields = [
            ("aws", "region"),
            ("azure", "subscription_id"),
            ("gcp", "project_id"),
        ];
        for (provider, field) in key_fields {
            let Some(section) = providers.get(provider) else {
                continue;
            };
            if !section.get(field).is_some_and(Value::is_string) {
                errors.push(format!("{provider} provider missing '{field}' field"));
            }
        }
    }

    if let Some(Value::Object(optimization)) = root.get("optimization") {
        if let Some(v) = optimization
            .get("thresholds")
            .and_then(|t| t.get("min_savings_threshold"))
        {
            if !v.as_f64().is_some_and(|n| n >= 0.0) {
                errors.push("min_savings_threshold must be a non-negative number".to_string());
            }
        }
        if let Some(v) = optimization.get("call_timeout_secs") {
            if !v.is_null() && !v.is_u64() {
                errors.push("call_timeout_secs must be a non-negative integer".to_string());
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn template_is_a_valid_config() {
        let text = ConfigFile::template_json().unwrap();
        let parsed = ConfigFile::parse(&text).unwrap();
        assert_eq!(parsed, ConfigFile::template());
        assert_eq!(
            parsed.optimization.thresholds.min_savings_threshold,
            Some(DEFAULT_MIN_SAVINGS_THRESHOLD)
        );
    }

    #[test]
    fn reports_every_missing_section() {
        assert_eq!(
            validate(&json!({})),
            vec![
                "missing required section: providers",
                "missing required section: optimization",
            ]
        );
        assert_eq!(validate(&json!([])), vec!["config file must be a JSON object"]);
    }

    #[test]
    fn provider_sections_need_their_key_field() {
        let errors = validate(&json!({
            "providers": {
                "aws": {"profile": "default"},
                "azure": {"tenant_id": "t"},
                "gcp": {"project_id": "p"}
            },
            "optimization": {}
        }));
        assert_eq!(
            errors,
            vec![
                "aws provider missing 'region' field",
                "azure provider missing 'subscription_id' field",
            ]
        );
    }

    #[test]
    fn thresholds_must_be_sane() {
        let errors = validate(&json!({
            "providers": {},
            "optimization": {
                "thresholds": {"min_savings_threshold": -1},
                "call_timeout_secs": "soon"
            }
        }));
        assert_eq!(errors.len(), 2);

        let text = json!({
            "providers": {},
            "optimization": {"thresholds": {"min_savings_threshold": "ten"}}
        })
        .to_string();
        let err = ConfigFile::parse(&text).unwrap_err();
        assert!(err.to_string().contains("min_savings_threshold"));
    }

    #[test]
    fn minimal_file_parses() {
        let cfg = ConfigFile::parse(r#"{"providers": {}, "optimization": {}}"#).unwrap();
        assert!(cfg.providers.aws.is_none());
        assert!(cfg.org_name.is_none());
        assert!(cfg.optimization.call_timeout_secs.is_none());
    }

    #[test]
    fn load_rejects_other_formats() {
        let err = ConfigFile::load(Path::new("settings.yaml")).unwrap_err();
        assert!(err.to_string().contains("unsupported config file format"));
    }
}
