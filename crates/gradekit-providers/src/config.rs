//! Judge configuration and factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use gradekit_core::backend::{BackendSelector, EvaluationMode};
use gradekit_core::enhanced::{EnhancedEvaluator, JudgeSettings};
use gradekit_core::traits::SemanticJudge;

use crate::anthropic::AnthropicJudge;
use crate::openai::OpenAiJudge;

/// Configuration for a single semantic judge.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JudgeConfig {
    Anthropic {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        /// Overrides the top-level `default_model` for this judge.
        #[serde(default)]
        model: Option<String>,
    },
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
        #[serde(default)]
        model: Option<String>,
    },
}

impl JudgeConfig {
    /// The per-judge model override, if any.
    pub fn model(&self) -> Option<&str> {
        match self {
            JudgeConfig::Anthropic { model, .. } | JudgeConfig::OpenAI { model, .. } => {
                model.as_deref()
            }
        }
    }
}

impl std::fmt::Debug for JudgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JudgeConfig::Anthropic {
                api_key: _,
                base_url,
                model,
            } => f
                .debug_struct("Anthropic")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("model", model)
                .finish(),
            JudgeConfig::OpenAI {
                api_key: _,
                base_url,
                org_id,
                model,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("org_id", org_id)
                .field("model", model)
                .finish(),
        }
    }
}

/// Top-level gradekit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradekitConfig {
    /// Judge configurations keyed by name.
    #[serde(default)]
    pub judges: HashMap<String, JudgeConfig>,
    /// Evaluation mode used when none is requested ("standard" or "enhanced").
    #[serde(default = "default_mode")]
    pub default_mode: String,
    /// Judge used by the enhanced backend.
    #[serde(default = "default_judge")]
    pub default_judge: String,
    /// Model passed to the judge unless the judge or the caller overrides it.
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Upper bound on a single judge call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Maximum judge calls in flight for one submission.
    #[serde(default = "default_judge_concurrency")]
    pub judge_concurrency: usize,
    /// Maximum submissions graded at once in a batch.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Output directory for results.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_mode() -> String {
    "standard".to_string()
}
fn default_judge() -> String {
    "anthropic".to_string()
}
fn default_model() -> String {
    "claude-haiku-4-5-20251001".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_judge_concurrency() -> usize {
    4
}
fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./gradekit-results")
}

impl Default for GradekitConfig {
    fn default() -> Self {
        Self {
            judges: HashMap::new(),
            default_mode: default_mode(),
            default_judge: default_judge(),
            default_model: default_model(),
            timeout_secs: default_timeout_secs(),
            judge_concurrency: default_judge_concurrency(),
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
        }
    }
}

impl GradekitConfig {
    /// The configured default mode. Unrecognized values mean standard.
    pub fn mode(&self) -> EvaluationMode {
        EvaluationMode::parse_lenient(&self.default_mode)
    }

    /// Judge call settings for `judge`, with an optional model override.
    pub fn judge_settings(
        &self,
        judge: Option<&JudgeConfig>,
        model: Option<&str>,
    ) -> JudgeSettings {
        let model = model
            .or_else(|| judge.and_then(JudgeConfig::model))
            .unwrap_or(&self.default_model);
        JudgeSettings {
            model: model.to_string(),
            timeout: Duration::from_secs(self.timeout_secs),
            concurrency: self.judge_concurrency.max(1),
            ..JudgeSettings::default()
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

fn resolve_judge_config(config: &JudgeConfig) -> JudgeConfig {
    let resolve = |v: &Option<String>| v.as_deref().map(resolve_env_vars);
    match config {
        JudgeConfig::Anthropic {
            api_key,
            base_url,
            model,
        } => JudgeConfig::Anthropic {
            api_key: resolve_env_vars(api_key),
            base_url: resolve(base_url),
            model: model.clone(),
        },
        JudgeConfig::OpenAI {
            api_key,
            base_url,
            org_id,
            model,
        } => JudgeConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: resolve(base_url),
            org_id: resolve(org_id),
            model: model.clone(),
        },
    }
}

/// Apply `GRADEKIT_ANTHROPIC_KEY` / `GRADEKIT_OPENAI_KEY` overrides, creating
/// the judge entry if the config file did not have one.
fn apply_key_overrides(config: &mut GradekitConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(key) = lookup("GRADEKIT_ANTHROPIC_KEY") {
        let entry = config
            .judges
            .entry("anthropic".into())
            .or_insert(JudgeConfig::Anthropic {
                api_key: String::new(),
                base_url: None,
                model: None,
            });
        if let JudgeConfig::Anthropic { api_key, .. } = entry {
            *api_key = key;
        }
    }

    if let Some(key) = lookup("GRADEKIT_OPENAI_KEY") {
        let entry = config
            .judges
            .entry("openai".into())
            .or_insert(JudgeConfig::OpenAI {
                api_key: String::new(),
                base_url: None,
                org_id: None,
                model: None,
            });
        if let JudgeConfig::OpenAI { api_key, .. } = entry {
            *api_key = key;
        }
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `gradekit.toml` in the current directory
/// 2. `~/.config/gradekit/config.toml`
///
/// Environment variable overrides: `GRADEKIT_ANTHROPIC_KEY`, `GRADEKIT_OPENAI_KEY`.
pub fn load_config() -> Result<GradekitConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<GradekitConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("gradekit.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<GradekitConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => GradekitConfig::default(),
    };

    apply_key_overrides(&mut config, |name| std::env::var(name).ok());

    config.judges = config
        .judges
        .iter()
        .map(|(k, v)| (k.clone(), resolve_judge_config(v)))
        .collect();

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("gradekit"))
}

/// Create a judge instance from its configuration.
pub fn create_judge(config: &JudgeConfig, timeout: Duration) -> Arc<dyn SemanticJudge> {
    match config {
        JudgeConfig::Anthropic {
            api_key, base_url, ..
        } => Arc::new(AnthropicJudge::with_timeout(
            api_key,
            base_url.clone(),
            timeout,
        )),
        JudgeConfig::OpenAI {
            api_key,
            base_url,
            org_id,
            ..
        } => Arc::new(OpenAiJudge::with_timeout(
            api_key,
            base_url.clone(),
            org_id.clone(),
            timeout,
        )),
    }
}

/// Build a backend selector from configuration.
///
/// `judge` names an entry in `judges` (default: `default_judge`). When that
/// entry does not exist the selector has no enhanced backend, so enhanced
/// requests fall back to standard.
pub fn build_selector(
    config: &GradekitConfig,
    judge: Option<&str>,
    model: Option<&str>,
) -> BackendSelector {
    let name = judge.unwrap_or(&config.default_judge);
    let Some(judge_config) = config.judges.get(name) else {
        tracing::info!("no judge named '{name}' configured; enhanced requests will fall back");
        return BackendSelector::new();
    };

    let settings = config.judge_settings(Some(judge_config), model);
    let judge = create_judge(judge_config, settings.timeout);
    tracing::debug!(judge = name, model = %settings.model, "enhanced backend configured");
    BackendSelector::with_enhanced(EnhancedEvaluator::new(judge, settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_GRADEKIT_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_GRADEKIT_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_GRADEKIT_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${_GRADEKIT_UNSET_VAR}"), "");
        assert_eq!(resolve_env_vars("unclosed ${oops"), "unclosed ${oops");
        std::env::remove_var("_GRADEKIT_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = GradekitConfig::default();
        assert_eq!(config.default_judge, "anthropic");
        assert_eq!(config.mode(), EvaluationMode::Standard);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.parallelism, 4);
        assert_eq!(config.output_dir, PathBuf::from("./gradekit-results"));
    }

    #[test]
    fn parse_judge_config() {
        let toml_str = r#"
default_mode = "enhanced"
default_judge = "openai"
timeout_secs = 10

[judges.anthropic]
type = "anthropic"
api_key = "sk-test"

[judges.openai]
type = "openai"
api_key = "sk-openai"
model = "gpt-4.1-mini"
"#;
        let config: GradekitConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.judges.len(), 2);
        assert_eq!(config.mode(), EvaluationMode::Enhanced);
        assert!(matches!(
            config.judges.get("anthropic"),
            Some(JudgeConfig::Anthropic { .. })
        ));

        let openai = config.judges.get("openai");
        let settings = config.judge_settings(openai, None);
        assert_eq!(settings.model, "gpt-4.1-mini");
        assert_eq!(settings.timeout, Duration::from_secs(10));

        let settings = config.judge_settings(openai, Some("gpt-4.1"));
        assert_eq!(settings.model, "gpt-4.1");
    }

    #[test]
    fn debug_masks_api_keys() {
        let config = JudgeConfig::Anthropic {
            api_key: "sk-secret".into(),
            base_url: None,
            model: None,
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn key_overrides_create_missing_entries() {
        let mut config = GradekitConfig::default();
        apply_key_overrides(&mut config, |name| {
            (name == "GRADEKIT_OPENAI_KEY").then(|| "sk-env".to_string())
        });
        assert!(!config.judges.contains_key("anthropic"));
        assert!(matches!(
            config.judges.get("openai"),
            Some(JudgeConfig::OpenAI { api_key, .. }) if api_key == "sk-env"
        ));
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gradekit.toml");
        std::fs::write(&path, "parallelism = 8\njudge_concurrency = 2\n").unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.parallelism, 8);
        assert_eq!(config.judge_concurrency, 2);

        assert!(load_config_from(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn selector_without_judge_cannot_serve_enhanced() {
        let selector = build_selector(&GradekitConfig::default(), Some("nonexistent"), None);
        assert!(!selector.enhanced_available());
    }

    #[test]
    fn selector_with_empty_key_is_unavailable() {
        let mut config = GradekitConfig::default();
        config.judges.insert(
            "anthropic".into(),
            JudgeConfig::Anthropic {
                api_key: String::new(),
                base_url: None,
                model: None,
            },
        );
        assert!(!build_selector(&config, None, None).enhanced_available());

        config.judges.insert(
            "anthropic".into(),
            JudgeConfig::Anthropic {
                api_key: "sk-test".into(),
                base_url: None,
                model: None,
            },
        );
        assert!(build_selector(&config, None, None).enhanced_available());
    }
}
