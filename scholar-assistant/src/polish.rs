//! Template-driven text polishing.
//!
//! Polishing is a single generation call: the prompt is built from a
//! [`PolishStyle`] template (or from caller-supplied requirements for
//! [`PolishStyle::Custom`]), followed by the text and a length directive. No
//! retrieval and no conversation memory are involved.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use scholar_model::{GenerateConfig, Llm, LlmRequest};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::error::{AssistantError, Result};
use crate::generation::generate;

/// Maximum number of custom requirements accepted for [`PolishStyle::Custom`].
pub const MAX_CUSTOM_REQUIREMENTS: usize = 5;

/// Default length limit for polished text, in characters.
pub const DEFAULT_MAX_LENGTH: u32 = 1000;

/// Ready-made requirement labels offered for custom polishing.
pub const PRESET_REQUIREMENTS: &[&str] = &[
    "提高学术性",
    "增加专业术语",
    "简化表达",
    "改善语法",
    "增加连贯性",
    "调整语气",
    "添加过渡句",
    "优化段落结构",
    "强调创新点",
];

const ACADEMIC_REQUIREMENTS: &[&str] = &[
    "提升学术性表达",
    "确保专业术语使用准确",
    "保持学术写作风格",
    "改善句子结构使其更符合学术论文标准",
    "保持原意的同时提升表达的专业性",
];

const GRAMMAR_REQUIREMENTS: &[&str] =
    &["纠正语法错误", "改善句子结构", "确保时态一致性", "优化标点符号使用", "保持原意不变"];

const LIGHT_REQUIREMENTS: &[&str] =
    &["改善表达流畅度", "优化用词", "提升可读性", "保持语言简洁", "不改变原始含义"];

/// How the text should be rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolishStyle {
    /// Academic register, precise terminology (学术润色).
    Academic,
    /// Grammar, tense and punctuation fixes (语法修改).
    Grammar,
    /// Light fluency and readability pass (简单润色).
    Light,
    /// Caller-supplied requirements (自定义润色).
    Custom,
}

impl PolishStyle {
    /// Every style, in menu order.
    pub const ALL: [PolishStyle; 4] = [Self::Academic, Self::Grammar, Self::Light, Self::Custom];

    /// English label accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Self::Academic => "academic",
            Self::Grammar => "grammar",
            Self::Light => "light",
            Self::Custom => "custom",
        }
    }

    /// Chinese label accepted by [`FromStr`].
    pub fn label(self) -> &'static str {
        match self {
            Self::Academic => "学术润色",
            Self::Grammar => "语法修改",
            Self::Light => "简单润色",
            Self::Custom => "自定义润色",
        }
    }

    fn preamble(self) -> &'static str {
        match self {
            Self::Academic => "请作为一位资深学术论文编辑，对以下文本进行学术性润色。要求：",
            Self::Grammar => "请对以下文本进行语法优化和改进。要求：",
            Self::Light => "请对以下文本进行基础润色。要求：",
            Self::Custom => "请对以下文本进行润色，要求：",
        }
    }

    fn template_requirements(self) -> &'static [&'static str] {
        match self {
            Self::Academic => ACADEMIC_REQUIREMENTS,
            Self::Grammar => GRAMMAR_REQUIREMENTS,
            Self::Light => LIGHT_REQUIREMENTS,
            Self::Custom => &[],
        }
    }
}

impl fmt::Display for PolishStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PolishStyle {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|style| style.name().eq_ignore_ascii_case(s) || style.label() == s)
            .ok_or_else(|| AssistantError::UnknownStyle(s.to_string()))
    }
}

/// Language the model should answer in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputLanguage {
    /// 中文.
    #[default]
    Chinese,
    /// 英文.
    English,
    /// 中英对照: Chinese first, then English.
    Bilingual,
}

impl OutputLanguage {
    /// The directive appended as the last numbered requirement.
    pub fn directive(self) -> &'static str {
        match self {
            Self::Chinese => "请用中文回复。",
            Self::English => "Please respond in English.",
            Self::Bilingual => "请同时用中文和英文回复，先中文后英文。",
        }
    }
}

impl FromStr for OutputLanguage {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chinese" | "zh" | "中文" => Ok(Self::Chinese),
            "english" | "en" | "英文" => Ok(Self::English),
            "bilingual" | "zh-en" | "中英对照" => Ok(Self::Bilingual),
            other => Err(AssistantError::InvalidConfig(format!("unknown output language '{other}'"))),
        }
    }
}

/// Options shared by every polishing style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolishOptions {
    /// Upper bound on the polished text length; also caps generated tokens.
    pub max_length: u32,
    /// Language of the reply.
    #[serde(default)]
    pub output_language: OutputLanguage,
    /// Ordered requirements, used only by [`PolishStyle::Custom`].
    #[serde(default)]
    pub custom_requirements: Vec<String>,
}

impl Default for PolishOptions {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            output_language: OutputLanguage::default(),
            custom_requirements: Vec::new(),
        }
    }
}

impl PolishOptions {
    /// Set the length limit.
    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = max_length;
        self
    }

    /// Set the reply language.
    pub fn with_language(mut self, language: OutputLanguage) -> Self {
        self.output_language = language;
        self
    }

    /// Append a custom requirement.
    pub fn with_requirement(mut self, requirement: impl Into<String>) -> Self {
        self.custom_requirements.push(requirement.into());
        self
    }
}

/// Assemble the polishing prompt for `text`.
///
/// The requirement list is numbered from 1, the language directive is always
/// the last numbered item, and the length directive follows the text.
///
/// # Errors
///
/// - [`AssistantError::UnknownStyle`] for [`PolishStyle::Custom`] without requirements.
/// - [`AssistantError::InvalidConfig`] for blank text, a zero `max_length`,
///   more than [`MAX_CUSTOM_REQUIREMENTS`] requirements or a blank requirement.
///
/// # Example
///
/// ```rust
/// use scholar_assistant::{PolishOptions, PolishStyle, build_polish_prompt};
///
/// let options = PolishOptions::default()
///     .with_max_length(500)
///     .with_requirement("提高学术性")
///     .with_requirement("改善语法");
/// let prompt = build_polish_prompt("原文", PolishStyle::Custom, &options).unwrap();
/// assert!(prompt.contains("1. 提高学术性\n2. 改善语法\n3. 请用中文回复。"));
/// assert!(prompt.ends_with("请确保润色后的文本不超过500字。"));
/// ```
pub fn build_polish_prompt(text: &str, style: PolishStyle, options: &PolishOptions) -> Result<String> {
    if text.trim().is_empty() {
        return Err(AssistantError::InvalidConfig("text to polish must not be empty".to_string()));
    }
    if options.max_length == 0 {
        return Err(AssistantError::InvalidConfig("max_length must be greater than zero".to_string()));
    }

    let requirements: Vec<&str> = match style {
        PolishStyle::Custom => {
            let custom = &options.custom_requirements;
            if custom.is_empty() {
                return Err(AssistantError::UnknownStyle(
                    "custom style requires at least one requirement".to_string(),
                ));
            }
            if custom.len() > MAX_CUSTOM_REQUIREMENTS {
                return Err(AssistantError::InvalidConfig(format!(
                    "at most {MAX_CUSTOM_REQUIREMENTS} custom requirements are allowed, got {}",
                    custom.len()
                )));
            }
            if custom.iter().any(|r| r.trim().is_empty()) {
                return Err(AssistantError::InvalidConfig("custom requirements must not be blank".to_string()));
            }
            custom.iter().map(|r| r.trim()).collect()
        }
        preset => preset.template_requirements().to_vec(),
    };

    let mut prompt = String::from(style.preamble());
    prompt.push('\n');
    for (i, requirement) in requirements.iter().enumerate() {
        prompt.push_str(&format!("{}. {requirement}\n", i + 1));
    }
    prompt.push_str(&format!("{}. {}\n\n文本内容：", requirements.len() + 1, options.output_language.directive()));
    prompt.push_str(text);
    prompt.push_str(&format!("\n\n请确保润色后的文本不超过{}字。", options.max_length));
    Ok(prompt)
}

/// Sends polishing prompts to a language model.
///
/// ```rust,ignore
/// let polisher = PolishOrchestrator::new(Arc::new(model)).with_temperature(0.7);
/// let polished = polisher
///     .polish(abstract_text, PolishStyle::Academic, &PolishOptions::default())
///     .await?;
/// ```
pub struct PolishOrchestrator {
    llm: Arc<dyn Llm>,
    temperature: f32,
    timeout: Option<Duration>,
}

impl fmt::Debug for PolishOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolishOrchestrator")
            .field("model", &self.llm.name())
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl PolishOrchestrator {
    /// Create an orchestrator with the default temperature and no timeout.
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm, temperature: crate::qa::DEFAULT_TEMPERATURE, timeout: None }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Fail generation calls that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Polish `text` and return the raw model output.
    ///
    /// # Errors
    ///
    /// See [`build_polish_prompt`]; generation errors and timeouts surface as
    /// [`AssistantError::GenerationFailure`].
    #[instrument(skip_all, fields(style = %style, model = self.llm.name()))]
    pub async fn polish(&self, text: &str, style: PolishStyle, options: &PolishOptions) -> Result<String> {
        let prompt = build_polish_prompt(text, style, options)?;

        let config = GenerateConfig {
            temperature: Some(self.temperature),
            max_output_tokens: Some(options.max_length),
        };
        config.validate().map_err(|e| AssistantError::InvalidConfig(e.to_string()))?;

        let request = LlmRequest::new(prompt).with_config(config);
        let response = generate(self.llm.as_ref(), request, self.timeout).await.inspect_err(|e| {
            error!(error = %e, "polishing failed");
        })?;

        info!(
            input_len = text.chars().count(),
            output_len = response.text.chars().count(),
            language = ?options.output_language,
            "polished text"
        );
        Ok(response.text)
    }
}
