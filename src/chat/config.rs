//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved
//! configuration value. Environment variables are read through a lookup
//! function supplied by the caller, so nothing here consults process state.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::client::GroqClient;
use crate::error::{Error, Result};
use crate::inference::{
    DEFAULT_HISTORY_LIMIT, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_SYSTEM_PROMPT,
    DEFAULT_TEMPERATURE, InferenceConfig,
};

/// Default location of the conversation log.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://groqchat.db";

/// Default directory for exports.
pub const DEFAULT_EXPORT_DIR: &str = "exports";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Smallest token limit accepted by the interactive `/tokens` command.
pub const MIN_INTERACTIVE_TOKENS: u32 = 100;

/// Command-line arguments shared by the groqchat tools.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: meta-llama/llama-4-scout-17b-16e-instruct)", "MODEL")]
    pub model: Option<String>,

    /// System prompt to set context for the conversation.
    #[arrrg(optional, "System prompt for the conversation (empty to disable)", "PROMPT")]
    pub system: Option<String>,

    /// Sampling temperature, kept as text until validated.
    #[arrrg(optional, "Sampling temperature between 0 and 1 (default: 0.3)", "TEMP")]
    pub temperature: Option<String>,

    /// Maximum tokens per response.
    #[arrrg(optional, "Max tokens per response (default: 8192)", "TOKENS")]
    pub max_tokens: Option<u32>,

    /// Database URL or path of the conversation log.
    #[arrrg(optional, "Conversation log (default: sqlite://groqchat.db)", "URL")]
    pub database: Option<String>,

    /// Directory exports are written to.
    #[arrrg(optional, "Export directory (default: exports)", "DIR")]
    pub export_dir: Option<String>,

    /// API root of the chat completions endpoint.
    #[arrrg(optional, "API base URL (default: https://api.groq.com/openai/v1/)", "URL")]
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: 60)", "SECS")]
    pub timeout_secs: Option<u64>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Hide token usage after replies.
    #[arrrg(flag, "Do not print token usage after replies")]
    pub no_usage: bool,

    /// Log debug output to stderr.
    #[arrrg(flag, "Enable debug logging")]
    pub verbose: bool,
}

/// Resolved configuration for a chat process.
#[derive(Clone)]
pub struct ChatConfig {
    /// Key for the chat completions endpoint.
    pub api_key: Option<String>,

    /// API root; `None` uses Groq's.
    pub base_url: Option<String>,

    /// Model identifier.
    pub model: String,

    /// System prompt prepended to every request.
    pub system_prompt: Option<String>,

    /// Sampling temperature between 0 and 1.
    pub temperature: f32,

    /// Maximum tokens per response.
    pub max_tokens: u32,

    /// Number of most recent messages sent as context.
    pub history_limit: usize,

    /// Request timeout.
    pub timeout: Duration,

    /// sqlx URL of the conversation log.
    pub database_url: String,

    /// Directory exports are written to.
    pub export_dir: PathBuf,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Whether to print token usage after each reply.
    pub show_usage: bool,

    /// Whether to log at debug level.
    pub verbose: bool,
}

impl std::fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("history_limit", &self.history_limit)
            .field("timeout", &self.timeout)
            .field("database_url", &self.database_url)
            .field("export_dir", &self.export_dir)
            .field("use_color", &self.use_color)
            .field("show_usage", &self.show_usage)
            .finish_non_exhaustive()
    }
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: meta-llama/llama-4-scout-17b-16e-instruct
    /// - Temperature: 0.3
    /// - Max tokens: 8192
    /// - History: 40 messages
    /// - Color and usage display: enabled
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            history_limit: DEFAULT_HISTORY_LIMIT,
            timeout: DEFAULT_TIMEOUT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
            use_color: true,
            show_usage: true,
            verbose: false,
        }
    }

    /// Merges command-line arguments over environment values.
    ///
    /// `lookup` returns the value of an environment variable; pass
    /// `|key| std::env::var(key).ok()` to read the process environment.
    pub fn resolve<F>(args: ChatArgs, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::new();

        config.api_key = env("GROQ_API_KEY");
        config.base_url = args.base_url.or_else(|| env("GROQ_BASE_URL"));
        if let Some(model) = args.model.or_else(|| env("DEFAULT_MODEL")) {
            config.model = model;
        }
        if let Some(system) = args.system {
            config.system_prompt = Some(system).filter(|s| !s.trim().is_empty());
        }
        if let Some(raw) = args.temperature.or_else(|| env("DEFAULT_TEMPERATURE")) {
            config.temperature = validate_temperature(parse_number(&raw, "temperature")?)?;
        }
        let max_tokens = match args.max_tokens {
            Some(max_tokens) => Some(max_tokens),
            None => env("DEFAULT_MAX_TOKENS")
                .map(|raw| parse_number(&raw, "max_tokens"))
                .transpose()?,
        };
        if let Some(max_tokens) = max_tokens {
            config.max_tokens = validate_max_tokens(max_tokens, 1)?;
        }
        let timeout_secs = match args.timeout_secs {
            Some(secs) => Some(secs),
            None => env("GROQCHAT_TIMEOUT_SECS")
                .map(|raw| parse_number(&raw, "timeout_secs"))
                .transpose()?,
        };
        if let Some(secs) = timeout_secs {
            if secs == 0 {
                return Err(Error::validation(
                    "timeout must be at least one second",
                    Some("timeout_secs".to_string()),
                ));
            }
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(database) = args.database.or_else(|| env("GROQCHAT_DATABASE")) {
            config.database_url = database_url(&database);
        }
        if let Some(dir) = args.export_dir.or_else(|| env("GROQCHAT_EXPORT_DIR")) {
            config.export_dir = PathBuf::from(dir);
        }
        if let Some(raw) = env("SHOW_USAGE") {
            config.show_usage = parse_bool(&raw, "SHOW_USAGE")?;
        }
        if args.no_usage {
            config.show_usage = false;
        }
        config.use_color = !args.no_color;
        config.verbose = args.verbose;
        Ok(config)
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets or removes the system prompt.
    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    /// Sets the maximum tokens per response.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the conversation log location.
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    /// Sets the export directory.
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Returns the generation parameters for the inference client.
    pub fn inference_config(&self) -> InferenceConfig {
        InferenceConfig::default()
            .with_model(self.model.clone())
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
            .with_system_prompt(self.system_prompt.clone())
            .with_history_limit(self.history_limit)
    }

    /// Builds the HTTP client, failing if no API key is configured.
    pub fn client(&self) -> Result<GroqClient> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::authentication("GROQ_API_KEY is not set"))?;
        GroqClient::with_options(api_key, self.base_url.clone(), Some(self.timeout))
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks that `temperature` lies in [0, 1].
pub fn validate_temperature(temperature: f32) -> Result<f32> {
    if (0.0..=1.0).contains(&temperature) {
        Ok(temperature)
    } else {
        Err(Error::validation(
            format!("temperature must be between 0 and 1, got {temperature}"),
            Some("temperature".to_string()),
        ))
    }
}

/// Checks that `max_tokens` lies in [`min`, 8192].
pub fn validate_max_tokens(max_tokens: u32, min: u32) -> Result<u32> {
    if (min..=DEFAULT_MAX_TOKENS).contains(&max_tokens) {
        Ok(max_tokens)
    } else {
        Err(Error::validation(
            format!("max tokens must be between {min} and {DEFAULT_MAX_TOKENS}, got {max_tokens}"),
            Some("max_tokens".to_string()),
        ))
    }
}

fn parse_number<T: std::str::FromStr>(raw: &str, param: &str) -> Result<T> {
    raw.trim().parse::<T>().map_err(|_| {
        Error::validation(
            format!("invalid {param}: '{raw}' is not a number"),
            Some(param.to_string()),
        )
    })
}

fn parse_bool(raw: &str, param: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::configuration(format!(
            "{param} must be true or false, got '{raw}'"
        ))),
    }
}

/// Accepts either an sqlx URL or a plain file path.
fn database_url(value: &str) -> String {
    if value.starts_with("sqlite:") {
        value.to_string()
    } else {
        format!("sqlite://{value}")
    }
}
