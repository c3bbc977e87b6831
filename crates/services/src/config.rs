//! Environment-driven configuration for the quiz client.

use std::env;
use std::time::Duration;

use quiz_core::model::PassThreshold;
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Where the quiz backend lives and how long to wait for it.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl ApiConfig {
    /// # Errors
    ///
    /// Returns `ConfigError` if `raw` is not an absolute http(s) url.
    pub fn new(raw: &str, timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("QUIZ_API_BASE_URL", raw)?,
            timeout,
        })
    }
}

/// Caller identity passed explicitly to the api client.
#[derive(Clone, Default)]
pub struct UserContext {
    access_token: Option<String>,
}

impl UserContext {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Blank tokens are treated as anonymous.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        let token: String = token.into();
        let token = token.trim();
        Self {
            access_token: (!token.is_empty()).then(|| token.to_owned()),
        }
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }
}

impl std::fmt::Debug for UserContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserContext")
            .field("authenticated", &self.access_token.is_some())
            .finish()
    }
}

/// Behavior knobs for `QuizSession`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub pass_threshold: PassThreshold,
    /// Block `advance()` until the current question has an answer.
    pub require_answer_to_advance: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pass_threshold: PassThreshold::default(),
            require_answer_to_advance: true,
        }
    }
}

/// Everything the binary needs to wire up a session.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub user: UserContext,
    pub session: SessionConfig,
}

impl ClientConfig {
    /// Reads `QUIZ_*` variables from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for any variable that is set but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for any variable that is set but malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let base_url = get("QUIZ_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        let timeout_secs = match get("QUIZ_API_TIMEOUT_SECS") {
            Some(raw) => parse_positive("QUIZ_API_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let api = ApiConfig::new(&base_url, Duration::from_secs(timeout_secs))?;

        let user = get("QUIZ_API_TOKEN").map_or_else(UserContext::anonymous, UserContext::with_token);

        let mut session = SessionConfig::default();
        if let Some(raw) = get("QUIZ_PASS_THRESHOLD") {
            let percent = raw
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidNumber {
                    var: "QUIZ_PASS_THRESHOLD",
                    raw: raw.clone(),
                })?;
            session.pass_threshold = PassThreshold::new(percent)?;
        }
        if let Some(raw) = get("QUIZ_REQUIRE_ANSWER_TO_ADVANCE") {
            session.require_answer_to_advance =
                parse_bool("QUIZ_REQUIRE_ANSWER_TO_ADVANCE", &raw)?;
        }

        Ok(Self { api, user, session })
    }
}

/// Parses a base url, forcing a trailing slash so relative joins keep the path.
fn parse_base_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_owned()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash).map_err(|source| ConfigError::InvalidUrl {
        var,
        raw: raw.to_owned(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme {
            var,
            scheme: other.to_owned(),
        }),
    }
}

fn parse_positive(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|value| *value > 0)
        .ok_or_else(|| ConfigError::InvalidNumber {
            var,
            raw: raw.to_owned(),
        })
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var,
            raw: raw.to_owned(),
        }),
    }
}
