//! Configuration loaded from the environment.
//!
//! Binaries load `.env` via `dotenvy` before calling [`CoreConfig::from_env`];
//! the library never touches the filesystem.
//!
//! | Env | Default | Description |
//! |-----|---------|-------------|
//! | GEMA_API_URL | http://127.0.0.1:3001/api | Gateway base URL used by the clients. |
//! | GEMA_BIND_ADDR | 127.0.0.1:3001 | Gateway listen address. |
//! | OPENAI_API_URL | https://api.openai.com/v1 | Upstream API base (OpenAI-compatible). |
//! | OPENAI_API_KEY | (unset) | Bearer key for the upstream API. |
//! | GEMA_CHAT_MODEL | gpt-4o-mini | Model for single-shot voice turns. |
//! | GEMA_STREAM_MODEL | gpt-4.1 | Model for the streaming text agent. |
//! | GEMA_TTS_MODEL | gpt-4o-mini-tts | Speech synthesis model. |
//! | GEMA_UNMASK_ERRORS | false | Surface raw upstream errors on the text stream. |

#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub api_url: String,
    pub bind_addr: String,
    pub openai_api_url: String,
    pub openai_api_key: Option<String>,
    pub chat_model: String,
    pub stream_model: String,
    pub tts_model: String,
    pub unmask_errors: bool,
}

impl CoreConfig {
    /// Load from environment. Unset or invalid values fall back to the
    /// defaults documented in the module header.
    pub fn from_env() -> Self {
        Self {
            api_url: env_or("GEMA_API_URL", "http://127.0.0.1:3001/api"),
            bind_addr: env_or("GEMA_BIND_ADDR", "127.0.0.1:3001"),
            openai_api_url: env_or("OPENAI_API_URL", "https://api.openai.com/v1"),
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            chat_model: env_or("GEMA_CHAT_MODEL", "gpt-4o-mini"),
            stream_model: env_or("GEMA_STREAM_MODEL", "gpt-4.1"),
            tts_model: env_or("GEMA_TTS_MODEL", "gpt-4o-mini-tts"),
            unmask_errors: env_bool("GEMA_UNMASK_ERRORS", false),
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
        Err(_) => default,
    }
}
