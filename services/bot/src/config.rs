use pixel_core::content::ContentQuery;
use pixel_core::mixer::VolumeLevels;
use pixel_core::settings::{EngineSettings, MusicSettings, ProcessorSettings, SchedulerSettings};
use pixel_core::speech::VoiceProfile;
use secrecy::SecretString;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Clone, Debug)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
    pub user_agent: String,
    pub username: String,
    pub password: SecretString,
}

#[derive(Clone, Debug)]
pub struct TwitchCredentials {
    pub oauth_token: SecretString,
    pub nickname: String,
    pub channel: String,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub azure_speech_key: SecretString,
    pub azure_speech_region: String,
    pub tts_voice: String,
    pub gemini_api_key: SecretString,
    pub gemini_model: String,
    pub reddit: RedditCredentials,
    pub twitch: TwitchCredentials,
    pub command_prefix: String,
    pub music_folder: PathBuf,
    pub stinger: PathBuf,
    pub subreddit: String,
    pub post_limit: usize,
    pub fetch_interval: Duration,
    pub fetch_warmup: Duration,
    pub music_volume_normal: f32,
    pub music_volume_low: f32,
    pub music_poll: Duration,
    pub music_warmup: Duration,
    pub log_level: Level,
}

fn required(name: &str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(name.to_string())),
    }
}

fn secret(name: &str) -> Result<SecretString, ConfigError> {
    required(name).map(SecretString::from)
}

fn or_default(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parsed<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

fn volume(name: &str, default: f32) -> Result<f32, ConfigError> {
    let value = parsed(name, default)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("{value} is outside 0.0..=1.0"),
        ));
    }
    Ok(value)
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let azure_speech_key = secret("AZURE_SPEECH_KEY")?;
        let azure_speech_region = required("AZURE_SPEECH_REGION")?;
        let gemini_api_key = secret("GEMINI_API_KEY")?;
        let reddit = RedditCredentials {
            client_id: required("REDDIT_CLIENT_ID")?,
            client_secret: secret("REDDIT_CLIENT_SECRET")?,
            user_agent: required("REDDIT_USER_AGENT")?,
            username: required("REDDIT_USERNAME")?,
            password: secret("REDDIT_PASSWORD")?,
        };
        let twitch = TwitchCredentials {
            oauth_token: secret("TWITCH_OAUTH_TOKEN")?,
            nickname: required("TWITCH_BOT_NICKNAME")?,
            channel: required("TWITCH_CHANNEL")?
                .trim_start_matches('#')
                .to_lowercase(),
        };

        let music_volume_normal = volume("MUSIC_VOLUME_NORMAL", 0.8)?;
        let music_volume_low = volume("MUSIC_VOLUME_LOW", 0.2)?;
        if music_volume_low > music_volume_normal {
            return Err(ConfigError::InvalidValue(
                "MUSIC_VOLUME_LOW".to_string(),
                format!("{music_volume_low} is louder than MUSIC_VOLUME_NORMAL"),
            ));
        }

        let fetch_interval = Duration::from_secs(parsed("FETCH_INTERVAL_SECONDS", 300)?);
        if fetch_interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "FETCH_INTERVAL_SECONDS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let music_poll = Duration::from_millis(parsed("MUSIC_POLL_MILLIS", 1000)?);
        if music_poll.is_zero() {
            return Err(ConfigError::InvalidValue(
                "MUSIC_POLL_MILLIS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let log_level_str = or_default("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            azure_speech_key,
            azure_speech_region,
            tts_voice: or_default("TTS_VOICE", "en-US-JennyNeural"),
            gemini_api_key,
            gemini_model: or_default("GEMINI_MODEL", "gemini-1.5-flash-latest"),
            reddit,
            twitch,
            command_prefix: or_default("COMMAND_PREFIX", "!"),
            music_folder: PathBuf::from(or_default("MUSIC_FOLDER", "music")),
            stinger: PathBuf::from(or_default("STINGER_SFX", "drama_stinger.mp3")),
            subreddit: or_default("TARGET_SUBREDDIT", "LivestreamFail"),
            post_limit: parsed("POST_LIMIT", 5)?,
            fetch_interval,
            fetch_warmup: Duration::from_secs(parsed("FETCH_WARMUP_SECONDS", 10)?),
            music_volume_normal,
            music_volume_low,
            music_poll,
            music_warmup: Duration::from_secs(parsed("MUSIC_WARMUP_SECONDS", 2)?),
            log_level,
        })
    }

    pub fn volume_levels(&self) -> VolumeLevels {
        VolumeLevels {
            normal: self.music_volume_normal,
            low: self.music_volume_low,
        }
    }

    /// Engine timing with the configured overrides applied.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            processor: ProcessorSettings {
                levels: self.volume_levels(),
                voice: VoiceProfile {
                    voice: self.tts_voice.clone(),
                    ..VoiceProfile::default()
                },
                ..ProcessorSettings::default()
            },
            music: MusicSettings {
                warmup: self.music_warmup,
                poll_interval: self.music_poll,
                ..MusicSettings::default()
            },
            scheduler: SchedulerSettings {
                warmup: self.fetch_warmup,
                interval: self.fetch_interval,
                query: ContentQuery {
                    source: self.subreddit.clone(),
                    limit: self.post_limit,
                    ..ContentQuery::default()
                },
                stinger: self.stinger.clone(),
                ..SchedulerSettings::default()
            },
        }
    }
}
