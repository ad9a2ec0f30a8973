/// Constants module to avoid magic numbers in the codebase

// Network Configuration
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";
pub const DEFAULT_SERVER_PORT: u16 = 8000;
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

// Models
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

// Timeouts
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 3;

// History Limits
pub const DEFAULT_MAX_HISTORY_TURNS: usize = 20;
pub const DEFAULT_RETAINED_TURNS: usize = 18;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

// Uploads (provider-side limit for audio files)
pub const MAX_AUDIO_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

// Fixed replies
pub const EMPTY_TRANSCRIPT_PLACEHOLDER: &str = "(empty)";
pub const ECHO_REPLY_MARKER: &str = "[echo] ";
pub const DEFAULT_AUDIO_FORMAT: &str = "m4a";
