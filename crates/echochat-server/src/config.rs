use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub chunk_delay: Duration,
    pub max_message_chars: usize,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            chunk_delay: Duration::from_millis(default_chunk_delay_ms()),
            max_message_chars: default_max_message_chars(),
            log_format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    server: ServerSection,
    #[serde(default)]
    chat: ChatSection,
    #[serde(default)]
    logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatSection {
    #[serde(default = "default_chunk_delay_ms")]
    chunk_delay_ms: u64,
    #[serde(default = "default_max_message_chars")]
    max_message_chars: usize,
}

impl Default for ChatSection {
    fn default() -> Self {
        Self {
            chunk_delay_ms: default_chunk_delay_ms(),
            max_message_chars: default_max_message_chars(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct LoggingSection {
    #[serde(default)]
    format: LogFormat,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_chunk_delay_ms() -> u64 {
    100
}

fn default_max_message_chars() -> usize {
    4096
}

impl ServerConfig {
    pub fn load() -> anyhow::Result<Self> {
        if let Some(file_config) = load_from_file()? {
            return Ok(Self::from_file(file_config));
        }

        Ok(Self::from_env())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn from_file(file_config: FileConfig) -> Self {
        Self {
            host: file_config.server.host,
            port: file_config.server.port,
            chunk_delay: Duration::from_millis(file_config.chat.chunk_delay_ms),
            max_message_chars: file_config.chat.max_message_chars,
            log_format: file_config.logging.format,
        }
    }

    fn from_env() -> Self {
        let host = env::var("ECHOCHAT_SERVER_HOST").unwrap_or_else(|_| default_host());
        let port = env::var("ECHOCHAT_SERVER_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or_else(default_port);
        let chunk_delay_ms = env::var("ECHOCHAT_CHUNK_DELAY_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or_else(default_chunk_delay_ms);
        let max_message_chars = env::var("ECHOCHAT_MAX_MESSAGE_CHARS")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or_else(default_max_message_chars);
        let log_format = env::var("ECHOCHAT_LOG_FORMAT")
            .ok()
            .and_then(|value| LogFormat::parse(&value))
            .unwrap_or_default();

        Self {
            host,
            port,
            chunk_delay: Duration::from_millis(chunk_delay_ms),
            max_message_chars,
            log_format,
        }
    }
}

fn load_from_file() -> anyhow::Result<Option<FileConfig>> {
    let config_path = env::var("ECHOCHAT_SERVER_CONFIG").ok();
    let path = if let Some(path) = config_path {
        Some(path)
    } else if Path::new("server.toml").exists() {
        Some("server.toml".to_string())
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(None);
    };

    parse_file(&path).map(Some)
}

fn parse_file(path: &str) -> anyhow::Result<FileConfig> {
    let contents = fs::read_to_string(path)
        .map_err(|err| anyhow::anyhow!("Failed to read config {}: {}", path, err))?;
    let parsed: FileConfig = toml::from_str(&contents)
        .map_err(|err| anyhow::anyhow!("Failed to parse config {}: {}", path, err))?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn file_sections_override_defaults() {
        let file = write_config(
            r#"
            [server]
            port = 8088

            [chat]
            chunk_delay_ms = 5

            [logging]
            format = "json"
            "#,
        );

        let config = ServerConfig::from_file(parse_file(file.path().to_str().unwrap()).unwrap());

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8088);
        assert_eq!(config.chunk_delay, Duration::from_millis(5));
        assert_eq!(config.max_message_chars, 4096);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.bind_addr(), "0.0.0.0:8088");
    }

    #[test]
    fn empty_file_uses_defaults() {
        let file = write_config("");
        let config = ServerConfig::from_file(parse_file(file.path().to_str().unwrap()).unwrap());

        assert_eq!(config.port, 3000);
        assert_eq!(config.chunk_delay, Duration::from_millis(100));
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let file = write_config("[server]\nport = \"not a number\"");
        let err = parse_file(file.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn log_format_parsing_is_case_insensitive() {
        assert_eq!(LogFormat::parse("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse(" text "), Some(LogFormat::Text));
        assert_eq!(LogFormat::parse("xml"), None);
    }
}
