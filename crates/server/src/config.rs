use std::path::PathBuf;

use serde::Deserialize;

/// Server configuration, read from a TOML file with environment overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub bind_addr: String,
    /// Root directory for the database and the upload store.
    pub data_dir: PathBuf,
    /// Upper bound on a single request body.
    pub max_upload_bytes: usize,
    /// Tesseract language code (only consulted by the `tesseract` build).
    pub ocr_lang: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8350".to_string(),
            data_dir: PathBuf::from("./data"),
            max_upload_bytes: 10 * 1024 * 1024,
            ocr_lang: "eng".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load from `$SLIPSCAN_CONFIG` (falling back to `./slipscan.toml` when
    /// present, defaults otherwise), then apply env overrides for the
    /// deployment-variable fields.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("SLIPSCAN_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("slipscan.toml"));

        let mut config = if path.exists() {
            Self::from_toml(&std::fs::read_to_string(&path)?)?
        } else {
            Self::default()
        };

        if let Ok(addr) = std::env::var("SLIPSCAN_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(dir) = std::env::var("SLIPSCAN_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    fn from_toml(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.bind_addr, "127.0.0.1:8350");
        assert_eq!(cfg.data_dir, PathBuf::from("./data"));
        assert!(cfg.max_upload_bytes > 0);
    }

    #[test]
    fn partial_toml_keeps_defaults_for_the_rest() {
        let cfg = ServerConfig::from_toml("bind_addr = \"0.0.0.0:9000\"").unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:9000");
        assert_eq!(cfg.ocr_lang, "eng");
    }

    #[test]
    fn full_toml_parses() {
        let cfg = ServerConfig::from_toml(
            "bind_addr = \"0.0.0.0:80\"\n\
             data_dir = \"/var/lib/slipscan\"\n\
             max_upload_bytes = 1048576\n\
             ocr_lang = \"deu\"",
        )
        .unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/var/lib/slipscan"));
        assert_eq!(cfg.max_upload_bytes, 1_048_576);
        assert_eq!(cfg.ocr_lang, "deu");
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(ServerConfig::from_toml("bind_addr = [1, 2]").is_err());
    }
}
