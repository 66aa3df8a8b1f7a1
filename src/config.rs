use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_DATA_DIR: &str = ".haze";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub data_dir: PathBuf,
    pub order_placed_display: Duration,
}

impl ClientConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_url = env::var("HAZE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let data_dir = env::var("HAZE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
        let secs = match env::var("HAZE_ORDER_PLACED_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|err| {
                anyhow::anyhow!("HAZE_ORDER_PLACED_SECS must be a whole number of seconds: {err}")
            })?,
            Err(_) => 5,
        };
        Ok(Self {
            api_url,
            data_dir,
            order_placed_display: Duration::from_secs(secs),
        })
    }

    pub fn with_overrides(mut self, api_url: Option<String>, data_dir: Option<PathBuf>) -> Self {
        if let Some(url) = api_url {
            self.api_url = url;
        }
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        self
    }
}
