use anyhow::Context;

fn default_max_retries() -> u32 {
    3
}

/// Where the record store lives and how to talk to it
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct StoreConfig {
    /// e.g. `https://records.example.com/api`, without trailing `/tables`
    pub base_url: String,

    pub api_key: String,

    /// Retries of transient failures (connection errors, 5xx), not of rejected writes
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl StoreConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> StoreConfig {
        StoreConfig {
            base_url: base_url.into(),
            api_key: api_key.into(),
            max_retries: default_max_retries(),
        }
    }

    /// Reads a JSON config file
    pub fn load(path: &std::path::Path) -> anyhow::Result<StoreConfig> {
        let contents = std::fs::read(path)
            .with_context(|| format!("reading store config {:?}", path))?;
        serde_json::from_slice(&contents)
            .with_context(|| format!("parsing store config {:?}", path))
    }
}
