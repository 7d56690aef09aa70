use std::path::PathBuf;

const DEFAULT_DATASET: &str = "data/hajj_umrah_data.csv";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub dataset_path: PathBuf,
    pub max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .map(|url| {
                if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                    anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                }
                Ok(url)
            })
            .transpose()?;

        let dataset_path = std::env::var("CROWD_DATASET")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET));

        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a positive number"))?;

        let config = Self {
            database_url,
            dataset_path,
            max_connections,
        };
        tracing::debug!(
            dataset = %config.dataset_path.display(),
            database = config.database_url.is_some(),
            "configuration loaded"
        );
        Ok(config)
    }

    pub fn require_database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set to a production Postgres instance"))
    }
}
