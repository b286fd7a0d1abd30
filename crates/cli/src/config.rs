/// Vault configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Vault bucket holding project state.
    pub bucket: String,
    /// Vault service endpoint.
    pub base_url: String,
    /// Path to the service-account key document (JSON).
    pub key_file: String,
}

impl CliConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                    | Required | Default                          |
    /// |----------------------------|----------|----------------------------------|
    /// | `VAULT_BUCKET`             | **yes**  | --                               |
    /// | `VAULT_BASE_URL`           | no       | `https://storage.googleapis.com` |
    /// | `SERVICE_ACCOUNT_KEY_FILE` | **yes**  | --                               |
    ///
    /// # Panics
    ///
    /// Panics when a required variable is missing.
    pub fn from_env() -> Self {
        let bucket = std::env::var("VAULT_BUCKET")
            .expect("VAULT_BUCKET must be set in the environment");

        let base_url = std::env::var("VAULT_BASE_URL")
            .unwrap_or_else(|_| callsheet_vault::client::DEFAULT_BASE_URL.to_string());

        let key_file = std::env::var("SERVICE_ACCOUNT_KEY_FILE")
            .expect("SERVICE_ACCOUNT_KEY_FILE must be set in the environment");

        Self {
            bucket,
            base_url,
            key_file,
        }
    }
}
