//! URL construction for API endpoints
//!
//! Pure string assembly from the configured base URL and path templates.
//! No endpoint knowledge lives anywhere else, so pointing the tool at a
//! staging host or a mock server is a config change only.

use crate::config::AppConfig;

/// Resolves absolute endpoint URLs from the base URL and path templates.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base_url: String,
    localities: String,
    locality_detail: String,
    locality_minerals: String,
}

impl Endpoints {
    /// Build the resolver from application configuration.
    ///
    /// A trailing slash on the base URL is tolerated; path templates are
    /// expected to start with `/`.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            localities: config.endpoints.localities.clone(),
            locality_detail: config.endpoints.locality_detail.clone(),
            locality_minerals: config.endpoints.locality_minerals.clone(),
        }
    }

    /// Absolute URL of the localities listing endpoint
    pub fn localities_url(&self) -> String {
        format!("{}{}", self.base_url, self.localities)
    }

    /// Absolute URL of the detail endpoint for one locality
    pub fn locality_detail_url(&self, id: u64) -> String {
        let path = self.locality_detail.replace("{id}", &id.to_string());
        format!("{}{}", self.base_url, path)
    }

    /// Absolute URL of the locality-minerals listing endpoint
    pub fn locality_minerals_url(&self) -> String {
        format!("{}{}", self.base_url, self.locality_minerals)
    }
}
