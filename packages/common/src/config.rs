use std::path::PathBuf;

use serde::Deserialize;

/// Media storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory served under `/public`; uploads land in `{public_root}/uploads`.
    /// Default: "./public".
    #[serde(default = "default_public_root")]
    pub public_root: PathBuf,
    /// Maximum accepted image size in bytes. Default: 4 MiB.
    #[serde(default = "default_max_image_size")]
    pub max_image_size: u64,
}

fn default_public_root() -> PathBuf {
    PathBuf::from("./public")
}
fn default_max_image_size() -> u64 {
    4 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            public_root: default_public_root(),
            max_image_size: default_max_image_size(),
        }
    }
}
