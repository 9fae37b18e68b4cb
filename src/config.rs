use std::path::{Path, PathBuf};

use color_eyre::eyre::{self, WrapErr as _};
use secstr::SecStr;
use serde::{Deserialize, Deserializer};

use crate::registry::{Registry, Routing, Target};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_targets")]
    pub targets: PathBuf,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub routing: Routing,
}

fn default_targets() -> PathBuf {
    "webhooks.json".into()
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    9000
}

#[derive(Debug, Deserialize)]
pub struct TargetsFile {
    pub webhooks: Vec<Target>,
}

pub fn load_registry(path: &Path, routing: Routing) -> eyre::Result<Registry> {
    let file = std::fs::File::open(path)
        .wrap_err_with(|| format!("Failed to open webhook configuration {:?}", path))?;
    let TargetsFile { webhooks } = serde_json::from_reader(std::io::BufReader::new(file))
        .wrap_err_with(|| format!("Failed to parse webhook configuration {:?}", path))?;
    Registry::new(routing, webhooks)
        .wrap_err_with(|| format!("Invalid webhook configuration {:?}", path))
}

pub fn deserialize_secstr<'de, D>(de: D) -> Result<SecStr, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(de).map(|s| SecStr::new(s.into_bytes()))
}
