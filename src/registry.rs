use std::{collections::HashMap, path::PathBuf};

use actix_web::HttpRequest;
use secstr::SecStr;
use serde::Deserialize;

use crate::config::deserialize_secstr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Routing {
    /// `owner/repo` taken from the payload, request must be an `X-GitHub-Event: push`.
    Repository,
    /// Target id taken from the request path, e.g. `POST /my-hook`.
    Path,
}

impl Default for Routing {
    fn default() -> Self {
        Routing::Repository
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Command {
    pub workdir: PathBuf,
    pub exec: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Target {
    #[serde(alias = "repository")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_secstr")]
    pub secret: SecStr,
    pub command: Command,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no webhooks are configured")]
    Empty,
    #[error("webhook #{0} has an empty id")]
    EmptyId(usize),
    #[error("webhook `{0}` has an empty `command.exec`")]
    EmptyExec(String),
    #[error("expected repository name of form `owner/repo`, got `{0}`")]
    InvalidRepository(String),
    #[error("webhook `{0}` is configured more than once")]
    Duplicate(String),
}

#[derive(Debug)]
pub struct Registry {
    routing: Routing,
    targets: HashMap<String, Target>,
}

impl Registry {
    pub fn new(routing: Routing, targets: Vec<Target>) -> Result<Self, ConfigError> {
        if targets.is_empty() {
            return Err(ConfigError::Empty);
        }

        let mut map = HashMap::with_capacity(targets.len());
        for (idx, target) in targets.into_iter().enumerate() {
            if target.id.is_empty() {
                return Err(ConfigError::EmptyId(idx));
            }
            if target.command.exec.as_os_str().is_empty() {
                return Err(ConfigError::EmptyExec(target.id));
            }
            if routing == Routing::Repository && !is_repository_name(&target.id) {
                return Err(ConfigError::InvalidRepository(target.id));
            }
            if map.contains_key(&target.id) {
                return Err(ConfigError::Duplicate(target.id));
            }
            map.insert(target.id.clone(), target);
        }

        Ok(Self {
            routing,
            targets: map,
        })
    }

    pub fn routing(&self) -> Routing {
        self.routing
    }

    pub fn lookup(&self, key: &str) -> Option<&Target> {
        self.targets.get(key)
    }

    pub fn lookup_path(&self, req: &HttpRequest) -> Option<&Target> {
        self.lookup(req.path().trim_matches('/'))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.values()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }
}

fn is_repository_name(id: &str) -> bool {
    let parts: Vec<&str> = id.split('/').collect();
    matches!(parts.as_slice(), [owner, repo] if !owner.is_empty() && !repo.is_empty())
}
