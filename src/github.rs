//! The subset of GitHub's `push` event payload that hooks care about.
//!
//! Every field defaults to empty: GitHub omits `head_commit` when a branch is
//! deleted, and older payloads only carry `owner.login`.

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct User {
    pub name: Option<String>,
    pub login: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct Repository {
    pub name: String,
    pub owner: User,
}

impl Repository {
    pub fn full_name(&self) -> String {
        let owner = self
            .owner
            .name
            .as_deref()
            .or_else(|| self.owner.login.as_deref())
            .unwrap_or_default();
        format!("{}/{}", owner, self.name)
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct Pusher {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct Commit {
    pub id: String,
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct PushEvent {
    #[serde(rename = "ref")]
    pub reference: String,
    pub pusher: Pusher,
    #[serde(deserialize_with = "null_as_default")]
    pub head_commit: Commit,
    pub repository: Repository,
}

impl PushEvent {
    /// Last `/`-separated segment of the ref, e.g. `master` for `refs/heads/master`.
    pub fn branch(&self) -> &str {
        self.reference.rsplit('/').next().unwrap_or_default()
    }

    pub fn command_args(&self) -> Vec<String> {
        vec![
            self.pusher.name.clone(),
            self.pusher.email.clone(),
            self.head_commit.id.clone(),
            self.head_commit.message.clone(),
            self.head_commit.timestamp.clone(),
        ]
    }
}

fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + serde::Deserialize<'de>,
{
    use serde::Deserialize as _;

    Option::<T>::deserialize(de).map(Option::unwrap_or_default)
}
