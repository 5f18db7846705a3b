//! Durable storage of finalized order statuses in a JSON file.

use {
    anyhow::Context,
    model::order::{OrderHash, OrderStatus},
    serde::{Deserialize, Serialize},
    std::{
        collections::HashMap,
        path::{Path, PathBuf},
    },
    tokio::sync::Mutex,
};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Entry {
    hash: OrderHash,
    status: OrderStatus,
}

#[derive(Debug)]
pub struct Persistence {
    path: PathBuf,
    /// Serializes writers so that an older snapshot never replaces a newer
    /// one half way.
    write: Mutex<()>,
}

impl Persistence {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored statuses. A missing file means nothing was
    /// finalized yet.
    pub async fn load(&self) -> anyhow::Result<HashMap<OrderHash, OrderStatus>> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(err) => {
                return Err(err).with_context(|| format!("reading {}", self.path.display()));
            }
        };
        let entries: Vec<Entry> = serde_json::from_slice(&contents)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(entries
            .into_iter()
            .map(|entry| (entry.hash, entry.status))
            .collect())
    }

    /// Replaces the stored statuses. The file is written next to the target
    /// and then renamed, so readers never see a partial file.
    pub async fn store(&self, statuses: &HashMap<OrderHash, OrderStatus>) -> anyhow::Result<()> {
        let mut entries = statuses
            .iter()
            .map(|(hash, status)| Entry {
                hash: *hash,
                status: *status,
            })
            .collect::<Vec<_>>();
        entries.sort_by_key(|entry| entry.hash.0);
        let contents = serde_json::to_vec_pretty(&entries)?;

        let _guard = self.write.lock().await;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, contents)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("renaming {} to {}", tmp.display(), self.path.display()))?;
        Ok(())
    }
}
