// JSON file store: one pretty-printed array per partition in the data directory

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::catalog::{normalize_fields, Catalog};
use crate::models::Partition;
use crate::parser::parse_lenient_records;

/// Files from older layouts, loaded and routed by type like any other
const LEGACY_FILES: &[&str] = &["asian.json"];

pub fn partition_file(partition: Partition) -> &'static str {
    match partition {
        Partition::Movies => "movies.json",
        Partition::Series => "series.json",
        Partition::Anime => "anime.json",
        Partition::Other => "other-media.json",
    }
}

pub struct PartitionStore {
    data_dir: PathBuf,
    read_only: bool,
}

impl PartitionStore {
    pub fn new(data_dir: impl Into<PathBuf>, read_only: bool) -> Self {
        Self {
            data_dir: data_dir.into(),
            read_only,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Read every partition file that exists. Files that cannot be read or
    /// parsed contribute nothing; only a missing data directory that cannot be
    /// created is an error.
    pub async fn load(&self) -> Result<Catalog> {
        if !self.read_only {
            fs::create_dir_all(&self.data_dir)
                .await
                .with_context(|| format!("Failed to create data directory {:?}", self.data_dir))?;
        }

        let mut catalog = Catalog::new();
        let files = Partition::ALL
            .iter()
            .map(|&p| partition_file(p))
            .chain(LEGACY_FILES.iter().copied());

        for file in files {
            let path = self.data_dir.join(file);
            if !fs::try_exists(&path).await.unwrap_or(false) {
                continue;
            }

            let content = match fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("Failed to read {:?}: {}", path, e);
                    continue;
                }
            };

            let parsed = parse_lenient_records(&content);
            let loaded = parsed.records.len();
            catalog.extend(parsed.records.iter().map(normalize_fields));

            if parsed.report.skipped() > 0 {
                tracing::warn!(
                    "Loaded {} records from {:?}, skipped {}",
                    loaded,
                    path,
                    parsed.report.skipped()
                );
            } else {
                tracing::info!("Loaded {} records from {:?}", loaded, path);
            }
        }

        tracing::info!(
            "Catalog ready: {} movies, {} series, {} anime, {} other",
            catalog.partition(Partition::Movies).len(),
            catalog.partition(Partition::Series).len(),
            catalog.partition(Partition::Anime).len(),
            catalog.partition(Partition::Other).len()
        );
        Ok(catalog)
    }

    /// Write a snapshot of every partition. Legacy files are renamed away
    /// afterwards so their records are not loaded twice.
    pub async fn save(&self, catalog: &Catalog) -> Result<()> {
        if self.read_only {
            tracing::debug!("Read-only store, skipping save");
            return Ok(());
        }

        fs::create_dir_all(&self.data_dir)
            .await
            .with_context(|| format!("Failed to create data directory {:?}", self.data_dir))?;

        for partition in Partition::ALL {
            let path = self.data_dir.join(partition_file(partition));
            let json = serde_json::to_string_pretty(catalog.partition(partition))
                .with_context(|| format!("Failed to serialize {} partition", partition.as_str()))?;
            fs::write(&path, json)
                .await
                .with_context(|| format!("Failed to write {:?}", path))?;
        }

        for file in LEGACY_FILES {
            let path = self.data_dir.join(file);
            if fs::try_exists(&path).await.unwrap_or(false) {
                let retired = path.with_extension("json.bak");
                fs::rename(&path, &retired)
                    .await
                    .with_context(|| format!("Failed to retire legacy file {:?}", path))?;
                tracing::info!("Moved legacy file {:?} to {:?}", path, retired);
            }
        }

        tracing::debug!("Saved {} records to {:?}", catalog.len(), self.data_dir);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Media, MediaType};

    #[tokio::test]
    async fn test_load_routes_by_type() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("movies.json"),
            r#"[{"id": "m1", "title": "Heat", "type": "movie"},
                {"id": "s1", "title": "Dark", "type": "foreign_series"}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("asian.json"),
            "{id: 'k1', title: 'Kingdom', type: asian_series},\n{id: 'k2', title: \"a\" \"b\"}\n",
        )
        .unwrap();

        let store = PartitionStore::new(dir.path(), false);
        let catalog = store.load().await.unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.partition(Partition::Movies).len(), 1);
        let series: Vec<&str> = catalog
            .partition(Partition::Series)
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(series, vec!["s1", "k1"]);
    }

    #[tokio::test]
    async fn test_unreadable_file_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("anime.json"), "<<< not json >>>").unwrap();

        let catalog = PartitionStore::new(dir.path(), false).load().await.unwrap();
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("asian.json"),
            r#"[{"id": "k1", "title": "Kingdom", "type": "asian_series"}]"#,
        )
        .unwrap();
        let store = PartitionStore::new(dir.path(), false);

        let mut catalog = store.load().await.unwrap();
        catalog.insert(Media::new("a1", "Akira", MediaType::AnimeMovie));
        store.save(&catalog).await.unwrap();

        assert!(dir.path().join("other-media.json").exists());
        assert!(!dir.path().join("asian.json").exists());
        assert!(dir.path().join("asian.json.bak").exists());

        let reloaded = store.load().await.unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get("a1"), catalog.get("a1"));
        assert_eq!(reloaded.get("k1").map(|m| m.partition()), Some(Partition::Series));
    }

    #[tokio::test]
    async fn test_read_only_skips_writes() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let store = PartitionStore::new(&data_dir, true);

        let mut catalog = store.load().await.unwrap();
        catalog.insert(Media::new("m1", "Heat", MediaType::Movie));
        store.save(&catalog).await.unwrap();

        assert!(!data_dir.exists());
    }
}
