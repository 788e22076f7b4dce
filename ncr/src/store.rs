use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::NcrResult;

pub const DEFAULT_DIR: &str = ".ncregistry";
pub const DEFAULT_FILE: &str = "config.yaml";

/// A registry the operator added, as persisted in the store file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry
{
    pub url: String,
    pub username: String,
    pub password: String,
}

impl RegistryEntry
{
    /// Registry address without the scheme, as shown in menus.
    pub fn display_name(&self) -> &str
    {
        self.url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.url)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile
{
    #[serde(default)]
    entries: Vec<RegistryEntry>,
}

/// Prefix `https://` unless the url already names a scheme.
pub fn normalize_url(url: &str) -> String
{
    let url = url.trim();
    if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Known registries, mirrored to a YAML file on every change.
#[derive(Debug)]
pub struct RegistryStore
{
    path: PathBuf,
    entries: Vec<RegistryEntry>,
}

impl RegistryStore
{
    /// `$HOME/.ncregistry/config.yaml`
    pub fn default_path() -> NcrResult<PathBuf>
    {
        let home = dirs::home_dir().ok_or("Failed to get home directory")?;
        Ok(home.join(DEFAULT_DIR).join(DEFAULT_FILE))
    }

    /// Opens the store, creating its directory and an empty file if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> NcrResult<Self>
    {
        let path = path.as_ref().to_path_buf();

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if !dir.exists() {
                info!("Creating store directory: {:?}", dir);
                create_private_dir(dir)?;
            }
        }

        if !path.exists() {
            info!("Creating store file: {:?}", path);
            fs::write(&path, "")?;
        }

        let mut store = RegistryStore {
            path,
            entries: Vec::new(),
        };
        store.entries = store.load()?;

        Ok(store)
    }

    pub fn path(&self) -> &Path
    {
        &self.path
    }

    pub fn entries(&self) -> &[RegistryEntry]
    {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&RegistryEntry>
    {
        self.entries.get(index)
    }

    pub fn is_empty(&self) -> bool
    {
        self.entries.is_empty()
    }

    /// Reads the entries persisted on disk.
    pub fn load(&self) -> NcrResult<Vec<RegistryEntry>>
    {
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let file: StoreFile = serde_yaml::from_str(&content)?;
        debug!("Loaded {} registries from {:?}", file.entries.len(), self.path);

        Ok(file.entries)
    }

    /// Replaces the persisted entries.
    pub fn save(&mut self, entries: Vec<RegistryEntry>) -> NcrResult<()>
    {
        let file = StoreFile { entries };
        fs::write(&self.path, serde_yaml::to_string(&file)?)?;
        self.entries = file.entries;

        debug!("Saved {} registries to {:?}", self.entries.len(), self.path);
        Ok(())
    }

    pub fn add(&mut self, entry: RegistryEntry) -> NcrResult<()>
    {
        info!("Adding registry {}", entry.url);

        let mut entries = self.entries.clone();
        entries.push(entry);
        self.save(entries)
    }

    pub fn remove(&mut self, index: usize) -> NcrResult<Option<RegistryEntry>>
    {
        if index >= self.entries.len() {
            return Ok(None);
        }

        let mut entries = self.entries.clone();
        let removed = entries.remove(index);
        info!("Removing registry {}", removed.url);
        self.save(entries)?;

        Ok(Some(removed))
    }
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> std::io::Result<()>
{
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> std::io::Result<()>
{
    fs::create_dir_all(dir)
}
