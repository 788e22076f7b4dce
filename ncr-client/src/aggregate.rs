//! Per-tag metadata for a repository listing.
//!
//! Each tag costs one manifest request and, when the manifest exists, one
//! config blob request. A tag whose manifest the registry reports as unknown
//! becomes a placeholder; every other failure aborts the whole listing.

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::error::Error;
use crate::humanize::{age_description, format_size};
use crate::registry::RegistryApi;

pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagSummary {
    /// Tag is listed but its manifest is gone.
    Placeholder { tag: String },
    Populated { tag: String, age: String, size: u64 },
}

impl TagSummary {
    /// Tag as the registry knows it, usable as a manifest reference.
    pub fn tag(&self) -> &str {
        match self {
            Self::Placeholder { tag } | Self::Populated { tag, .. } => tag,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Self::Placeholder { tag } => format!("{} (empty)", tag),
            Self::Populated { tag, .. } => tag.clone(),
        }
    }

    pub fn age_description(&self) -> &str {
        match self {
            Self::Placeholder { .. } => NOT_AVAILABLE,
            Self::Populated { age, .. } => age,
        }
    }

    pub fn total_size(&self) -> u64 {
        match self {
            Self::Placeholder { .. } => 0,
            Self::Populated { size, .. } => *size,
        }
    }

    /// Line shown in the tag selector.
    pub fn label(&self) -> String {
        format!(
            "{} (Created {}) {}",
            self.name(),
            self.age_description(),
            format_size(self.total_size())
        )
    }
}

fn summarize<R>(api: &R, repository: &str, tag: &str, now: DateTime<Utc>) -> Result<TagSummary, Error>
where
    R: RegistryApi + ?Sized,
{
    let manifest = match api.get_manifest(repository, tag) {
        Ok(manifest) => manifest,
        Err(Error::ManifestUnknown) => {
            debug!("Manifest of {}:{} is unknown", repository, tag);
            return Ok(TagSummary::Placeholder { tag: tag.to_string() });
        }
        Err(e) => return Err(e),
    };

    let blob = api.get_blob(repository, manifest.config_digest())?;
    let age = age_description(&blob.created_at, now)?;

    Ok(TagSummary::Populated {
        tag: tag.to_string(),
        age,
        size: manifest.total_size(),
    })
}

/// Summaries for `tags` in the given order, ages measured against `now`.
pub fn aggregate<R>(api: &R, repository: &str, tags: &[String], now: DateTime<Utc>) -> Result<Vec<TagSummary>, Error>
where
    R: RegistryApi + ?Sized,
{
    info!("Collecting metadata for {} tags of {}", tags.len(), repository);

    tags.iter()
        .map(|tag| summarize(api, repository, tag, now))
        .collect()
}

pub fn aggregate_now<R>(api: &R, repository: &str, tags: &[String]) -> Result<Vec<TagSummary>, Error>
where
    R: RegistryApi + ?Sized,
{
    aggregate(api, repository, tags, Utc::now())
}
