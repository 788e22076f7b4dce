use oci_spec::image::{Descriptor, ImageManifest as OciImageManifest};
use serde::Deserialize;

use crate::error::Error;
use crate::reference::Digest;

/// Size-relevant view of an image manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    digest: Digest,
    config_digest: Digest,
    config_size: u64,
    layer_sizes: Vec<u64>,
}

fn descriptor_size(descriptor: &Descriptor) -> u64 {
    u64::try_from(descriptor.size()).unwrap_or(0)
}

impl Manifest {
    pub fn new(digest: Digest, config_digest: Digest, config_size: u64, layer_sizes: Vec<u64>) -> Self {
        Self { digest, config_digest, config_size, layer_sizes }
    }

    pub(crate) fn from_oci(digest: Digest, manifest: &OciImageManifest) -> Result<Self, Error> {
        let config_digest = Digest::try_from(manifest.config().digest().to_string().as_str())?;
        let layer_sizes = manifest.layers().iter().map(descriptor_size).collect();

        Ok(Self {
            digest,
            config_digest,
            config_size: descriptor_size(manifest.config()),
            layer_sizes,
        })
    }

    /// Digest of the manifest document itself, the reference a delete needs.
    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    pub fn config_digest(&self) -> &Digest {
        &self.config_digest
    }

    pub fn config_size(&self) -> u64 {
        self.config_size
    }

    pub fn layer_sizes(&self) -> &[u64] {
        &self.layer_sizes
    }

    pub fn total_size(&self) -> u64 {
        self.config_size + self.layer_sizes.iter().sum::<u64>()
    }
}

/// Creation time recorded in an image config blob.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BlobCreationInfo {
    #[serde(rename = "created")]
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::HashType;

    const MANIFEST: &str = r#"{
        "schemaVersion": 2,
        "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
        "config": {
            "mediaType": "application/vnd.docker.container.image.v1+json",
            "size": 1469,
            "digest": "sha256:3f57d9401f8d42f986df300f0c69192fc41da28ccc8d797829467780db3dd741"
        },
        "layers": [
            {
                "mediaType": "application/vnd.docker.image.rootfs.diff.tar.gzip",
                "size": 3370706,
                "digest": "sha256:c6a83fedfae6ed8a4f5f7cbb6a7b6f1c1ec3d86fea8cb9e5ba2e5e6673fde9f6"
            },
            {
                "mediaType": "application/vnd.docker.image.rootfs.diff.tar.gzip",
                "size": 1024,
                "digest": "sha256:4f4fb700ef54461cfa02571ae0db9a0dc1e0cdb5577484a6d75e68dc38e8acc1"
            }
        ]
    }"#;

    #[test]
    fn docker_v2_manifest() {
        let oci: OciImageManifest = serde_json::from_str(MANIFEST).unwrap();
        let digest = Digest::of(HashType::Sha256, MANIFEST.as_bytes());
        let manifest = Manifest::from_oci(digest.clone(), &oci).unwrap();

        assert_eq!(manifest.digest(), &digest);
        assert_eq!(
            manifest.config_digest().to_string(),
            "sha256:3f57d9401f8d42f986df300f0c69192fc41da28ccc8d797829467780db3dd741"
        );
        assert_eq!(manifest.config_size(), 1469);
        assert_eq!(manifest.layer_sizes(), &[3370706, 1024]);
        assert_eq!(manifest.total_size(), 1469 + 3370706 + 1024);
    }

    #[test]
    fn config_blob() {
        let blob: BlobCreationInfo = serde_json::from_str(
            r#"{"architecture":"amd64","created":"2024-03-01T10:00:00.123456789Z","os":"linux"}"#,
        )
        .unwrap();
        assert_eq!(blob.created_at, "2024-03-01T10:00:00.123456789Z");

        assert!(serde_json::from_str::<BlobCreationInfo>(r#"{"os":"linux"}"#).is_err());
    }
}
