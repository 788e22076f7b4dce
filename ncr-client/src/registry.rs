use crate::error::Error;
use crate::manifest::{BlobCreationInfo, Manifest};
use crate::reference::Digest;

/// Operations a registry browser needs from a Docker Registry HTTP API v2
/// endpoint. Every call is bound to one registry and its credentials.
pub trait RegistryApi {
    /// `GET /v2/_catalog`, all pages.
    fn list_repositories(&self) -> Result<Vec<String>, Error>;

    /// `GET /v2/{repository}/tags/list`, all pages, in registry order.
    fn list_tags(&self, repository: &str) -> Result<Vec<String>, Error>;

    /// `GET /v2/{repository}/manifests/{reference}`.
    ///
    /// Fails with [`Error::ManifestUnknown`] when the registry reports the
    /// manifest as absent.
    fn get_manifest(&self, repository: &str, reference: &str) -> Result<Manifest, Error>;

    /// `GET /v2/{repository}/blobs/{digest}` decoded as an image config.
    fn get_blob(&self, repository: &str, digest: &Digest) -> Result<BlobCreationInfo, Error>;

    /// `DELETE /v2/{repository}/manifests/{digest}`.
    fn delete_manifest(&self, repository: &str, digest: &Digest) -> Result<(), Error>;
}

impl<T: RegistryApi + ?Sized> RegistryApi for &T {
    fn list_repositories(&self) -> Result<Vec<String>, Error> {
        (**self).list_repositories()
    }

    fn list_tags(&self, repository: &str) -> Result<Vec<String>, Error> {
        (**self).list_tags(repository)
    }

    fn get_manifest(&self, repository: &str, reference: &str) -> Result<Manifest, Error> {
        (**self).get_manifest(repository, reference)
    }

    fn get_blob(&self, repository: &str, digest: &Digest) -> Result<BlobCreationInfo, Error> {
        (**self).get_blob(repository, digest)
    }

    fn delete_manifest(&self, repository: &str, digest: &Digest) -> Result<(), Error> {
        (**self).delete_manifest(repository, digest)
    }
}
