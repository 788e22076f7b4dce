use crate::config::{Config, Credentials};
use crate::error::Error;
use crate::manifest::{BlobCreationInfo, Manifest};
use crate::reference::{Digest, HashType, Reference};
use crate::registry::RegistryApi;
use crate::service_url::{ServiceFile, ServiceUrl};
use crate::utils::{self, ErrorResponse, MANIFEST_UNKNOWN_CODE};

use std::any::type_name;

use log::{debug, info};
use oci_spec::image::ImageManifest as OciImageManifest;
use reqwest::blocking::{Client as ReqwestClient, RequestBuilder, Response};
use reqwest::header::ACCEPT;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

#[derive(Deserialize)]
struct Catalog {
    #[serde(default)]
    repositories: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct TagList {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

pub struct Client {
    url: ServiceUrl,
    credentials: Option<Credentials>,
    reqwest_client: ReqwestClient,
}

impl Client {
    /// Create new registry client from given configuration
    pub fn from_config(config: Config) -> Result<Self, Error> {
        let Config { host, credentials, timeout, accept_invalid_certs } = config;
        let url = ServiceUrl::init(&host)?;
        let reqwest_client = ReqwestClient::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(Error::into_config)?;

        Ok(Self {
            url,
            credentials,
            reqwest_client,
        })
    }

    pub fn list_repositories(&self) -> Result<Vec<String>, Error> {
        let file = ServiceFile::Catalog;
        let url = self.url.get_url_path(None, &file)?;

        self.get_all_pages(url, &file, |catalog: Catalog| catalog.repositories.unwrap_or_default())
            .inspect_err(|e| debug!("Failed to list repositories: {:?}", e))
    }

    pub fn list_tags(&self, repository: &str) -> Result<Vec<String>, Error> {
        let file = ServiceFile::TagList;
        let url = self.url.get_url_path(Some(repository), &file)?;

        self.get_all_pages(url, &file, |list: TagList| list.tags.unwrap_or_default())
            .inspect_err(|e| debug!("Failed to list tags of {}: {:?}", repository, e))
    }

    pub fn get_manifest(&self, repository: &str, reference: &str) -> Result<Manifest, Error> {
        let file = ServiceFile::Manifest(Reference::try_from(reference)?);
        let url = self.url.get_url_path(Some(repository), &file)?;
        let response = self
            .get_response(url, &file)
            .inspect_err(|e| debug!("Failed to get manifest {}:{}: {:?}", repository, reference, e))?;

        let content_type = utils::content_type(response.headers());
        if !utils::verify_content_type(&content_type, &file.supported_media_types()) {
            debug!("Content-type {:?} doesn't match requested media type", content_type);
        }

        let content_digest = utils::docker_content_digest(response.headers());
        let body = Self::read_body(response)?;

        let digest = match content_digest {
            Some(cd) => {
                debug!("Docker-content-digest: {cd}");
                let digest = Digest::try_from(cd.as_str()).map_err(|_| Error::ResponseDigestInvalid)?;
                if !digest.matches(&body) {
                    debug!("Response digest doesn't match servers docker-content-digest");
                    return Err(Error::ResponseDigestInvalid);
                }
                digest
            }
            None => Digest::of(HashType::Sha256, &body),
        };

        let manifest: OciImageManifest = serde_json::from_slice(&body)?;
        Manifest::from_oci(digest, &manifest)
    }

    pub fn get_blob(&self, repository: &str, digest: &Digest) -> Result<BlobCreationInfo, Error> {
        let file = ServiceFile::Blob(digest.clone());
        let url = self.url.get_url_path(Some(repository), &file)?;
        let response = self
            .get_response(url, &file)
            .inspect_err(|e| debug!("Failed to get blob {}: {:?}", digest, e))?;

        Self::extract_json(response)
    }

    /// Deletes a manifest by digest. Registries answer 202 Accepted, anything
    /// else is reported with the status and body as received.
    pub fn delete_manifest(&self, repository: &str, digest: &Digest) -> Result<(), Error> {
        let file = ServiceFile::Manifest(Reference::from(digest.clone()));
        let url = self.url.get_url_path(Some(repository), &file)?;

        info!("Deleting {}", url);
        let response = self.send(self.request(Method::DELETE, url, &file))?;

        let status = response.status();
        if status == StatusCode::ACCEPTED {
            return Ok(());
        }

        let body = response
            .text()
            .map_err(|e| Error::ConnectionError(format!("failed to read response body: {}", e)))?;
        debug!("Delete of {} rejected with {}", digest, status);
        Err(Error::DeleteRejected { status, body })
    }

    fn get_all_pages<T, F>(&self, first: Url, file: &ServiceFile, mut items: F) -> Result<Vec<String>, Error>
    where
        T: DeserializeOwned,
        F: FnMut(T) -> Vec<String>,
    {
        let mut collected = Vec::new();
        let mut next = Some(first);

        while let Some(url) = next.take() {
            let response = self.get_response(url.clone(), file)?;
            let link = utils::next_link(response.headers());
            collected.extend(items(Self::extract_json(response)?));

            if let Some(link) = link {
                let following = url.join(&link)?;
                debug!("Next page: {}", following);
                next = (following != url).then_some(following);
            }
        }

        Ok(collected)
    }

    fn read_body(response: Response) -> Result<Vec<u8>, Error> {
        let content_length = utils::content_length(response.headers());

        let bytes = response
            .bytes()
            .map_err(|e| Error::ConnectionError(format!("failed to read response body: {}", e)))?;

        if let Some(cl) = content_length {
            debug!("Content-Length: {cl}");
            if cl != bytes.len() {
                debug!("Response length doesn't match servers content-length");
                return Err(Error::ConnectionError(format!(
                    "received {} bytes, expected {}", bytes.len(), cl
                )));
            }
        }

        Ok(bytes.to_vec())
    }

    fn extract_json<T: DeserializeOwned>(response: Response) -> Result<T, Error> {
        let body = Self::read_body(response)?;
        serde_json::from_slice(&body)
            .inspect_err(|_| debug!("Failed to parse {} as JSON", type_name::<T>()))
            .map_err(Error::from)
    }

    fn request(&self, method: Method, url: Url, file: &ServiceFile) -> RequestBuilder {
        let accepted_types = file.supported_media_types();

        info!("{} {}", method, url);
        debug!("Supported media types: {}", accepted_types.join(","));

        let request = self
            .reqwest_client
            .request(method, url)
            .header(ACCEPT, accepted_types.join(","));

        match &self.credentials {
            Some(credentials) => request.basic_auth(&credentials.username, Some(&credentials.password)),
            None => request,
        }
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, Error> {
        request.send().map_err(|err| {
            debug!("Failed to send request: {}", err);
            Error::ConnectionError(err.to_string())
        })
    }

    fn get_response(&self, url: Url, file: &ServiceFile) -> Result<Response, Error> {
        let accepted_types = file.supported_media_types();
        let response = self.send(self.request(Method::GET, url, file))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response, file));
        }

        let content_type = utils::content_type(response.headers());
        if let Some(content_type_str) = &content_type {
            debug!("Content-Type:\"{content_type_str}\"");
        }
        if !utils::verify_content_type(&content_type, &accepted_types) {
            debug!("Server returned unrequested content type");
        }

        Ok(response)
    }

    // Structured registry error codes win over the bare status. A 404 on a
    // manifest without a parseable error body still means the manifest is gone.
    fn status_error(response: Response, file: &ServiceFile) -> Error {
        let status = response.status();
        let body = response.bytes().map(|b| b.to_vec()).unwrap_or_default();

        match ErrorResponse::parse(&body) {
            Some(errors) if errors.has_code(MANIFEST_UNKNOWN_CODE) => Error::ManifestUnknown,
            Some(errors) => Error::StatusError { status, message: errors.summary() },
            None if status == StatusCode::NOT_FOUND && matches!(file, ServiceFile::Manifest(_)) => {
                Error::ManifestUnknown
            }
            None => Error::StatusError {
                status,
                message: String::from_utf8_lossy(&body).trim().to_string(),
            },
        }
    }
}

impl RegistryApi for Client {
    fn list_repositories(&self) -> Result<Vec<String>, Error> {
        Client::list_repositories(self)
    }

    fn list_tags(&self, repository: &str) -> Result<Vec<String>, Error> {
        Client::list_tags(self, repository)
    }

    fn get_manifest(&self, repository: &str, reference: &str) -> Result<Manifest, Error> {
        Client::get_manifest(self, repository, reference)
    }

    fn get_blob(&self, repository: &str, digest: &Digest) -> Result<BlobCreationInfo, Error> {
        Client::get_blob(self, repository, digest)
    }

    fn delete_manifest(&self, repository: &str, digest: &Digest) -> Result<(), Error> {
        Client::delete_manifest(self, repository, digest)
    }
}
