use crate::error::Error;
use crate::reference::{Digest, Reference};

use oci_spec::image::MediaType;
use url::Url;

pub const DOCKER_MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";
pub(crate) const DOCKER_CONFIG_V1: &str = "application/vnd.docker.container.image.v1+json";

pub(crate) enum ServiceFile {
    Catalog,
    TagList,
    Manifest(Reference),
    Blob(Digest),
}

impl ServiceFile {
    const CATALOG_PATH: &'static str = "_catalog";
    const MANIFEST_PATH: &'static str = "manifests/";
    const BLOBS_PATH: &'static str = "blobs/";
    const TAGS_PATH: &'static str = "tags/list";

    pub fn get_file_uri(&self) -> String {
        match self {
            Self::Catalog => Self::CATALOG_PATH.to_string(),
            Self::TagList => Self::TAGS_PATH.to_string(),
            Self::Manifest(reference) => format!("{}{}", Self::MANIFEST_PATH, reference),
            Self::Blob(digest) => format!("{}{}", Self::BLOBS_PATH, digest),
        }
    }

    pub fn supported_media_types(&self) -> Vec<String> {
        match self {
            Self::Manifest(_) => vec![DOCKER_MANIFEST_V2.to_string()],
            Self::Blob(_) => vec![
                DOCKER_CONFIG_V1.to_string(),
                MediaType::ImageConfig.to_string(),
                mime::APPLICATION_OCTET_STREAM.to_string()],
            Self::Catalog | Self::TagList => vec![mime::APPLICATION_JSON.to_string()],
        }
    }
}

pub(crate) struct Scheme {
    scheme: &'static str,
}

impl Scheme {
    pub const fn init(scheme: &'static str) -> Self {
        Self {
            scheme
        }
    }

    pub const fn as_str(&self) -> &'static str {
        self.scheme
    }

    fn name(&self) -> &'static str {
        self.scheme.trim_end_matches("://")
    }
}

pub(crate) const HTTPS_SCHEME: Scheme = Scheme::init("https://");
pub(crate) const HTTP_SCHEME: Scheme = Scheme::init("http://");

impl PartialEq<&str> for Scheme {
    fn eq(&self, other: &&str) -> bool {
        &self.scheme == other || &self.name() == other
    }
}

// Accept "localhost:5000" the same as "https://localhost:5000".
// A user supplied scheme is kept when it is http or https.
pub(crate) fn make_url(user: &str) -> Result<Url, Error> {
    let user = user.trim();
    if let Ok(user_parsed) = Url::parse(user) {
        // Otherwise "host:port" got parsed as a scheme
        if user_parsed.has_host() {
            let user_scheme = user_parsed.scheme();
            if HTTPS_SCHEME == user_scheme || HTTP_SCHEME == user_scheme {
                return Ok(user_parsed);
            }
            return Err(Error::UrlParsingError(format!("Invalid user scheme: {}", user_scheme)));
        }
    }

    Ok(Url::parse(&format!("{}{}", HTTPS_SCHEME.as_str(), user))?)
}

/// Registry address without scheme, as container runtimes expect it.
pub fn host_and_port(user: &str) -> Result<String, Error> {
    let url = make_url(user)?;
    let host = url
        .host_str()
        .ok_or_else(|| Error::UrlParsingError(format!("No host in {}", user)))?;
    let path = url.path().trim_end_matches('/');
    Ok(match url.port() {
        Some(port) => format!("{}:{}{}", host, port, path),
        None => format!("{}{}", host, path),
    })
}

pub(crate) struct ServiceUrl {
    base: Url,
}

impl ServiceUrl {
    const VERSION_PATH: &'static str = "v2/";

    pub fn init(host: &str) -> Result<Self, Error> {
        let mut root = make_url(host)?;
        if !root.path().ends_with('/') {
            let path = format!("{}/", root.path());
            root.set_path(&path);
        }
        Ok(Self { base: root.join(Self::VERSION_PATH)? })
    }

    #[cfg(test)]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn get_url_path(&self, repository: Option<&str>, file: &ServiceFile) -> Result<Url, Error> {
        let url = match repository {
            Some(name) => self
                .base
                .join(&format!("{}/", name.trim_matches('/')))?
                .join(&file.get_file_uri())?,
            None => self.base.join(&file.get_file_uri())?,
        };

        Ok(url)
    }
}
