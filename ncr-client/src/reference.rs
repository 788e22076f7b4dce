use std::fmt::Display;
use std::sync::LazyLock;

use crate::error::{self, Error};
use log::debug;
use regex::Regex;
use sha2::{Digest as Sha2Digest, Sha256, Sha512};

pub(crate) const SHA_256: &str = "sha256";
pub(crate) const SHA_512: &str = "sha512";

static DIGEST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z0-9]+(?:[+._-][a-z0-9]+)*):([a-zA-Z0-9=_-]+)$")
        .expect("Digest regex is malformed")
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_][a-zA-Z0-9._-]{0,127}$").expect("Tag regex is malformed")
});

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HashType {
    Sha256,
    Sha512,
}

impl HashType {
    pub(crate) fn hash(&self, content: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(content).to_vec(),
            Self::Sha512 => Sha512::digest(content).to_vec(),
        }
    }
}

impl Display for HashType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sha256 => f.write_str(SHA_256),
            Self::Sha512 => f.write_str(SHA_512),
        }
    }
}

/// Content address of a manifest or blob, `algorithm:hex`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    hash_type: HashType,
    value: String,
}

impl Digest {
    /// Digest of `content` under the given algorithm.
    pub fn of(hash_type: HashType, content: &[u8]) -> Self {
        let value = hex::encode(hash_type.hash(content));
        Digest { hash_type, value }
    }

    /// Whether `content` hashes to this digest.
    pub fn matches(&self, content: &[u8]) -> bool {
        let computed = hex::encode(self.hash_type.hash(content));
        debug!("Computed {}: {}", self.hash_type, computed);
        computed.eq_ignore_ascii_case(&self.value)
    }

    fn from_str(value: &str) -> Option<Self> {
        let captures = DIGEST_RE.captures(value)?;

        let (_, [algorithm, digest]) = captures.extract();
        match (algorithm, digest.len()) {
            (SHA_256, 64) => Some(
                Digest { hash_type: HashType::Sha256, value: digest.to_string() }
            ),
            (SHA_256, _) => {
                debug!("Wrong length for sha256: {}", digest.len());
                None
            },

            (SHA_512, 128) => Some(
                Digest { hash_type: HashType::Sha512, value: digest.to_string() }
            ),
            (SHA_512, _) => {
                debug!("Wrong length for sha512: {}", digest.len());
                None
            },
            (a, _) => {
                debug!("Unrecognized digest algorithm: {}", a);
                None
            }
        }
    }
}

impl Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.hash_type, self.value)
    }
}

impl TryFrom<&str> for Digest {
    type Error = error::Error;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value).ok_or(Error::DigestInvalidError)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag(String);

impl Tag {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_str(value: &str) -> Option<Self> {
        TAG_RE.is_match(value).then(|| Tag(value.to_string()))
    }
}

impl TryFrom<&str> for Tag {
    type Error = error::Error;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value).ok_or(Error::TagInvalidError)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Digest(Digest),
    Tag(Tag),
}

impl TryFrom<&str> for Reference {
    type Error = error::Error;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if let Ok(digest) = Digest::try_from(value) {
            debug!("Reference \"{value}\" is a digest");
            return Ok(Self::Digest(digest));
        }

        if let Ok(tag) = Tag::try_from(value) {
            debug!("Reference \"{value}\" is a tag");
            return Ok(Self::Tag(tag));
        }

        debug!("Reference \"{value}\" is not a digest nor a tag");
        Err(Error::ReferenceInvalidError)
    }
}

impl From<Digest> for Reference {
    fn from(value: Digest) -> Self {
        Self::Digest(value)
    }
}

impl Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Digest(digest) => digest.fmt(f),
            Self::Tag(tag) => f.write_str(tag.as_str()),
        }
    }
}
