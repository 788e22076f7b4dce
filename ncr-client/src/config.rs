use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub(crate) username: String,
    pub(crate) password: String,
}

pub struct Config {
    pub(crate) host: String,
    pub(crate) credentials: Option<Credentials>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) accept_invalid_certs: bool,
}

impl Config {
    pub fn builder() -> ConfigBuilder<WantsHost> {
        ConfigBuilder {
            state: WantsHost {}
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

pub struct ConfigBuilder<S> {
    state: S,
}

pub struct WantsHost {}

pub struct WantsCredentials {
    host: String,
}

pub struct Ready {
    host: String,
    credentials: Option<Credentials>,
    timeout: Option<Duration>,
    accept_invalid_certs: bool,
}

impl ConfigBuilder<WantsHost> {
    /// Registry base url, with or without scheme. A missing scheme means https.
    pub fn host(self, host: impl Into<String>) -> ConfigBuilder<WantsCredentials> {
        ConfigBuilder {
            state: WantsCredentials {
                host: host.into(),
            }
        }
    }
}

impl ConfigBuilder<WantsCredentials> {
    pub fn basic_auth(self, username: impl Into<String>, password: impl Into<String>) -> ConfigBuilder<Ready> {
        let credentials = Credentials {
            username: username.into(),
            password: password.into(),
        };
        self.with_credentials(Some(credentials))
    }

    pub fn anonymous(self) -> ConfigBuilder<Ready> {
        self.with_credentials(None)
    }

    fn with_credentials(self, credentials: Option<Credentials>) -> ConfigBuilder<Ready> {
        ConfigBuilder {
            state: Ready {
                host: self.state.host,
                credentials,
                timeout: None,
                accept_invalid_certs: false,
            }
        }
    }
}

impl ConfigBuilder<Ready> {
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.state.timeout = timeout;
        self
    }

    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.state.accept_invalid_certs = accept;
        self
    }

    pub fn build(self) -> Config {
        let Ready { host, credentials, timeout, accept_invalid_certs } = self.state;
        Config {
            host,
            credentials,
            timeout,
            accept_invalid_certs,
        }
    }
}
