//! Menu flow of the browser.
//!
//! The operator walks registry → repository → tag → action. Every state
//! carries the selections made so far, so going back never needs globals
//! and a failure can fall back to the closest list that is still valid.

use log::{debug, info};
use std::fmt::Display;
use std::io;
use std::time::Duration;

use ncr_client::{aggregate_now, host_and_port, Client, Config, Digest, RegistryApi, TagSummary};

use crate::error::NcrError;
use crate::prompt::Prompter;
use crate::pull::{image_reference, Puller};
use crate::store::{normalize_url, RegistryEntry, RegistryStore};
use crate::NcrResult;

pub const BACK: &str = "../";
pub const DEAD_END_PAUSE: Duration = Duration::from_secs(2);

const ADD_REGISTRY: &str = "Add registry";
const REMOVE_REGISTRY: &str = "Remove registry";
const CONNECT_REGISTRY: &str = "Connect to registry";
const EXIT: &str = "Exit";
const MAIN_MENU: [&str; 4] = [ADD_REGISTRY, REMOVE_REGISTRY, CONNECT_REGISTRY, EXIT];

const PULL: &str = "Pull";
const DELETE: &str = "Delete";
const YES: &str = "Yes";
const NO: &str = "No";

const NO_REGISTRIES: &str = "No registries found. Please add a registry first.";
const NO_REPOSITORIES: &str = "No repositories found in this registry.";
const NO_TAGS: &str = "No tags found for this repository.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum State
{
    MainMenu,
    AddRegistry,
    RemoveRegistry,
    RegistryList,
    RepositoryList
    {
        registry: RegistryEntry,
    },
    TagList
    {
        registry: RegistryEntry,
        repository: String,
    },
    ActionMenu
    {
        registry: RegistryEntry,
        repository: String,
        tag: String,
    },
    Pull
    {
        registry: RegistryEntry,
        repository: String,
        tag: String,
    },
    DeleteConfirm
    {
        registry: RegistryEntry,
        repository: String,
        tag: String,
    },
    Exit,
}

impl State
{
    /// Where `../` (or Esc) leads. Drops the selection made in this state.
    pub fn back(self) -> State
    {
        match self {
            State::MainMenu => State::MainMenu,
            State::AddRegistry | State::RemoveRegistry | State::RegistryList => State::MainMenu,
            State::RepositoryList { .. } => State::RegistryList,
            State::TagList { registry, .. } => State::RepositoryList { registry },
            State::ActionMenu {
                registry,
                repository,
                ..
            } => State::TagList {
                registry,
                repository,
            },
            State::Pull {
                registry,
                repository,
                tag,
            }
            | State::DeleteConfirm {
                registry,
                repository,
                tag,
            } => State::ActionMenu {
                registry,
                repository,
                tag,
            },
            State::Exit => State::Exit,
        }
    }

    pub fn name(&self) -> &'static str
    {
        match self {
            State::MainMenu => "main menu",
            State::AddRegistry => "add registry",
            State::RemoveRegistry => "remove registry",
            State::RegistryList => "registry list",
            State::RepositoryList { .. } => "repository list",
            State::TagList { .. } => "tag list",
            State::ActionMenu { .. } => "action menu",
            State::Pull { .. } => "pull",
            State::DeleteConfirm { .. } => "delete confirmation",
            State::Exit => "exit",
        }
    }
}

/// Opens a registry session for a stored entry.
pub trait Connector
{
    type Api: RegistryApi;

    fn connect(&self, entry: &RegistryEntry) -> Result<Self::Api, ncr_client::Error>;
}

/// Talks HTTP to the registry named by the entry.
#[derive(Debug, Clone)]
pub struct HttpConnector
{
    timeout: Option<Duration>,
    accept_invalid_certs: bool,
}

impl HttpConnector
{
    pub fn new(timeout: Option<Duration>, accept_invalid_certs: bool) -> Self
    {
        Self {
            timeout,
            accept_invalid_certs,
        }
    }
}

impl Connector for HttpConnector
{
    type Api = Client;

    fn connect(&self, entry: &RegistryEntry) -> Result<Client, ncr_client::Error>
    {
        let config = Config::builder()
            .host(entry.url.clone())
            .basic_auth(&entry.username, &entry.password)
            .timeout(self.timeout)
            .accept_invalid_certs(self.accept_invalid_certs)
            .build();

        Client::from_config(config)
    }
}

enum Choice
{
    Back,
    Item(usize),
}

pub struct Navigator<'a, P, C, L>
{
    store: &'a mut RegistryStore,
    prompter: P,
    connector: C,
    puller: L,
    pause: Duration,
}

impl<'a, P, C, L> Navigator<'a, P, C, L>
where
    P: Prompter,
    C: Connector,
    L: Puller,
{
    pub fn new(store: &'a mut RegistryStore, prompter: P, connector: C, puller: L) -> Self
    {
        Self {
            store,
            prompter,
            connector,
            puller,
            pause: DEAD_END_PAUSE,
        }
    }

    /// How long dead-end messages stay on screen.
    pub fn with_pause(mut self, pause: Duration) -> Self
    {
        self.pause = pause;
        self
    }

    #[cfg(test)]
    pub fn prompter(&self) -> &P
    {
        &self.prompter
    }

    #[cfg(test)]
    pub fn puller(&self) -> &L
    {
        &self.puller
    }

    #[cfg(test)]
    pub fn store(&self) -> &RegistryStore
    {
        self.store
    }

    /// Drives the menus from the main menu until the operator exits.
    pub fn run(&mut self) -> NcrResult<()>
    {
        let mut state = State::MainMenu;
        while state != State::Exit {
            state = self.step(state)?;
        }

        info!("Bye");
        Ok(())
    }

    /// Handles one state and returns the next. Only prompt and store
    /// failures come back as errors, registry failures are reported and
    /// navigation continues. A handler returning `None` goes back.
    pub fn step(&mut self, state: State) -> NcrResult<State>
    {
        debug!("Entering {}", state.name());

        let current = state.clone();
        let next = match state {
            State::MainMenu => self.main_menu(),
            State::AddRegistry => self.add_registry(),
            State::RemoveRegistry => self.remove_registry(),
            State::RegistryList => self.registry_list(),
            State::RepositoryList { registry } => self.repository_list(registry),
            State::TagList {
                registry,
                repository,
            } => self.tag_list(registry, repository),
            State::ActionMenu {
                registry,
                repository,
                tag,
            } => self.action_menu(registry, repository, tag),
            State::Pull {
                registry,
                repository,
                tag,
            } => self.pull(registry, repository, tag),
            State::DeleteConfirm {
                registry,
                repository,
                tag,
            } => self.delete_confirm(registry, repository, tag),
            State::Exit => Ok(Some(State::Exit)),
        };

        match next {
            Ok(Some(next)) => Ok(next),
            Ok(None) => Ok(current.back()),
            Err(NcrError::IO(e)) if e.kind() == io::ErrorKind::Interrupted => {
                info!("Interrupted");
                Ok(State::Exit)
            }
            Err(e) => Err(e),
        }
    }

    fn choose(&mut self, label: &str, items: &[String]) -> NcrResult<Choice>
    {
        let mut shown = Vec::with_capacity(items.len() + 1);
        shown.push(BACK.to_string());
        shown.extend(items.iter().cloned());

        Ok(match self.prompter.select(label, &shown)? {
            Some(i) if i > 0 && i <= items.len() => Choice::Item(i - 1),
            _ => Choice::Back,
        })
    }

    fn dead_end(&mut self, text: &str)
    {
        self.prompter.message(text);
        self.prompter.pause(self.pause);
    }

    fn report(&mut self, context: &str, error: &dyn Display)
    {
        debug!("{}: {}", context, error);
        self.dead_end(&format!("{}: {}", context, error));
    }

    fn registry_names(&self) -> Vec<String>
    {
        self.store
            .entries()
            .iter()
            .map(|e| e.display_name().to_string())
            .collect()
    }

    fn main_menu(&mut self) -> NcrResult<Option<State>>
    {
        self.prompter.clear();

        let items: Vec<String> = MAIN_MENU.iter().map(|s| s.to_string()).collect();
        let chosen = self
            .prompter
            .select("Main Menu", &items)?
            .and_then(|i| MAIN_MENU.get(i).copied());

        Ok(match chosen {
            Some(ADD_REGISTRY) => Some(State::AddRegistry),
            Some(REMOVE_REGISTRY) => Some(State::RemoveRegistry),
            Some(CONNECT_REGISTRY) => Some(State::RegistryList),
            Some(EXIT) => Some(State::Exit),
            _ => None,
        })
    }

    fn add_registry(&mut self) -> NcrResult<Option<State>>
    {
        let Some(url) = self.prompter.input("Registry URL")? else {
            return Ok(None);
        };
        if url.trim().is_empty() {
            self.dead_end("Registry URL cannot be empty.");
            return Ok(Some(State::MainMenu));
        }
        let Some(username) = self.prompter.input("Registry Username")? else {
            return Ok(None);
        };
        let Some(password) = self.prompter.password("Registry Password")? else {
            return Ok(None);
        };

        let entry = RegistryEntry {
            url: normalize_url(&url),
            username,
            password,
        };
        let name = entry.display_name().to_string();
        self.store.add(entry)?;
        self.prompter.message(&format!("Registry {} added.", name));

        Ok(Some(State::MainMenu))
    }

    fn remove_registry(&mut self) -> NcrResult<Option<State>>
    {
        if self.store.is_empty() {
            self.dead_end(NO_REGISTRIES);
            return Ok(Some(State::MainMenu));
        }

        let names = self.registry_names();
        if let Choice::Item(i) = self.choose("Select Registry to remove", &names)? {
            if let Some(removed) = self.store.remove(i)? {
                self.prompter
                    .message(&format!("Registry {} removed.", removed.display_name()));
            }
        }

        Ok(Some(State::MainMenu))
    }

    fn registry_list(&mut self) -> NcrResult<Option<State>>
    {
        if self.store.is_empty() {
            self.dead_end(NO_REGISTRIES);
            return Ok(Some(State::MainMenu));
        }

        let names = self.registry_names();
        Ok(match self.choose("Select Registry", &names)? {
            Choice::Item(i) => self.store.get(i).map(|registry| State::RepositoryList {
                registry: registry.clone(),
            }),
            Choice::Back => None,
        })
    }

    fn repository_list(&mut self, registry: RegistryEntry) -> NcrResult<Option<State>>
    {
        let repositories = match self
            .connector
            .connect(&registry)
            .and_then(|api| api.list_repositories())
        {
            Ok(repositories) => repositories,
            Err(e) => {
                self.report("Failed to fetch repositories", &e);
                return Ok(Some(State::RegistryList));
            }
        };

        if repositories.is_empty() {
            self.dead_end(NO_REPOSITORIES);
            return Ok(Some(State::RegistryList));
        }

        Ok(match self.choose("Select Repository", &repositories)? {
            Choice::Item(i) => Some(State::TagList {
                registry,
                repository: repositories[i].clone(),
            }),
            Choice::Back => None,
        })
    }

    fn tag_summaries(&mut self, registry: &RegistryEntry, repository: &str) -> Result<Option<Vec<TagSummary>>, ncr_client::Error>
    {
        let api = self.connector.connect(registry)?;
        let tags = api.list_tags(repository)?;
        if tags.is_empty() {
            return Ok(None);
        }

        self.prompter
            .message(&format!("Fetching details for {} tags...", tags.len()));
        aggregate_now(&api, repository, &tags).map(Some)
    }

    fn tag_list(&mut self, registry: RegistryEntry, repository: String) -> NcrResult<Option<State>>
    {
        let summaries = match self.tag_summaries(&registry, &repository) {
            Ok(Some(summaries)) => summaries,
            Ok(None) => {
                self.dead_end(NO_TAGS);
                return Ok(Some(State::RepositoryList { registry }));
            }
            Err(e) => {
                self.report("Failed to fetch tags", &e);
                return Ok(Some(State::RepositoryList { registry }));
            }
        };

        let labels: Vec<String> = summaries.iter().map(TagSummary::label).collect();
        Ok(match self.choose("Select Tag", &labels)? {
            Choice::Item(i) => Some(State::ActionMenu {
                registry,
                repository,
                tag: summaries[i].tag().to_string(),
            }),
            Choice::Back => None,
        })
    }

    fn action_menu(&mut self, registry: RegistryEntry, repository: String, tag: String) -> NcrResult<Option<State>>
    {
        let actions = vec![PULL.to_string(), DELETE.to_string()];
        let label = format!("Select Action for {}:{}", repository, tag);

        Ok(match self.choose(&label, &actions)? {
            Choice::Item(0) => Some(State::Pull {
                registry,
                repository,
                tag,
            }),
            Choice::Item(_) => Some(State::DeleteConfirm {
                registry,
                repository,
                tag,
            }),
            Choice::Back => None,
        })
    }

    fn pull(&mut self, registry: RegistryEntry, repository: String, tag: String) -> NcrResult<Option<State>>
    {
        match host_and_port(&registry.url) {
            Ok(host) => {
                self.prompter
                    .message(&format!("Pulling {}...", image_reference(&host, &repository, &tag)));
                match self.puller.pull(&host, &repository, &tag) {
                    Ok(()) => self.prompter.message("Pull complete."),
                    Err(e) => self.report("Failed to pull image", &e),
                }
            }
            Err(e) => self.report("Failed to pull image", &e),
        }

        Ok(Some(State::TagList {
            registry,
            repository,
        }))
    }

    fn delete_manifest(&mut self, registry: &RegistryEntry, repository: &str, tag: &str) -> Result<Digest, ncr_client::Error>
    {
        let api = self.connector.connect(registry)?;
        let manifest = api.get_manifest(repository, tag)?;

        self.prompter
            .message(&format!("Deleting {}@{}...", repository, manifest.digest()));
        api.delete_manifest(repository, manifest.digest())?;

        Ok(manifest.digest().clone())
    }

    fn delete_confirm(&mut self, registry: RegistryEntry, repository: String, tag: String) -> NcrResult<Option<State>>
    {
        let answers = vec![YES.to_string(), NO.to_string()];
        let label = format!("Delete {}:{}? Are you sure?", repository, tag);

        if self.prompter.select(&label, &answers)? != Some(0) {
            return Ok(None);
        }

        match self.delete_manifest(&registry, &repository, &tag) {
            Ok(digest) => {
                info!("Deleted {}@{}", repository, digest);
                self.dead_end("Delete successful.");
            }
            Err(e) => self.report("Failed to delete image", &e),
        }

        Ok(Some(State::TagList {
            registry,
            repository,
        }))
    }
}
