use log::info;
use std::process::{Command, Stdio};

use crate::{error::NcrError, NcrResult};

macro_rules! err {
    ($($arg:tt)+) => (Err(NcrError::Pull(format!($($arg)+))))
}

/// Fetches an image into the local container runtime.
pub trait Puller
{
    fn pull(&self, registry: &str, repository: &str, tag: &str) -> NcrResult<()>;
}

/// `{registry}/{repository}:{tag}`, where `registry` is a host with an optional port.
pub fn image_reference(registry: &str, repository: &str, tag: &str) -> String
{
    format!("{}/{}:{}", registry, repository, tag)
}

/// Runs `{program} pull <image>` with the terminal attached.
#[derive(Debug, Clone)]
pub struct CommandPuller
{
    program: String,
}

impl CommandPuller
{
    pub fn new(program: impl Into<String>) -> Self
    {
        Self {
            program: program.into(),
        }
    }
}

impl Puller for CommandPuller
{
    fn pull(&self, registry: &str, repository: &str, tag: &str) -> NcrResult<()>
    {
        let image = image_reference(registry, repository, tag);
        info!("Running: {} pull {}", self.program, image);

        let status = match Command::new(&self.program)
            .arg("pull")
            .arg(&image)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
        {
            Ok(status) => status,
            Err(e) => return err!("cannot run {}: {}", self.program, e),
        };

        if !status.success() {
            return err!("{} pull {} exited with {}", self.program, image, status);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn reference_layout()
    {
        assert_eq!(
            image_reference("registry.local:5000", "team/app", "v1"),
            "registry.local:5000/team/app:v1"
        );
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_decides()
    {
        assert!(CommandPuller::new("true").pull("registry.local", "app", "v1").is_ok());
        assert!(matches!(
            CommandPuller::new("false").pull("registry.local", "app", "v1"),
            Err(NcrError::Pull(_))
        ));
    }

    #[test]
    fn missing_runtime()
    {
        let puller = CommandPuller::new("ncr-test-no-such-runtime");
        assert!(matches!(puller.pull("registry.local", "app", "v1"), Err(NcrError::Pull(_))));
    }
}
