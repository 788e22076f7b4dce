#[derive(Debug)]
pub enum NcrError
{
    IO(std::io::Error),
    Yaml(serde_yaml::Error),
    Pull(String),
    Generic(String),
}

impl std::error::Error for NcrError {}

impl std::fmt::Display for NcrError
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        match self {
            NcrError::IO(e) => write!(f, "{}", e),
            NcrError::Yaml(e) => write!(f, "invalid registry store: {}", e),
            NcrError::Pull(s) => write!(f, "pull failed: {}", s),
            NcrError::Generic(s) => write!(f, "{}", s),
        }
    }
}

impl From<std::io::Error> for NcrError
{
    fn from(value: std::io::Error) -> Self
    {
        Self::IO(value)
    }
}

impl From<serde_yaml::Error> for NcrError
{
    fn from(value: serde_yaml::Error) -> Self
    {
        Self::Yaml(value)
    }
}

impl From<&'static str> for NcrError
{
    fn from(value: &'static str) -> Self
    {
        NcrError::Generic(value.to_string())
    }
}
