use thiserror::Error;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum IndexError {
    #[error("Package {0} not found in index")]
    PkgNotFound(String),
}
