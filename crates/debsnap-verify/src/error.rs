#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown hash algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("hash algorithm '{0}' is not compiled in")]
    Disabled(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
