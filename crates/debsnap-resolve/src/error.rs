use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid package query: {0}")]
    InvalidQuery(String),

    #[error("mirror kept failing for {url}")]
    ExhaustedRetries { url: String },

    #[error(transparent)]
    Hash(#[from] debsnap_verify::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("failed to run '{program}': {source}")]
    Spawn { program: String, source: io::Error },

    #[error("listing '{url}' failed with {status}: {stderr}")]
    Failed {
        url: String,
        status: String,
        stderr: String,
    },

    #[error("mirror listing returned no files")]
    Empty,
}

pub type Result<T> = std::result::Result<T, Error>;
