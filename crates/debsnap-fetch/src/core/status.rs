/// How the downloader treats a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 200: the complete body from offset zero.
    Full,
    /// 206: the remainder of a ranged request.
    Partial,
    /// 404: terminal absence, never retried.
    NotFound,
    /// Anything else; retried as a generic HTTP error.
    Error,
}

pub fn classify_status(status: u16) -> StatusClass {
    match status {
        200 => StatusClass::Full,
        206 => StatusClass::Partial,
        404 => StatusClass::NotFound,
        _ => StatusClass::Error,
    }
}

/// `Range` header value resuming after `offset` received bytes.
pub fn range_header(offset: u64) -> String {
    format!("bytes={offset}-")
}
