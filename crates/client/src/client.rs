//! Abstract storage client.
//!
//! One [`Client`] instance is bound to one URL. The engine obtains clients
//! through a [`ClientFactory`] and only ever calls the three operations
//! below; authentication, retries and backend quirks are the
//! implementation's business.

use std::io::Read;

use crate::ClientError;
use crate::types::Content;

/// A storage backend handle bound to a single URL.
pub trait Client: Send {
    /// Opens the object for reading and returns its byte stream and length.
    fn get(&self) -> Result<(Box<dyn Read + Send>, u64), ClientError>;

    /// Writes `length` bytes from `data` to the object.
    fn put(&self, length: u64, data: Box<dyn Read + Send>) -> Result<(), ClientError>;

    /// Returns metadata for the object or directory.
    fn stat(&self) -> Result<Content, ClientError>;
}

/// Creates [`Client`] handles from URLs.
///
/// Implementations parse the URL, detect the backend type and construct
/// the matching adapter. An empty or unparseable URL is rejected with
/// [`ClientError::InvalidUrl`].
pub trait ClientFactory: Send + Sync {
    fn client_for(&self, url: &str) -> Result<Box<dyn Client>, ClientError>;
}

/// Opens `url` for reading and returns its stream and length.
pub fn get_source(
    factory: &dyn ClientFactory,
    url: &str,
) -> Result<(Box<dyn Read + Send>, u64), ClientError> {
    let client = factory.client_for(url).map_err(|e| annotate(e, url))?;
    client.get().map_err(|e| annotate(e, url))
}

/// Writes `length` bytes from `data` to `url`.
pub fn put_target(
    factory: &dyn ClientFactory,
    url: &str,
    length: u64,
    data: Box<dyn Read + Send>,
) -> Result<(), ClientError> {
    let client = factory.client_for(url).map_err(|e| annotate(e, url))?;
    client.put(length, data).map_err(|e| annotate(e, url))
}

/// Stats `url` and returns its content metadata.
pub fn url_to_stat(factory: &dyn ClientFactory, url: &str) -> Result<Content, ClientError> {
    let client = factory.client_for(url).map_err(|e| annotate(e, url))?;
    client.stat().map_err(|e| annotate(e, url))
}

/// Tags an error with the URL that failed, unless it already carries one.
fn annotate(err: ClientError, url: &str) -> ClientError {
    match err {
        ClientError::Io(e) => ClientError::Backend {
            url: url.to_string(),
            message: e.to_string(),
        },
        other => other,
    }
}
