#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{method} {url} failed: {message}")]
    Request {
        method: String,
        url: String,
        message: String,
    },

    #[error("{method} {url} returned HTTP {status}")]
    Status {
        method: String,
        url: String,
        status: u16,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}
