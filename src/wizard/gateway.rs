use std::time::Duration;

/// Failure talking to an outbound collaborator.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{endpoint} request failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} responded with HTTP {status}")]
    Status { endpoint: &'static str, status: u16 },
    #[error("{endpoint} returned an unusable body: {detail}")]
    Decode {
        endpoint: &'static str,
        detail: String,
    },
    #[error("{0}")]
    Unavailable(String),
}

pub(crate) fn http_client(timeout: Option<Duration>) -> Result<reqwest::Client, GatewayError> {
    let mut builder = reqwest::Client::builder().user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(|source| GatewayError::Transport {
        endpoint: "http client",
        source,
    })
}
