//! Unary gNMI client on tonic.

use std::time::Duration;

use log::debug;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::metadata::AsciiMetadataValue;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};

use super::proto::{GetRequest, GetResponse};
use crate::error::ConnectionError;
use crate::tls::TlsConfig;

const GET_PATH: &str = "/gnmi.gNMI/Get";

/// Connection parameters for [`GnmiClient::connect`].
pub struct ClientConfig<'a> {
    pub host: &'a str,
    pub port: u16,
    pub username: &'a str,
    pub password: &'a str,
    pub tls: TlsConfig,
    pub timeout: Duration,
}

/// gNMI client bound to one target.
#[derive(Debug, Clone)]
pub struct GnmiClient {
    inner: tonic::client::Grpc<Channel>,
    username: AsciiMetadataValue,
    password: AsciiMetadataValue,
}

fn metadata(field: &str, value: &str) -> Result<AsciiMetadataValue, ConnectionError> {
    value.parse().map_err(|_| ConnectionError::InvalidCredentials {
        message: format!("{field} is not valid gRPC metadata"),
    })
}

impl GnmiClient {
    /// Open the gRPC channel. Returns once the connection is established.
    ///
    /// With `tls.insecure` set the channel is plaintext HTTP/2. Otherwise it
    /// uses TLS against the platform's native roots, with the target host as
    /// the server name.
    ///
    /// # Arguments
    ///
    /// * `config` - Target address, credentials sent as `username` and
    ///   `password` metadata on every call, TLS settings and the timeout
    ///   applied to both the connect and each RPC.
    ///
    /// # Errors
    ///
    /// Credentials that cannot be carried as ASCII metadata are rejected
    /// before any I/O. Endpoint, TLS and connect failures map onto
    /// [`ConnectionError`].
    pub async fn connect(config: &ClientConfig<'_>) -> Result<Self, ConnectionError> {
        let username = metadata("username", config.username)?;
        let password = metadata("password", config.password)?;

        let host = crate::driver::url_host(config.host);
        let scheme = if config.tls.insecure { "http" } else { "https" };
        let uri = format!("{scheme}://{host}:{}", config.port);

        let mut endpoint = Endpoint::from_shared(uri.clone())
            .map_err(|e| ConnectionError::InvalidEndpoint {
                endpoint: uri.clone(),
                message: e.to_string(),
            })?
            .connect_timeout(config.timeout)
            .timeout(config.timeout);

        if !config.tls.insecure {
            let tls = ClientTlsConfig::new()
                .with_native_roots()
                .domain_name(config.host.trim_start_matches('[').trim_end_matches(']'));
            endpoint = endpoint.tls_config(tls)?;
        }

        debug!("gnmi: connecting to {}", uri);
        let channel = endpoint.connect().await?;

        Ok(Self {
            inner: tonic::client::Grpc::new(channel),
            username,
            password,
        })
    }

    /// Issue a unary `Get` and return the decoded response.
    ///
    /// Waits for the channel to become ready first. A channel that never
    /// does is reported as `UNAVAILABLE`.
    pub async fn get(&mut self, request: GetRequest) -> Result<GetResponse, tonic::Status> {
        self.inner
            .ready()
            .await
            .map_err(|e| tonic::Status::unavailable(format!("channel not ready: {e}")))?;

        let mut request = tonic::Request::new(request);
        let metadata = request.metadata_mut();
        metadata.insert("username", self.username.clone());
        metadata.insert("password", self.password.clone());

        let codec: ProstCodec<GetRequest, GetResponse> = ProstCodec::default();
        let response = self
            .inner
            .unary(request, PathAndQuery::from_static(GET_PATH), codec)
            .await?;
        Ok(response.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_ascii_credentials_rejected() {
        assert!(metadata("password", "pässword").is_err());
        assert!(metadata("password", "admin").is_ok());
    }

    #[tokio::test]
    async fn test_connect_refused_is_transport_error() {
        let config = ClientConfig {
            host: "127.0.0.1",
            port: 1,
            username: "admin",
            password: "admin",
            tls: TlsConfig {
                skip_verify: true,
                insecure: true,
            },
            timeout: Duration::from_secs(2),
        };
        let err = GnmiClient::connect(&config).await.unwrap_err();
        assert!(matches!(err, ConnectionError::Grpc(_)));
    }
}
