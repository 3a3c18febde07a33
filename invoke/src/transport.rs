use reqwest::blocking::Client;
use tracing::debug;

use crate::error::TransportError;

/// One HTTP exchange as seen on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireRequest {
    pub endpoint: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireResponse {
    pub status: u16,
    pub body: String,
}

impl WireResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait Transport {
    fn send(&self, request: &WireRequest) -> Result<WireResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: &WireRequest) -> Result<WireResponse, TransportError> {
        (**self).send(request)
    }
}

/// Blocking HTTP transport. Timeouts are the client defaults; nothing is retried.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        Ok(Self {
            client: Client::builder().build()?,
        })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &WireRequest) -> Result<WireResponse, TransportError> {
        let mut builder = self.client.post(&request.endpoint);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        // SOAP faults come back as 500, so the status is not turned into an error here
        let response = builder.body(request.body.clone()).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(WireResponse { status, body })
    }
}

/// Logs every request and response passing through `inner` at debug level.
pub struct LoggingTransport<T> {
    inner: T,
}

impl<T: Transport> LoggingTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

impl<T: Transport> Transport for LoggingTransport<T> {
    fn send(&self, request: &WireRequest) -> Result<WireResponse, TransportError> {
        debug!(
            endpoint = %request.endpoint,
            headers = ?request.headers,
            "Outbound SOAP message: {}",
            request.body
        );
        let response = self.inner.send(request);
        match &response {
            Ok(response) => debug!(
                status = response.status,
                "Inbound SOAP message: {}",
                response.body
            ),
            Err(err) => debug!(error = %err, "SOAP exchange failed"),
        }
        response
    }
}
