use std::{io, path::PathBuf};

use si_wsdl::WsdlError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("malformed XML")]
    Parse(#[from] roxmltree::Error),
    #[error("unable to serialise XML: {0}")]
    Write(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("not a SOAP envelope: {0}")]
    NotEnvelope(String),
    #[error("invalid XPath expression `{expression}`: {reason}")]
    Compile { expression: String, reason: String },
    #[error("unable to evaluate XPath expression `{expression}`: {reason}")]
    Evaluate { expression: String, reason: String },
    #[error("XPath expression `{expression}` yields a {kind}, expected a boolean")]
    NotBoolean {
        expression: String,
        kind: &'static str,
    },
}

impl XmlError {
    pub(crate) fn write(err: impl std::fmt::Display) -> Self {
        Self::Write(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Other(String),
}

/// A fault returned in the body of a SOAP response.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("SOAP fault `{code}`: {reason}")]
pub struct SoapFault {
    pub code: String,
    pub reason: String,
    pub detail: Option<String>,
}

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("missing required configuration `{0}`")]
    MissingConfiguration(&'static str),
    #[error("endpoint `{endpoint}` is not a valid URL")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
    #[error(transparent)]
    Wsdl(#[from] WsdlError),
    #[error("service `{service}` is not declared in namespace `{namespace}`")]
    ServiceNotFound { namespace: String, service: String },
    #[error("service `{service}` declares no port, must specify one")]
    NoPort { service: String },
    #[error("service `{service}` declares ambiguous ports {ports:?}, must specify one")]
    AmbiguousPort { service: String, ports: Vec<String> },
    #[error("port `{port}` is not declared by service `{service}`")]
    PortNotFound { service: String, port: String },
    #[error("binding `{0}` is not declared")]
    BindingNotFound(String),
    #[error("operation `{operation}` is not declared by binding `{binding}`")]
    OperationNotFound { binding: String, operation: String },
    #[error("port `{port}` declares no address and no endpoint is configured")]
    NoAddress { port: String },
    #[error("unable to parse {what} XML: `{xml}`")]
    Fragment {
        what: &'static str,
        xml: String,
        #[source]
        source: XmlError,
    },
    #[error("unable to create directory `{}`", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unable to write {what} to file `{}`", .path.display())]
    Persist {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: XmlError,
    },
    #[error("unable to serialise the request envelope for `{endpoint}`")]
    Envelope {
        endpoint: String,
        #[source]
        source: XmlError,
    },
    #[error("SOAP call to `{endpoint}` failed")]
    Transport {
        endpoint: String,
        #[source]
        source: TransportError,
    },
    #[error("SOAP call to `{endpoint}` returned HTTP status {status}")]
    HttpStatus { endpoint: String, status: u16 },
    #[error("unable to read the SOAP response from `{endpoint}`")]
    MalformedResponse {
        endpoint: String,
        #[source]
        source: XmlError,
    },
    #[error("SOAP response from `{endpoint}` has an empty body")]
    EmptyBody { endpoint: String },
    #[error(transparent)]
    Fault(#[from] SoapFault),
    #[error("invalid repeat condition")]
    Condition(#[source] XmlError),
    #[error("unable to extract property `{name}`")]
    Property {
        name: String,
        #[source]
        source: XmlError,
    },
}
