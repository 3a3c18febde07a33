use si_wsdl::{QName, SoapVersion};
use tracing::{debug, warn};

use crate::{
    envelope::{self, Envelope, ResponseBody},
    error::InvokeError,
    headers::HandlerChain,
    transport::{Transport, WireRequest},
    xml::XmlDocument,
};

/// A payload-mode channel bound to one port: callers exchange body payloads, the channel
/// deals with envelopes.
pub struct Dispatch {
    endpoint: String,
    version: SoapVersion,
    operation: Option<QName>,
    soap_action: String,
    handlers: HandlerChain,
    transport: Box<dyn Transport>,
}

impl Dispatch {
    pub fn new(
        endpoint: String,
        version: SoapVersion,
        handlers: HandlerChain,
        transport: Box<dyn Transport>,
    ) -> Self {
        Self {
            endpoint,
            version,
            operation: None,
            soap_action: String::new(),
            handlers,
            transport,
        }
    }

    /// Sets the operation identity sent with every call.
    pub fn set_operation(&mut self, operation: QName, soap_action: Option<String>) {
        self.operation = Some(operation);
        self.soap_action = soap_action.unwrap_or_default();
    }

    pub fn set_endpoint(&mut self, endpoint: String) {
        self.endpoint = endpoint;
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn http_headers(&self) -> Vec<(String, String)> {
        match self.version {
            SoapVersion::Soap11 => vec![
                (
                    "Content-Type".to_string(),
                    self.version.content_type().to_string(),
                ),
                ("SOAPAction".to_string(), format!("\"{}\"", self.soap_action)),
            ],
            SoapVersion::Soap12 if self.soap_action.is_empty() => vec![(
                "Content-Type".to_string(),
                self.version.content_type().to_string(),
            )],
            SoapVersion::Soap12 => vec![(
                "Content-Type".to_string(),
                format!("{}; action=\"{}\"", self.version.content_type(), self.soap_action),
            )],
        }
    }

    /// Sends `payload` and returns the response payload.
    pub fn invoke(&self, payload: &XmlDocument) -> Result<XmlDocument, InvokeError> {
        let mut envelope = Envelope::wrap(self.version, payload.root().clone());
        self.handlers.handle_message(&mut envelope)?;

        let body = envelope.to_xml().map_err(|source| InvokeError::Envelope {
            endpoint: self.endpoint.clone(),
            source,
        })?;
        let request = WireRequest {
            endpoint: self.endpoint.clone(),
            headers: self.http_headers(),
            body,
        };

        debug!(endpoint = %self.endpoint, operation = ?self.operation, "dispatching");
        let response = self
            .transport
            .send(&request)
            .map_err(|source| InvokeError::Transport {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        let http_status = || InvokeError::HttpStatus {
            endpoint: self.endpoint.clone(),
            status: response.status,
        };

        match envelope::parse_response(&response.body) {
            Ok(ResponseBody::Payload(payload)) if response.is_success() => {
                Ok(XmlDocument::new(payload))
            }
            Ok(ResponseBody::Fault { fault, element }) => {
                if self.handlers.handle_fault(&fault) {
                    Err(fault.into())
                } else {
                    warn!(code = %fault.code, "SOAP fault suppressed by handler");
                    Ok(XmlDocument::new(element))
                }
            }
            Ok(ResponseBody::Empty) if response.is_success() => Err(InvokeError::EmptyBody {
                endpoint: self.endpoint.clone(),
            }),
            Ok(_) => Err(http_status()),
            Err(_) if !response.is_success() => Err(http_status()),
            Err(source) => Err(InvokeError::MalformedResponse {
                endpoint: self.endpoint.clone(),
                source,
            }),
        }
    }
}
