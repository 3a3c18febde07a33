use std::{
    fs,
    path::{Path, PathBuf},
};

use si_wsdl::{QName, WsdlSource};
use tracing::{debug, info, Level};

use crate::{
    config::InvocationConfig,
    dispatch::Dispatch,
    error::InvokeError,
    headers::{HandlerChain, HeaderInjector},
    port::PortSelection,
    transport::{LoggingTransport, Transport},
    xml::{XmlAdapter, XmlDocument},
};

pub const REQUEST_FILE: &str = "request.xml";
pub const RESPONSE_FILE: &str = "response.xml";

/// One persisted request/response pair.
#[derive(Clone, Debug)]
pub struct ExchangeRecord {
    pub request: XmlDocument,
    pub response: XmlDocument,
    pub request_file: PathBuf,
    pub response_file: PathBuf,
}

pub struct ServiceInvoker<'a> {
    adapter: &'a XmlAdapter,
    request: XmlDocument,
    dispatch: Dispatch,
    execution_dir: PathBuf,
}

impl<'a> ServiceInvoker<'a> {
    /// Resolves the service and port, checks the request and header fragments, prepares the
    /// channel and the execution directory. Nothing is sent yet.
    pub fn connect(
        config: &InvocationConfig,
        adapter: &'a XmlAdapter,
        transport: Box<dyn Transport>,
        execution_id: &str,
    ) -> Result<Self, InvokeError> {
        config.validate()?;

        let definitions = WsdlSource::parse(&config.wsdl)?.load(config.allow_dtd)?;
        let transport: Box<dyn Transport> = if tracing::enabled!(Level::DEBUG) {
            Box::new(LoggingTransport::new(transport))
        } else {
            transport
        };

        let port = PortSelection::resolve(
            &definitions,
            &config.namespace,
            &config.service,
            config.port.as_deref(),
        )?;
        let soap_action = port.operation(&config.operation)?.soap_action.clone();

        let request = adapter
            .fragment(&config.request)
            .map_err(|source| InvokeError::Fragment {
                what: "request",
                xml: config.request.describe(),
                source,
            })?;
        let mut handlers = HandlerChain::default();
        if !config.headers.is_empty() {
            handlers.push(HeaderInjector::new(adapter, &config.headers)?);
        }

        // a configured endpoint supersedes this below
        let address = port
            .address
            .clone()
            .or_else(|| config.endpoint.clone())
            .ok_or_else(|| InvokeError::NoAddress {
                port: port.port.to_string(),
            })?;
        let mut dispatch = Dispatch::new(address, port.version, handlers, transport);

        let execution_dir = config.output_dir.join(execution_id);
        fs::create_dir_all(&execution_dir).map_err(|source| InvokeError::CreateDir {
            path: execution_dir.clone(),
            source,
        })?;

        dispatch.set_operation(
            QName::new(config.namespace.as_str(), config.operation.as_str()),
            soap_action,
        );
        if let Some(endpoint) = &config.endpoint {
            dispatch.set_endpoint(endpoint.clone());
        }

        info!(
            port = %port.port,
            endpoint = dispatch.endpoint(),
            operation = %config.operation,
            "connected to SOAP service"
        );

        Ok(Self {
            adapter,
            request,
            dispatch,
            execution_dir,
        })
    }

    pub fn execution_dir(&self) -> &Path {
        &self.execution_dir
    }

    /// Sends the configured request once. Both files are overwritten on every call.
    pub fn invoke(&self) -> Result<ExchangeRecord, InvokeError> {
        let request = self.request.clone();
        let request_file = self.persist("SOAP request", &request, REQUEST_FILE)?;

        let response = self.dispatch.invoke(&request)?;
        let response_file = self.persist("SOAP response", &response, RESPONSE_FILE)?;

        Ok(ExchangeRecord {
            request,
            response,
            request_file,
            response_file,
        })
    }

    fn persist(
        &self,
        what: &'static str,
        document: &XmlDocument,
        file_name: &str,
    ) -> Result<PathBuf, InvokeError> {
        let path = self.execution_dir.join(file_name);
        let persist_error = |source| InvokeError::Persist {
            what,
            path: path.clone(),
            source,
        };

        self.adapter
            .write_file(document, &path)
            .map_err(persist_error)?;

        if tracing::enabled!(Level::DEBUG) {
            let xml = document.to_xml().map_err(persist_error)?;
            debug!(file = %path.display(), "{what}: {xml}");
        }
        Ok(path)
    }
}
