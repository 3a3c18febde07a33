use std::{collections::BTreeMap, path::PathBuf, time::Duration};

use url::Url;

use crate::{error::InvokeError, xml::XmlFragment};

pub const DEFAULT_REPEAT_INTERVAL: Duration = Duration::from_millis(5000);
pub const DEFAULT_OUTPUT_DIR: &str = "target";

/// Everything needed to invoke one operation. Built once, never changed during a run.
#[derive(Clone, Debug)]
pub struct InvocationConfig {
    /// WSDL location: a path, a `file:` URL or an `http(s):` URL.
    pub wsdl: String,
    pub namespace: String,
    pub service: String,
    pub operation: String,
    pub port: Option<String>,
    pub endpoint: Option<String>,
    pub request: XmlFragment,
    pub headers: Vec<XmlFragment>,
    /// Property name to XPath expression.
    pub properties: BTreeMap<String, String>,
    /// Prefix to namespace URI, bound in every XPath expression.
    pub namespaces: BTreeMap<String, String>,
    pub repeat_until: Option<String>,
    pub repeat_interval: Duration,
    pub output_dir: PathBuf,
    pub allow_dtd: bool,
}

impl InvocationConfig {
    pub fn new(
        wsdl: impl Into<String>,
        namespace: impl Into<String>,
        service: impl Into<String>,
        operation: impl Into<String>,
        request: XmlFragment,
    ) -> Self {
        Self {
            wsdl: wsdl.into(),
            namespace: namespace.into(),
            service: service.into(),
            operation: operation.into(),
            port: None,
            endpoint: None,
            request,
            headers: Vec::new(),
            properties: BTreeMap::new(),
            namespaces: BTreeMap::new(),
            repeat_until: None,
            repeat_interval: DEFAULT_REPEAT_INTERVAL,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            allow_dtd: false,
        }
    }

    pub fn validate(&self) -> Result<(), InvokeError> {
        let required = [
            ("wsdl", &self.wsdl),
            ("namespace", &self.namespace),
            ("service", &self.service),
            ("operation", &self.operation),
        ];
        if let Some((name, _)) = required
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
        {
            return Err(InvokeError::MissingConfiguration(name));
        }
        if matches!(&self.request, XmlFragment::Text(xml) if xml.trim().is_empty()) {
            return Err(InvokeError::MissingConfiguration("request"));
        }
        if let Some(endpoint) = &self.endpoint {
            Url::parse(endpoint).map_err(|source| InvokeError::InvalidEndpoint {
                endpoint: endpoint.clone(),
                source,
            })?;
        }
        Ok(())
    }
}
