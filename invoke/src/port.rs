use si_wsdl::{Binding, BindingOperation, Definitions, QName, SoapVersion};

use crate::error::InvokeError;

/// The port a dispatch channel is bound to, with what its binding says about dispatching.
#[derive(Clone, Debug)]
pub struct PortSelection {
    pub port: QName,
    pub address: Option<String>,
    pub version: SoapVersion,
    pub binding: Binding,
}

impl PortSelection {
    /// Picks the configured port, or the only port the service declares.
    pub fn resolve(
        definitions: &Definitions,
        namespace: &str,
        service_name: &str,
        port_name: Option<&str>,
    ) -> Result<Self, InvokeError> {
        let service_not_found = || InvokeError::ServiceNotFound {
            namespace: namespace.to_string(),
            service: service_name.to_string(),
        };
        let service = definitions
            .service(namespace, service_name)
            .ok_or_else(service_not_found)?;

        let port = match port_name {
            Some(port_name) => {
                service
                    .port(port_name)
                    .ok_or_else(|| InvokeError::PortNotFound {
                        service: service_name.to_string(),
                        port: port_name.to_string(),
                    })?
            }
            None => match service.ports.as_slice() {
                [] => {
                    return Err(InvokeError::NoPort {
                        service: service_name.to_string(),
                    })
                }
                [port] => port,
                ports => {
                    return Err(InvokeError::AmbiguousPort {
                        service: service_name.to_string(),
                        ports: ports.iter().map(|p| p.name.clone()).collect(),
                    })
                }
            },
        };

        let binding = definitions
            .binding(&port.binding)
            .ok_or_else(|| InvokeError::BindingNotFound(port.binding.to_string()))?;
        let version = binding
            .soap_version
            .or(port.address_version)
            .unwrap_or(SoapVersion::Soap11);

        Ok(Self {
            port: QName::new(namespace, port.name.as_str()),
            address: port.address.clone(),
            version,
            binding: binding.clone(),
        })
    }

    pub fn operation(&self, name: &str) -> Result<&BindingOperation, InvokeError> {
        self.binding
            .operation(name)
            .ok_or_else(|| InvokeError::OperationNotFound {
                binding: self.binding.name.clone(),
                operation: name.to_string(),
            })
    }
}
