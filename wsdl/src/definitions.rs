use roxmltree::Node;

use super::{
    binding::{soap_extension, Binding, SoapVersion},
    error::WsdlError,
    qname::QName,
    target_namespace, wsdl_children,
};

/// The `definitions` root of a WSDL 1.1 document.
#[derive(Clone, Debug)]
pub struct Definitions {
    pub name: Option<String>,
    pub target_namespace: Option<String>,
    pub imports: Vec<Import>,
    pub services: Vec<Service>,
    pub bindings: Vec<Binding>,
}

/// `<wsdl:import namespace="..." location="..."/>`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Import {
    pub namespace: Option<String>,
    pub location: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Service {
    pub name: String,
    pub namespace: Option<String>,
    pub ports: Vec<Port>,
}

#[derive(Clone, Debug)]
pub struct Port {
    pub name: String,
    pub binding: QName,
    /// `location` of the `soap:address`/`soap12:address` extension, if any.
    pub address: Option<String>,
    pub address_version: Option<SoapVersion>,
}

impl Definitions {
    pub const TAG_NAME: &'static str = "definitions";

    pub fn map_from_xml(definitions: Node) -> Result<Self, WsdlError> {
        let tag = definitions.tag_name();
        if tag.name() != Self::TAG_NAME || tag.namespace() != Some(super::WSDL_NAMESPACE) {
            return Err(WsdlError::NotDefinitions(tag.name().to_string()));
        }

        let name = definitions.attribute("name").map(str::to_string);
        let target_namespace = definitions
            .attribute("targetNamespace")
            .map(str::to_string);

        let imports = wsdl_children(definitions, Import::TAG_NAME)
            .map(Import::map_from_xml)
            .collect();
        let services = wsdl_children(definitions, Service::TAG_NAME)
            .map(Service::map_from_xml)
            .collect::<Result<_, _>>()?;
        let bindings = wsdl_children(definitions, Binding::TAG_NAME)
            .map(Binding::map_from_xml)
            .collect::<Result<_, _>>()?;

        Ok(Self {
            name,
            target_namespace,
            imports,
            services,
            bindings,
        })
    }

    /// Adds the services and bindings of an imported document.
    pub fn merge(&mut self, imported: Definitions) {
        self.services.extend(imported.services);
        self.bindings.extend(imported.bindings);
    }

    pub fn service(&self, namespace: &str, name: &str) -> Option<&Service> {
        self.services
            .iter()
            .find(|s| s.name == name && s.namespace.as_deref() == Some(namespace))
    }

    /// Looks up a binding referenced from a port. An unqualified reference matches by local name.
    pub fn binding(&self, name: &QName) -> Option<&Binding> {
        self.bindings.iter().find(|b| {
            b.name == name.local_name && (name.namespace.is_none() || b.namespace == name.namespace)
        })
    }
}

impl Import {
    pub const TAG_NAME: &'static str = "import";

    pub fn map_from_xml(import: Node) -> Self {
        Self {
            namespace: import.attribute("namespace").map(str::to_string),
            location: import.attribute("location").map(str::to_string),
        }
    }
}

impl Service {
    pub const TAG_NAME: &'static str = "service";

    pub fn map_from_xml(service: Node) -> Result<Self, WsdlError> {
        let name = service
            .attribute("name")
            .ok_or(WsdlError::MissingAttribute {
                element: Self::TAG_NAME,
                attribute: "name",
            })?
            .to_string();
        let ports = wsdl_children(service, Port::TAG_NAME)
            .map(Port::map_from_xml)
            .collect::<Result<_, _>>()?;
        Ok(Self {
            name,
            namespace: target_namespace(service),
            ports,
        })
    }

    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }
}

impl Port {
    pub const TAG_NAME: &'static str = "port";

    pub fn map_from_xml(port: Node) -> Result<Self, WsdlError> {
        let name = port
            .attribute("name")
            .ok_or(WsdlError::MissingAttribute {
                element: Self::TAG_NAME,
                attribute: "name",
            })?
            .to_string();
        let binding = port.attribute("binding").ok_or(WsdlError::MissingAttribute {
            element: Self::TAG_NAME,
            attribute: "binding",
        })?;
        let binding = QName::resolve(binding, port)?;

        let address = soap_extension(port, "address");
        let address_version = address.map(|(_, version)| version);
        let address = address.and_then(|(node, _)| node.attribute("location").map(str::to_string));

        Ok(Self {
            name,
            binding,
            address,
            address_version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WSDL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <definitions xmlns="http://schemas.xmlsoap.org/wsdl/"
                     xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
                     xmlns:tns="urn:echo"
                     name="Echo" targetNamespace="urn:echo">
            <binding name="EchoBinding" type="tns:EchoPortType">
                <soap:binding style="document" transport="http://schemas.xmlsoap.org/soap/http"/>
                <operation name="Echo">
                    <soap:operation soapAction="urn:echo#Echo"/>
                </operation>
            </binding>
            <service name="EchoService">
                <port name="EchoPort" binding="tns:EchoBinding">
                    <soap:address location="http://localhost:8080/echo"/>
                </port>
                <port name="EchoPortNoAddress" binding="tns:EchoBinding"/>
            </service>
        </definitions>"#;

    #[test]
    fn maps_services_ports_and_bindings() {
        let doc = roxmltree::Document::parse(WSDL).unwrap();
        let definitions = Definitions::map_from_xml(doc.root_element()).unwrap();

        assert_eq!(definitions.name.as_deref(), Some("Echo"));
        assert_eq!(definitions.target_namespace.as_deref(), Some("urn:echo"));

        assert!(definitions.service("urn:other", "EchoService").is_none());
        let service = definitions.service("urn:echo", "EchoService").unwrap();
        assert_eq!(service.ports.len(), 2);

        let port = service.port("EchoPort").unwrap();
        assert_eq!(port.binding, QName::new("urn:echo", "EchoBinding"));
        assert_eq!(port.address.as_deref(), Some("http://localhost:8080/echo"));
        assert_eq!(port.address_version, Some(SoapVersion::Soap11));

        let bare = service.port("EchoPortNoAddress").unwrap();
        assert_eq!(bare.address, None);

        let binding = definitions.binding(&port.binding).unwrap();
        assert_eq!(binding.soap_version, Some(SoapVersion::Soap11));
        assert!(definitions
            .binding(&QName::new("urn:other", "EchoBinding"))
            .is_none());
    }

    #[test]
    fn rejects_non_wsdl_root() {
        let doc = roxmltree::Document::parse("<schema/>").unwrap();
        let err = Definitions::map_from_xml(doc.root_element()).unwrap_err();
        assert!(matches!(err, WsdlError::NotDefinitions(name) if name == "schema"));
    }

    #[test]
    fn port_without_binding_is_an_error() {
        let xml = r#"<definitions xmlns="http://schemas.xmlsoap.org/wsdl/">
            <service name="S"><port name="P"/></service>
        </definitions>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let err = Definitions::map_from_xml(doc.root_element()).unwrap_err();
        assert!(matches!(
            err,
            WsdlError::MissingAttribute {
                element: "port",
                attribute: "binding"
            }
        ));
    }

    #[test]
    fn merged_definitions_keep_their_namespaces() {
        let main = r#"<definitions xmlns="http://schemas.xmlsoap.org/wsdl/"
                                   xmlns:b="urn:bind" targetNamespace="urn:main">
            <import namespace="urn:bind" location="bindings.wsdl"/>
            <service name="S"><port name="P" binding="b:B"/></service>
        </definitions>"#;
        let bindings = r#"<definitions xmlns="http://schemas.xmlsoap.org/wsdl/" targetNamespace="urn:bind">
            <binding name="B"/>
        </definitions>"#;
        let main = roxmltree::Document::parse(main).unwrap();
        let bindings = roxmltree::Document::parse(bindings).unwrap();

        let mut definitions = Definitions::map_from_xml(main.root_element()).unwrap();
        assert_eq!(
            definitions.imports,
            [Import {
                namespace: Some("urn:bind".to_string()),
                location: Some("bindings.wsdl".to_string()),
            }]
        );
        let port = definitions.service("urn:main", "S").unwrap().ports[0].clone();
        assert!(definitions.binding(&port.binding).is_none());

        definitions.merge(Definitions::map_from_xml(bindings.root_element()).unwrap());
        let binding = definitions.binding(&port.binding).unwrap();
        assert_eq!(binding.namespace.as_deref(), Some("urn:bind"));
        assert!(definitions.binding(&QName::new("urn:main", "B")).is_none());
    }
}
