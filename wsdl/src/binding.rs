use roxmltree::Node;

use super::{
    error::WsdlError, qname::QName, target_namespace, wsdl_children, SOAP11_BINDING_NAMESPACE,
    SOAP12_BINDING_NAMESPACE,
};

pub const SOAP11_ENVELOPE_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const SOAP12_ENVELOPE_NAMESPACE: &str = "http://www.w3.org/2003/05/soap-envelope";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SoapVersion {
    Soap11,
    Soap12,
}

impl SoapVersion {
    /// Maps the namespace of a `soap:binding`/`soap:address` extension element to its version.
    pub fn from_binding_namespace(namespace: &str) -> Option<Self> {
        match namespace {
            SOAP11_BINDING_NAMESPACE => Some(Self::Soap11),
            SOAP12_BINDING_NAMESPACE => Some(Self::Soap12),
            _ => None,
        }
    }

    pub fn envelope_namespace(self) -> &'static str {
        match self {
            Self::Soap11 => SOAP11_ENVELOPE_NAMESPACE,
            Self::Soap12 => SOAP12_ENVELOPE_NAMESPACE,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Soap11 => "text/xml; charset=utf-8",
            Self::Soap12 => "application/soap+xml; charset=utf-8",
        }
    }
}

/// The `binding` element, reduced to the SOAP extension information needed to dispatch.
#[derive(Clone, Debug)]
pub struct Binding {
    pub name: String,
    /// `targetNamespace` of the document declaring the binding.
    pub namespace: Option<String>,
    pub port_type: Option<QName>,
    pub soap_version: Option<SoapVersion>,
    pub style: Option<String>,
    pub transport: Option<String>,
    pub operations: Vec<BindingOperation>,
}

#[derive(Clone, Debug)]
pub struct BindingOperation {
    pub name: String,
    pub soap_action: Option<String>,
    pub style: Option<String>,
}

impl Binding {
    pub const TAG_NAME: &'static str = "binding";

    pub fn map_from_xml(binding: Node) -> Result<Self, WsdlError> {
        let name = binding
            .attribute("name")
            .ok_or(WsdlError::MissingAttribute {
                element: Self::TAG_NAME,
                attribute: "name",
            })?
            .to_string();
        let namespace = target_namespace(binding);
        let port_type = binding
            .attribute("type")
            .map(|t| QName::resolve(t, binding))
            .transpose()?;

        // <soap:binding style="document" transport="http://schemas.xmlsoap.org/soap/http"/>
        let soap_binding = soap_extension(binding, "binding");
        let soap_version = soap_binding.map(|(_, version)| version);
        let style = soap_binding.and_then(|(node, _)| node.attribute("style").map(str::to_string));
        let transport =
            soap_binding.and_then(|(node, _)| node.attribute("transport").map(str::to_string));

        let operations = wsdl_children(binding, BindingOperation::TAG_NAME)
            .map(BindingOperation::map_from_xml)
            .collect::<Result<_, _>>()?;

        Ok(Self {
            name,
            namespace,
            port_type,
            soap_version,
            style,
            transport,
            operations,
        })
    }

    pub fn operation(&self, name: &str) -> Option<&BindingOperation> {
        self.operations.iter().find(|op| op.name == name)
    }
}

impl BindingOperation {
    pub const TAG_NAME: &'static str = "operation";

    pub fn map_from_xml(operation: Node) -> Result<Self, WsdlError> {
        let name = operation
            .attribute("name")
            .ok_or(WsdlError::MissingAttribute {
                element: Self::TAG_NAME,
                attribute: "name",
            })?
            .to_string();

        let soap_operation = soap_extension(operation, "operation").map(|(node, _)| node);
        let soap_action = soap_operation
            .and_then(|node| node.attribute("soapAction"))
            .map(str::to_string);
        let style = soap_operation
            .and_then(|node| node.attribute("style"))
            .map(str::to_string);

        Ok(Self {
            name,
            soap_action,
            style,
        })
    }
}

/// Finds the SOAP 1.1 or 1.2 extension element named `name` among the children of `parent`.
pub(crate) fn soap_extension<'a, 'input>(
    parent: Node<'a, 'input>,
    name: &str,
) -> Option<(Node<'a, 'input>, SoapVersion)> {
    parent.children().filter(|c| c.is_element()).find_map(|child| {
        let tag = child.tag_name();
        if tag.name() != name {
            return None;
        }
        tag.namespace()
            .and_then(SoapVersion::from_binding_namespace)
            .map(|version| (child, version))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BINDING: &str = r#"
        <wsdl:binding xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
                      xmlns:soap12="http://schemas.xmlsoap.org/wsdl/soap12/"
                      xmlns:tns="urn:echo"
                      name="EchoBinding" type="tns:EchoPortType">
            <soap12:binding style="document" transport="http://schemas.xmlsoap.org/soap/http"/>
            <wsdl:operation name="Echo">
                <soap12:operation soapAction="urn:echo#Echo"/>
            </wsdl:operation>
            <wsdl:operation name="Ping"/>
        </wsdl:binding>"#;

    #[test]
    fn maps_soap12_binding() {
        let doc = roxmltree::Document::parse(BINDING).unwrap();
        let binding = Binding::map_from_xml(doc.root_element()).unwrap();

        assert_eq!(binding.name, "EchoBinding");
        assert_eq!(binding.port_type, Some(QName::new("urn:echo", "EchoPortType")));
        assert_eq!(binding.soap_version, Some(SoapVersion::Soap12));
        assert_eq!(binding.style.as_deref(), Some("document"));
        assert_eq!(
            binding.operation("Echo").unwrap().soap_action.as_deref(),
            Some("urn:echo#Echo")
        );
        assert_eq!(binding.operation("Ping").unwrap().soap_action, None);
        assert!(binding.operation("Missing").is_none());
    }

    #[test]
    fn version_specific_values() {
        assert_eq!(
            SoapVersion::Soap11.envelope_namespace(),
            "http://schemas.xmlsoap.org/soap/envelope/"
        );
        assert!(SoapVersion::Soap12.content_type().starts_with("application/soap+xml"));
        assert_eq!(SoapVersion::from_binding_namespace("urn:other"), None);
    }
}
