use roxmltree::Node;
use si_wsdl::{
    binding::{SOAP11_ENVELOPE_NAMESPACE, SOAP12_ENVELOPE_NAMESPACE},
    SoapVersion,
};

use crate::{
    error::{SoapFault, XmlError},
    xml::{XmlDocument, XmlElement, XmlNode},
};

const PREFIX: &str = "soap";

/// An outgoing SOAP envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    root: XmlElement,
}

impl Envelope {
    /// Wraps `payload` as the only child of `Body`. No `Header` is created.
    pub fn wrap(version: SoapVersion, payload: XmlElement) -> Self {
        let body = XmlElement::new(qualified("Body")).with_child(payload);
        let root = XmlElement::new(qualified("Envelope"))
            .with_attribute(format!("xmlns:{PREFIX}"), version.envelope_namespace())
            .with_child(body);
        Self { root }
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    pub fn header(&self) -> Option<&XmlElement> {
        let name = qualified("Header");
        self.root.elements().find(|e| e.name == name)
    }

    /// Returns the `Header` section, inserting an empty one ahead of `Body` if missing.
    pub fn header_mut(&mut self) -> &mut XmlElement {
        let name = qualified("Header");
        let position = self
            .root
            .children
            .iter()
            .position(|c| matches!(c, XmlNode::Element(e) if e.name == name));
        let index = position.unwrap_or_else(|| {
            self.root
                .children
                .insert(0, XmlNode::Element(XmlElement::new(name)));
            0
        });
        match &mut self.root.children[index] {
            XmlNode::Element(header) => header,
            XmlNode::Text(_) => unreachable!("position only matches elements"),
        }
    }

    pub fn body(&self) -> Option<&XmlElement> {
        let name = qualified("Body");
        self.root.elements().find(|e| e.name == name)
    }

    pub fn to_xml(&self) -> Result<String, XmlError> {
        XmlDocument::new(self.root.clone()).to_xml()
    }
}

fn qualified(local: &str) -> String {
    format!("{PREFIX}:{local}")
}

/// What a response envelope carries in its `Body`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseBody {
    Payload(XmlElement),
    Fault { fault: SoapFault, element: XmlElement },
    Empty,
}

/// Reads a response envelope of either SOAP version.
pub fn parse_response(xml: &str) -> Result<ResponseBody, XmlError> {
    let document = roxmltree::Document::parse(xml)?;
    let envelope = document.root_element();

    let namespace = envelope.tag_name().namespace().unwrap_or_default();
    if envelope.tag_name().name() != "Envelope"
        || (namespace != SOAP11_ENVELOPE_NAMESPACE && namespace != SOAP12_ENVELOPE_NAMESPACE)
    {
        return Err(XmlError::NotEnvelope(format!(
            "root element is {:?}",
            envelope.tag_name().name()
        )));
    }

    let body = envelope
        .children()
        .find(|c| c.is_element() && c.tag_name().name() == "Body" && c.tag_name().namespace() == Some(namespace))
        .ok_or_else(|| XmlError::NotEnvelope("missing Body".to_string()))?;

    let Some(payload) = body.first_element_child() else {
        return Ok(ResponseBody::Empty);
    };

    if payload.tag_name().name() == "Fault" && payload.tag_name().namespace() == Some(namespace) {
        let fault = if namespace == SOAP12_ENVELOPE_NAMESPACE {
            soap12_fault(payload)
        } else {
            soap11_fault(payload)
        };
        return Ok(ResponseBody::Fault {
            fault,
            element: XmlElement::from_node(payload),
        });
    }

    Ok(ResponseBody::Payload(XmlElement::from_node(payload)))
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == name)
}

fn text_content(node: Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

// <faultcode>, <faultstring> and <detail> are unqualified in SOAP 1.1
fn soap11_fault(fault: Node) -> SoapFault {
    SoapFault {
        code: child(fault, "faultcode").map(text_content).unwrap_or_default(),
        reason: child(fault, "faultstring")
            .map(text_content)
            .unwrap_or_default(),
        detail: child(fault, "detail").map(text_content),
    }
}

fn soap12_fault(fault: Node) -> SoapFault {
    SoapFault {
        code: child(fault, "Code")
            .and_then(|code| child(code, "Value"))
            .map(text_content)
            .unwrap_or_default(),
        reason: child(fault, "Reason")
            .and_then(|reason| child(reason, "Text"))
            .map(text_content)
            .unwrap_or_default(),
        detail: child(fault, "Detail").map(text_content),
    }
}
