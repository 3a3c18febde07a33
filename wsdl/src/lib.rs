pub mod binding;
pub mod definitions;
pub mod error;
pub mod qname;
pub mod source;

pub use binding::{Binding, BindingOperation, SoapVersion};
pub use definitions::{Definitions, Import, Port, Service};
pub use error::WsdlError;
pub use qname::QName;
pub use source::WsdlSource;

use roxmltree::Node;

pub const WSDL_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/";
pub const SOAP11_BINDING_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/soap/";
pub const SOAP12_BINDING_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/soap12/";

pub fn read_definitions(document: &roxmltree::Document) -> Result<Definitions, WsdlError> {
    Definitions::map_from_xml(document.root_element())
}

/// Element children of `parent` in the WSDL namespace with the given local name.
fn wsdl_children<'a, 'input: 'a>(
    parent: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    parent.children().filter(move |c| {
        c.is_element()
            && c.tag_name().name() == name
            && c.tag_name().namespace() == Some(WSDL_NAMESPACE)
    })
}

/// `targetNamespace` of the `definitions` element enclosing `node`.
fn target_namespace(node: Node) -> Option<String> {
    node.ancestors()
        .find(|a| a.is_element() && a.tag_name().name() == "definitions")
        .and_then(|d| d.attribute("targetNamespace"))
        .map(str::to_string)
}
