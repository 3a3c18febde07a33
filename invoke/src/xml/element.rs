use std::io::Write;

use quick_xml::{
    events::{BytesEnd, BytesStart, BytesText, Event},
    Writer,
};
use roxmltree::Node;

use crate::error::XmlError;

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// An element tree with names kept as written (`prefix:local`).
///
/// Namespace declarations are ordinary `xmlns`/`xmlns:prefix` attributes, so a tree written
/// back out declares exactly what it was given.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// A request body or header as configured: raw XML text or an element tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum XmlFragment {
    Text(String),
    Element(XmlElement),
}

impl XmlFragment {
    /// How the fragment is shown in error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Text(xml) => xml.clone(),
            Self::Element(element) => format!("<{}>", element.name),
        }
    }
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// Concatenated text of the direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                XmlNode::Text(t) => Some(t.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// Copies a parsed subtree. Every namespace in scope at `node` is declared on the copy's
    /// root, so a payload lifted out of an envelope stays self-contained.
    pub(crate) fn from_node(node: Node) -> Self {
        Self::copy_node(node, None)
    }

    fn copy_node(node: Node, parent: Option<Node>) -> Self {
        let mut attributes = Vec::new();

        for namespace in node.namespaces() {
            if namespace.uri() == XML_NAMESPACE {
                continue;
            }
            let inherited = parent.is_some_and(|p| {
                p.namespaces()
                    .any(|n| n.name() == namespace.name() && n.uri() == namespace.uri())
            });
            if !inherited {
                let name = match namespace.name() {
                    Some(prefix) => format!("xmlns:{prefix}"),
                    None => "xmlns".to_string(),
                };
                attributes.push((name, namespace.uri().to_string()));
            }
        }

        for attribute in node.attributes() {
            let name = qualify(node, attribute.namespace(), attribute.name(), true);
            attributes.push((name, attribute.value().to_string()));
        }

        let tag = node.tag_name();
        let name = qualify(node, tag.namespace(), tag.name(), false);

        let children = node
            .children()
            .filter_map(|child| {
                if child.is_element() {
                    Some(XmlNode::Element(Self::copy_node(child, Some(node))))
                } else if child.is_text() {
                    child.text().map(|t| XmlNode::Text(t.to_string()))
                } else {
                    None
                }
            })
            .collect();

        Self {
            name,
            attributes,
            children,
        }
    }

    pub fn write<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), XmlError> {
        let mut start = BytesStart::new(self.name.as_str());
        for (name, value) in &self.attributes {
            start.push_attribute((name.as_str(), value.as_str()));
        }

        if self.children.is_empty() {
            writer
                .write_event(Event::Empty(start))
                .map_err(XmlError::write)?;
            return Ok(());
        }

        writer
            .write_event(Event::Start(start))
            .map_err(XmlError::write)?;
        for child in &self.children {
            match child {
                XmlNode::Element(element) => element.write(writer)?,
                XmlNode::Text(text) => writer
                    .write_event(Event::Text(BytesText::new(text)))
                    .map_err(XmlError::write)?,
            }
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(XmlError::write)?;
        Ok(())
    }

    pub fn to_xml(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new(Vec::new());
        self.write(&mut writer)?;
        String::from_utf8(writer.into_inner()).map_err(XmlError::write)
    }
}

/// Renders an expanded name with the prefix bound to its namespace at `node`.
fn qualify(node: Node, namespace: Option<&str>, local: &str, attribute: bool) -> String {
    let Some(uri) = namespace else {
        return local.to_string();
    };
    if uri == XML_NAMESPACE {
        return format!("xml:{local}");
    }
    // attributes never pick up the default namespace
    let prefix = node
        .namespaces()
        .filter(|ns| ns.uri() == uri)
        .find(|ns| !attribute || ns.name().is_some())
        .and_then(|ns| ns.name());
    match prefix {
        Some(prefix) => format!("{prefix}:{local}"),
        None => local.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn copy(xml: &str) -> XmlElement {
        let doc = roxmltree::Document::parse(xml).unwrap();
        XmlElement::from_node(doc.root_element())
    }

    #[test]
    fn copies_names_attributes_and_text() {
        let element = copy(r#"<ns:a xmlns:ns="urn:a" id="1"><ns:b>x</ns:b>tail</ns:a>"#);

        assert_eq!(element.name, "ns:a");
        assert_eq!(element.prefix(), Some("ns"));
        assert_eq!(element.local_name(), "a");
        assert_eq!(element.attribute("xmlns:ns"), Some("urn:a"));
        assert_eq!(element.attribute("id"), Some("1"));
        assert_eq!(element.text(), "tail");

        let child = element.elements().next().unwrap();
        assert_eq!(child.name, "ns:b");
        assert_eq!(child.text(), "x");
        // declared once, on the root
        assert!(child.attributes.is_empty());
    }

    #[test]
    fn lifted_subtree_declares_inherited_namespaces() {
        let doc = roxmltree::Document::parse(
            r#"<env xmlns:p="urn:p" xmlns="urn:d"><p:inner p:flag="y"><leaf/></p:inner></env>"#,
        )
        .unwrap();
        let inner = doc.root_element().first_element_child().unwrap();
        let element = XmlElement::from_node(inner);

        assert_eq!(element.name, "p:inner");
        assert_eq!(element.attribute("xmlns:p"), Some("urn:p"));
        assert_eq!(element.attribute("xmlns"), Some("urn:d"));
        assert_eq!(element.attribute("p:flag"), Some("y"));
        assert_eq!(element.elements().next().unwrap().name, "leaf");
    }

    #[test]
    fn writes_empty_and_nested_elements() {
        let element = XmlElement::new("root")
            .with_attribute("a", "1 < 2")
            .with_child(XmlElement::new("empty"))
            .with_child(XmlElement::new("t").with_text("a & b"));

        assert_eq!(
            element.to_xml().unwrap(),
            r#"<root a="1 &lt; 2"><empty/><t>a &amp; b</t></root>"#
        );
    }

    #[test]
    fn written_tree_parses_back_to_itself() {
        let source = r#"<q:req xmlns:q="urn:q" mode="fast"><q:item n="1">one</q:item><q:item n="2"/></q:req>"#;
        let element = copy(source);
        assert_eq!(element.to_xml().unwrap(), source);
        assert_eq!(copy(&element.to_xml().unwrap()), element);
    }
}
