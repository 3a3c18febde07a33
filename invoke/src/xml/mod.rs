//! Thin wrapper over the XML libraries: parsing with `roxmltree`, writing with `quick-xml` and
//! XPath evaluation with `sxd-xpath`.
//!
//! An [`XmlAdapter`] is built once per run and handed to every component that needs it.

mod element;
mod query;

use std::{
    collections::BTreeMap,
    fs,
    io::{BufWriter, Write},
    path::Path,
};

use quick_xml::{
    events::{BytesDecl, Event},
    Writer,
};

pub use element::{XmlElement, XmlFragment, XmlNode};
pub use query::Query;

use crate::error::XmlError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlDocument {
    root: XmlElement,
}

impl XmlDocument {
    pub fn new(root: XmlElement) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    pub fn into_root(self) -> XmlElement {
        self.root
    }

    /// Writes the document with a `version="1.0"` UTF-8 declaration.
    pub fn write<W: Write>(&self, out: W) -> Result<(), XmlError> {
        let mut writer = Writer::new(out);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(XmlError::write)?;
        self.root.write(&mut writer)
    }

    pub fn to_xml(&self) -> Result<String, XmlError> {
        let mut buf = Vec::new();
        self.write(&mut buf)?;
        String::from_utf8(buf).map_err(XmlError::write)
    }
}

#[derive(Clone, Debug, Default)]
pub struct XmlAdapter {
    namespaces: BTreeMap<String, String>,
    allow_dtd: bool,
}

impl XmlAdapter {
    /// `namespaces` maps prefixes to URIs for use inside XPath expressions.
    pub fn new(namespaces: BTreeMap<String, String>, allow_dtd: bool) -> Self {
        Self {
            namespaces,
            allow_dtd,
        }
    }

    pub fn parse(&self, xml: &str) -> Result<XmlDocument, XmlError> {
        let options = roxmltree::ParsingOptions {
            allow_dtd: self.allow_dtd,
            ..Default::default()
        };
        let document = roxmltree::Document::parse_with_options(xml, options)?;
        Ok(XmlDocument::new(XmlElement::from_node(
            document.root_element(),
        )))
    }

    /// Turns a configured fragment into a document. Element trees are written out and parsed
    /// back, so names and prefixes are checked the same way as for XML text.
    pub fn fragment(&self, fragment: &XmlFragment) -> Result<XmlDocument, XmlError> {
        match fragment {
            XmlFragment::Text(xml) => self.parse(xml),
            XmlFragment::Element(element) => self.parse(&element.to_xml()?),
        }
    }

    /// Writes `document` to `path`, creating missing parent directories.
    pub fn write_file(&self, document: &XmlDocument, path: &Path) -> Result<(), XmlError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = BufWriter::new(fs::File::create(path)?);
        document.write(&mut out)?;
        out.flush()?;
        Ok(())
    }

    pub fn compile(&self, expression: &str) -> Result<Query, XmlError> {
        Query::compile(expression)
    }

    pub fn evaluate_string(&self, query: &Query, document: &XmlDocument) -> Result<String, XmlError> {
        query.evaluate(document, &self.namespaces, |value| Ok(value.string()))
    }

    pub fn evaluate_boolean(&self, query: &Query, document: &XmlDocument) -> Result<bool, XmlError> {
        query.evaluate(document, &self.namespaces, |value| query.expect_boolean(value))
    }
}
