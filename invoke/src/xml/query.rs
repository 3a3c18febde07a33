use std::fmt;

use sxd_xpath::{Context, Factory, Value, XPath};

use super::XmlDocument;
use crate::error::XmlError;

/// A compiled XPath expression.
pub struct Query {
    expression: String,
    xpath: XPath,
}

impl Query {
    pub fn compile(expression: &str) -> Result<Self, XmlError> {
        let compile_error = |reason: String| XmlError::Compile {
            expression: expression.to_string(),
            reason,
        };
        // a blank expression compiles to nothing
        let xpath = Factory::new()
            .build(expression)
            .map_err(|err| compile_error(err.to_string()))?
            .ok_or_else(|| compile_error("empty expression".to_string()))?;
        Ok(Self {
            expression: expression.to_string(),
            xpath,
        })
    }

    /// Evaluates the expression against `document`, binding `namespaces` in the context.
    pub(crate) fn evaluate<'n, T>(
        &self,
        document: &XmlDocument,
        namespaces: impl IntoIterator<Item = (&'n String, &'n String)>,
        convert: impl FnOnce(Value<'_>) -> Result<T, XmlError>,
    ) -> Result<T, XmlError> {
        let evaluate_error = |reason: String| XmlError::Evaluate {
            expression: self.expression.clone(),
            reason,
        };

        let xml = document.to_xml()?;
        let package =
            sxd_document::parser::parse(&xml).map_err(|err| evaluate_error(format!("{err:?}")))?;
        let sxd = package.as_document();

        let mut context = Context::new();
        for (prefix, uri) in namespaces {
            context.set_namespace(prefix, uri);
        }

        let value = self
            .xpath
            .evaluate(&context, sxd.root())
            .map_err(|err| evaluate_error(err.to_string()))?;
        convert(value)
    }

    pub(crate) fn expect_boolean(&self, value: Value<'_>) -> Result<bool, XmlError> {
        let kind = match value {
            Value::Boolean(b) => return Ok(b),
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Nodeset(_) => "node-set",
        };
        Err(XmlError::NotBoolean {
            expression: self.expression.clone(),
            kind,
        })
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Query").field(&self.expression).finish()
    }
}
