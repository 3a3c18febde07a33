use std::fmt;

use roxmltree::Node;

use super::error::WsdlError;

/// A namespace-qualified name, as used by `binding="tns:EchoBinding"` style references.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QName {
    pub namespace: Option<String>,
    pub local_name: String,
}

impl QName {
    pub fn new(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local_name: local_name.into(),
        }
    }

    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// Resolves a lexical QName against the namespaces in scope at `node`.
    ///
    /// An unprefixed value picks up the default namespace, if one is declared.
    pub fn resolve(value: &str, node: Node) -> Result<Self, WsdlError> {
        let (prefix, local_name) = match value.split_once(':') {
            Some((prefix, local_name)) => (Some(prefix), local_name),
            None => (None, value),
        };

        let namespace = node
            .namespaces()
            .find(|ns| ns.name() == prefix)
            .map(|ns| ns.uri().to_string());

        if let Some(prefix) = prefix {
            if namespace.is_none() {
                return Err(WsdlError::NamePrefixNotResolved(prefix.to_string()));
            }
        }

        Ok(Self {
            namespace,
            local_name: local_name.to_string(),
        })
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{{{namespace}}}{}", self.local_name),
            None => f.write_str(&self.local_name),
        }
    }
}
