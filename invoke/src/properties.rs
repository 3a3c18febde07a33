use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::{
    error::InvokeError,
    xml::{Query, XmlAdapter, XmlDocument},
};

pub type ExtractedProperties = BTreeMap<String, String>;

/// Somewhere extracted values are published to.
pub trait PropertySink {
    /// Returns the value that was replaced, if any.
    fn set_property(&mut self, name: &str, value: String) -> Option<String>;
}

impl PropertySink for BTreeMap<String, String> {
    fn set_property(&mut self, name: &str, value: String) -> Option<String> {
        self.insert(name.to_string(), value)
    }
}

impl PropertySink for HashMap<String, String> {
    fn set_property(&mut self, name: &str, value: String) -> Option<String> {
        self.insert(name.to_string(), value)
    }
}

/// Evaluates one XPath expression per property against the final response.
pub struct PropertyExtractor<'a> {
    adapter: &'a XmlAdapter,
    queries: Vec<(String, Query)>,
}

impl<'a> PropertyExtractor<'a> {
    pub fn new(
        adapter: &'a XmlAdapter,
        properties: &BTreeMap<String, String>,
    ) -> Result<Self, InvokeError> {
        let queries = properties
            .iter()
            .map(|(name, expression)| {
                adapter
                    .compile(expression)
                    .map(|query| (name.clone(), query))
                    .map_err(|source| InvokeError::Property {
                        name: name.clone(),
                        source,
                    })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { adapter, queries })
    }

    /// An expression selecting nothing yields the empty string.
    pub fn extract(&self, response: &XmlDocument) -> Result<ExtractedProperties, InvokeError> {
        self.queries
            .iter()
            .map(|(name, query)| {
                self.adapter
                    .evaluate_string(query, response)
                    .map(|value| (name.clone(), value))
                    .map_err(|source| InvokeError::Property {
                        name: name.clone(),
                        source,
                    })
            })
            .collect()
    }

    pub fn publish(properties: &ExtractedProperties, sink: &mut dyn PropertySink) {
        for (name, value) in properties {
            match sink.set_property(name, value.clone()) {
                Some(previous) if previous != *value => {
                    warn!(property = %name, %previous, %value, "overwriting property")
                }
                _ => debug!(property = %name, %value, "property set"),
            }
        }
    }
}
