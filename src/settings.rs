use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::Deserialize;
use si_invoke::{
    config::{DEFAULT_OUTPUT_DIR, DEFAULT_REPEAT_INTERVAL},
    InvocationConfig, XmlElement, XmlFragment,
};

use crate::cli::Cli;

pub const DEFAULT_EXECUTION_ID: &str = "default";

/// Invocation settings as read from a YAML file, overridden by command line flags.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub wsdl: Option<String>,
    pub namespace: Option<String>,
    pub service: Option<String>,
    pub operation: Option<String>,
    pub port: Option<String>,
    pub endpoint: Option<String>,
    pub request: Option<FragmentSetting>,
    pub request_file: Option<PathBuf>,
    pub headers: Vec<FragmentSetting>,
    pub properties: BTreeMap<String, String>,
    pub namespaces: BTreeMap<String, String>,
    pub repeat_until: Option<String>,
    /// Milliseconds.
    pub repeat_interval: Option<u64>,
    pub output_dir: Option<PathBuf>,
    pub execution_id: Option<String>,
    pub properties_out: Option<PathBuf>,
    pub allow_dtd: bool,
}

/// Either literal XML or a structured element.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FragmentSetting {
    Xml(String),
    Element(ElementSetting),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementSetting {
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub text: Option<String>,
    #[serde(default)]
    pub children: Vec<ElementSetting>,
}

impl From<&ElementSetting> for XmlElement {
    // text goes ahead of the children
    fn from(setting: &ElementSetting) -> Self {
        let mut element = XmlElement::new(setting.name.as_str());
        for (name, value) in &setting.attributes {
            element = element.with_attribute(name.as_str(), value.as_str());
        }
        if let Some(text) = &setting.text {
            element = element.with_text(text.as_str());
        }
        for child in &setting.children {
            element = element.with_child(child.into());
        }
        element
    }
}

impl From<&FragmentSetting> for XmlFragment {
    fn from(setting: &FragmentSetting) -> Self {
        match setting {
            FragmentSetting::Xml(xml) => XmlFragment::Text(xml.clone()),
            FragmentSetting::Element(element) => XmlFragment::Element(element.into()),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = fs::read_to_string(path)
            .with_context(|| format!("unable to read settings from {}", path.display()))?;
        Self::parse(&yaml).with_context(|| format!("invalid settings in {}", path.display()))
    }

    pub fn parse(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Command line values win. Repeatable flags add to what the file has.
    pub fn merge(mut self, cli: &Cli) -> Self {
        fn set<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                target.clone_from(value);
            }
        }

        set(&mut self.wsdl, &cli.wsdl);
        set(&mut self.namespace, &cli.namespace);
        set(&mut self.service, &cli.service);
        set(&mut self.operation, &cli.operation);
        set(&mut self.port, &cli.port);
        set(&mut self.endpoint, &cli.endpoint);
        set(&mut self.repeat_until, &cli.repeat_until);
        set(&mut self.repeat_interval, &cli.repeat_interval);
        set(&mut self.output_dir, &cli.output_dir);
        set(&mut self.execution_id, &cli.execution_id);
        set(&mut self.properties_out, &cli.properties_out);

        if let Some(request) = &cli.request {
            self.request = Some(FragmentSetting::Xml(request.clone()));
            self.request_file = None;
        } else if let Some(request_file) = &cli.request_file {
            self.request = None;
            self.request_file = Some(request_file.clone());
        }

        self.headers
            .extend(cli.headers.iter().cloned().map(FragmentSetting::Xml));
        self.properties.extend(cli.properties.iter().cloned());
        self.namespaces.extend(cli.namespace_bindings.iter().cloned());
        self.allow_dtd |= cli.allow_dtd;
        self
    }

    pub fn execution_id(&self) -> &str {
        self.execution_id.as_deref().unwrap_or(DEFAULT_EXECUTION_ID)
    }

    /// Missing required values are left empty and reported by [`InvocationConfig::validate`].
    pub fn to_config(&self) -> Result<InvocationConfig> {
        if self.request.is_some() && self.request_file.is_some() {
            anyhow::bail!("`request` and `request_file` are mutually exclusive");
        }
        let request = match (&self.request, &self.request_file) {
            (Some(request), _) => request.into(),
            (None, Some(path)) => XmlFragment::Text(
                fs::read_to_string(path)
                    .with_context(|| format!("unable to read request from {}", path.display()))?,
            ),
            (None, None) => XmlFragment::Text(String::new()),
        };

        let mut config = InvocationConfig::new(
            self.wsdl.clone().unwrap_or_default(),
            self.namespace.clone().unwrap_or_default(),
            self.service.clone().unwrap_or_default(),
            self.operation.clone().unwrap_or_default(),
            request,
        );
        config.port.clone_from(&self.port);
        config.endpoint.clone_from(&self.endpoint);
        config.headers = self.headers.iter().map(XmlFragment::from).collect();
        config.properties.clone_from(&self.properties);
        config.namespaces.clone_from(&self.namespaces);
        config.repeat_until.clone_from(&self.repeat_until);
        config.repeat_interval = self
            .repeat_interval
            .map_or(DEFAULT_REPEAT_INTERVAL, Duration::from_millis);
        config.output_dir = self
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
        config.allow_dtd = self.allow_dtd;

        config.validate()?;
        Ok(config)
    }
}
