use std::{collections::HashSet, fmt, path::PathBuf};

use tracing::debug;
use url::Url;

use super::{definitions::Definitions, error::WsdlError};

/// Where a WSDL document is loaded from.
///
/// A location without a scheme is treated as a path on the local filesystem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WsdlSource {
    Path(PathBuf),
    Http(Url),
}

impl WsdlSource {
    pub fn parse(location: &str) -> Result<Self, WsdlError> {
        match Url::parse(location) {
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(Self::Http(url)),
                "file" => url
                    .to_file_path()
                    .map(Self::Path)
                    .map_err(|()| WsdlError::NotAFilePath(location.to_string())),
                // Windows drive letters parse as single letter schemes
                scheme if scheme.len() == 1 => Ok(Self::Path(PathBuf::from(location))),
                scheme => Err(WsdlError::UnsupportedScheme {
                    location: location.to_string(),
                    scheme: scheme.to_string(),
                }),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(Self::Path(PathBuf::from(location))),
            Err(source) => Err(WsdlError::MalformedLocation {
                location: location.to_string(),
                source,
            }),
        }
    }

    /// Reads the raw WSDL text.
    pub fn fetch(&self) -> Result<String, WsdlError> {
        match self {
            Self::Path(path) => std::fs::read_to_string(path).map_err(|source| WsdlError::Read {
                location: self.to_string(),
                source,
            }),
            Self::Http(url) => {
                debug!(%url, "fetching WSDL");
                reqwest::blocking::get(url.clone())
                    .and_then(|response| response.error_for_status())
                    .and_then(|response| response.text())
                    .map_err(|source| WsdlError::Fetch {
                        location: self.to_string(),
                        source,
                    })
            }
        }
    }

    /// Resolves an import `location` against this document's location.
    pub fn resolve(&self, location: &str) -> Result<Self, WsdlError> {
        if Url::parse(location).is_ok() {
            return Self::parse(location);
        }
        match self {
            Self::Path(path) => Ok(Self::Path(
                path.parent()
                    .map(|dir| dir.join(location))
                    .unwrap_or_else(|| PathBuf::from(location)),
            )),
            Self::Http(url) => url
                .join(location)
                .map(Self::Http)
                .map_err(|source| WsdlError::MalformedLocation {
                    location: location.to_string(),
                    source,
                }),
        }
    }

    /// Loads the document along with the services and bindings of every `wsdl:import` it reaches.
    pub fn load(&self, allow_dtd: bool) -> Result<Definitions, WsdlError> {
        let mut visited = HashSet::new();
        self.load_into(allow_dtd, &mut visited)
    }

    fn load_into(
        &self,
        allow_dtd: bool,
        visited: &mut HashSet<String>,
    ) -> Result<Definitions, WsdlError> {
        visited.insert(self.identity());
        let mut definitions = self.load_document(allow_dtd)?;

        for import in std::mem::take(&mut definitions.imports) {
            let Some(location) = import.location.as_deref() else {
                debug!(namespace = ?import.namespace, "import without location skipped");
                continue;
            };
            let source = self.resolve(location)?;
            if visited.contains(&source.identity()) {
                continue;
            }
            match source.load_into(allow_dtd, visited) {
                Ok(imported) => {
                    debug!(
                        %source,
                        services = imported.services.len(),
                        bindings = imported.bindings.len(),
                        "WSDL imported"
                    );
                    definitions.merge(imported);
                }
                // schemas may be imported the same way
                Err(WsdlError::NotDefinitions(root)) => {
                    debug!(%source, %root, "import is not a WSDL document, skipped")
                }
                Err(err) => return Err(err),
            }
        }
        Ok(definitions)
    }

    /// Key under which a document counts as loaded, so import cycles end.
    fn identity(&self) -> String {
        match self {
            Self::Path(path) => std::fs::canonicalize(path)
                .unwrap_or_else(|_| path.clone())
                .display()
                .to_string(),
            Self::Http(url) => url.to_string(),
        }
    }

    fn load_document(&self, allow_dtd: bool) -> Result<Definitions, WsdlError> {
        let text = self.fetch()?;
        let options = roxmltree::ParsingOptions {
            allow_dtd,
            ..Default::default()
        };
        let document =
            roxmltree::Document::parse_with_options(&text, options).map_err(|source| {
                WsdlError::Parse {
                    location: self.to_string(),
                    source,
                }
            })?;
        Definitions::map_from_xml(document.root_element())
    }
}

impl fmt::Display for WsdlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Http(url) => write!(f, "{url}"),
        }
    }
}
