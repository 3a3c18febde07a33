use thiserror::Error;

#[derive(Debug, Error)]
pub enum WsdlError {
    #[error("Failed to resolve prefix {0:?} to a namespace URI")]
    NamePrefixNotResolved(String),
    #[error("Unable to convert `{location}` to URL")]
    MalformedLocation {
        location: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Unsupported scheme `{scheme}` in WSDL location `{location}`")]
    UnsupportedScheme { location: String, scheme: String },
    #[error("`{0}` does not denote a local file")]
    NotAFilePath(String),
    #[error("Unable to read WSDL from `{location}`")]
    Read {
        location: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to fetch WSDL from `{location}`")]
    Fetch {
        location: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Unable to parse WSDL from `{location}`")]
    Parse {
        location: String,
        #[source]
        source: roxmltree::Error,
    },
    #[error("Root element is {0:?}, expected WSDL `definitions`")]
    NotDefinitions(String),
    #[error("`{element}` element is missing its `{attribute}` attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
}
