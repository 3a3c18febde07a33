use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    #[arg(long, short, help = "YAML file with the invocation settings")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "The WSDL file or URL")]
    pub wsdl: Option<String>,

    #[arg(long, help = "Target namespace of the service")]
    pub namespace: Option<String>,

    #[arg(long)]
    pub service: Option<String>,

    #[arg(long)]
    pub operation: Option<String>,

    #[arg(long, help = "Port to use when the service declares more than one")]
    pub port: Option<String>,

    #[arg(long, help = "Address to send to instead of the one in the WSDL")]
    pub endpoint: Option<String>,

    #[arg(long, conflicts_with = "request_file", help = "The request payload as XML")]
    pub request: Option<String>,

    #[arg(long, help = "File holding the request payload")]
    pub request_file: Option<PathBuf>,

    #[arg(long = "header", value_name = "XML", help = "SOAP header element, may be repeated")]
    pub headers: Vec<String>,

    #[arg(
        long = "property",
        value_name = "NAME=XPATH",
        value_parser = parse_key_value,
        help = "Property to extract from the final response, may be repeated"
    )]
    pub properties: Vec<(String, String)>,

    #[arg(
        long = "namespace-binding",
        value_name = "PREFIX=URI",
        value_parser = parse_key_value,
        help = "Namespace prefix usable in XPath expressions, may be repeated"
    )]
    pub namespace_bindings: Vec<(String, String)>,

    #[arg(long, value_name = "XPATH", help = "Repeat the call until this is true")]
    pub repeat_until: Option<String>,

    #[arg(long, value_name = "MS", help = "Delay between repeated calls [default: 5000]")]
    pub repeat_interval: Option<u64>,

    #[arg(long, help = "Root directory for request and response files [default: target]")]
    pub output_dir: Option<PathBuf>,

    #[arg(long, help = "Subdirectory of the output directory for this run [default: default]")]
    pub execution_id: Option<String>,

    #[arg(long, help = "Merge extracted properties into this properties file")]
    pub properties_out: Option<PathBuf>,

    #[arg(long, help = "Allow a XML Document Type Definition (DTD) to occur")]
    pub allow_dtd: bool,

    #[arg(long, help = "Log wire traffic and exchanged documents")]
    pub debug: bool,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))?;
    if key.is_empty() {
        return Err(format!("empty key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}
