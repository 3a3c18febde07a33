mod cli;
mod properties;
mod settings;

use std::{
    collections::BTreeMap,
    process::ExitCode,
    sync::atomic::{AtomicBool, Ordering},
};

use anyhow::{Context, Result};
use clap::Parser;
use si_invoke::{HttpTransport, Interrupt, InterruptHandle, PropertySink, XmlAdapter};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::Cli;
use properties::PropertiesFile;
use settings::Settings;

const DEBUG_FILTER: &str = "soap_invoke=debug,si_invoke=debug,si_wsdl=debug,info";
/// 128 + SIGINT
const ABORTED: i32 = 130;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Signal {
    Stop,
    Abort,
}

/// The first Ctrl-C ends the repeat loop with the last response, the next one aborts.
struct CtrlC {
    handle: InterruptHandle,
    pressed: AtomicBool,
}

impl CtrlC {
    fn new(handle: InterruptHandle) -> Self {
        Self {
            handle,
            pressed: AtomicBool::new(false),
        }
    }

    fn signal(&self) -> Signal {
        if self.pressed.swap(true, Ordering::SeqCst) {
            return Signal::Abort;
        }
        self.handle.interrupt();
        Signal::Stop
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new(DEBUG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match invoke(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

fn invoke(cli: Cli) -> Result<()> {
    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    }
    .merge(&cli);
    let config = settings.to_config()?;
    let adapter = XmlAdapter::new(config.namespaces.clone(), config.allow_dtd);

    let (interrupt, handle) = Interrupt::new();
    // without a repeat condition Ctrl-C keeps its default behaviour
    if config.repeat_until.is_some() {
        let ctrlc = CtrlC::new(handle);
        let installed = ctrlc::set_handler(move || match ctrlc.signal() {
            Signal::Stop => warn!("interrupted, stopping the repeat loop (Ctrl-C again to abort)"),
            Signal::Abort => std::process::exit(ABORTED),
        });
        if let Err(err) = installed {
            warn!("unable to set Ctrl-C handler: {err}");
        }
    }

    let transport = HttpTransport::new().context("unable to create HTTP client")?;

    let mut file = settings
        .properties_out
        .as_deref()
        .map(PropertiesFile::open)
        .transpose()?;
    let mut map = BTreeMap::<String, String>::new();
    let sink: &mut dyn PropertySink = match file.as_mut() {
        Some(file) => file,
        None => &mut map,
    };

    let outcome = si_invoke::run(
        &config,
        &adapter,
        Box::new(transport),
        settings.execution_id(),
        &interrupt,
        sink,
    )
    .with_context(|| format!("invoking {} on {}", config.operation, config.service))?;

    if let Some(file) = &file {
        file.save()?;
    }
    if outcome.interrupted {
        info!("stopped before the repeat condition was met");
    }
    for (name, value) in &outcome.properties {
        println!("{name}={value}");
    }
    Ok(())
}
