use tracing::info;

use crate::{
    config::InvocationConfig,
    error::InvokeError,
    invoker::{ExchangeRecord, ServiceInvoker},
    properties::{ExtractedProperties, PropertyExtractor, PropertySink},
    repeat::{Interrupt, RepeatController},
    transport::Transport,
    xml::XmlAdapter,
};

#[derive(Debug)]
pub struct Outcome {
    pub invocations: usize,
    pub interrupted: bool,
    pub exchange: ExchangeRecord,
    pub properties: ExtractedProperties,
}

/// Invokes the configured operation, repeating while the condition is unmet, then
/// publishes the extracted properties to `sink`.
///
/// Expressions are compiled before the WSDL is read, so a bad expression fails before any
/// network traffic.
pub fn run(
    config: &InvocationConfig,
    adapter: &XmlAdapter,
    transport: Box<dyn Transport>,
    execution_id: &str,
    interrupt: &Interrupt,
    sink: &mut dyn PropertySink,
) -> Result<Outcome, InvokeError> {
    let controller = RepeatController::new(
        adapter,
        config.repeat_until.as_deref(),
        config.repeat_interval,
    )?;
    let extractor = PropertyExtractor::new(adapter, &config.properties)?;

    let invoker = ServiceInvoker::connect(config, adapter, transport, execution_id)?;
    let repeated = controller.run(|| invoker.invoke(), interrupt)?;

    let properties = extractor.extract(&repeated.last.response)?;
    PropertyExtractor::publish(&properties, sink);

    info!(
        invocations = repeated.invocations,
        interrupted = repeated.interrupted,
        properties = properties.len(),
        dir = %invoker.execution_dir().display(),
        "invocation finished"
    );

    Ok(Outcome {
        invocations: repeated.invocations,
        interrupted: repeated.interrupted,
        exchange: repeated.last,
        properties,
    })
}
