pub mod config;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod headers;
pub mod invoker;
pub mod port;
pub mod properties;
pub mod repeat;
pub mod run;
pub mod transport;
pub mod xml;

pub use config::InvocationConfig;
pub use error::{InvokeError, SoapFault, TransportError, XmlError};
pub use headers::{HandlerChain, HeaderInjector, MessageHandler};
pub use invoker::{ExchangeRecord, ServiceInvoker};
pub use properties::{ExtractedProperties, PropertyExtractor, PropertySink};
pub use repeat::{Interrupt, InterruptHandle, RepeatController, RepeatOutcome};
pub use run::{run, Outcome};
pub use transport::{HttpTransport, Transport, WireRequest, WireResponse};
pub use xml::{XmlAdapter, XmlDocument, XmlElement, XmlFragment};
