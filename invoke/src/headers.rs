use crate::{
    envelope::Envelope,
    error::{InvokeError, SoapFault},
    xml::{XmlAdapter, XmlElement, XmlFragment, XmlNode},
};

/// Hook run on every message passing through a dispatch channel.
pub trait MessageHandler {
    fn handle_message(&self, envelope: &mut Envelope) -> Result<(), InvokeError>;

    /// Returns `false` to suppress the fault instead of raising it.
    fn handle_fault(&self, _fault: &SoapFault) -> bool {
        true
    }
}

/// Handlers applied in registration order.
#[derive(Default)]
pub struct HandlerChain {
    handlers: Vec<Box<dyn MessageHandler>>,
}

impl HandlerChain {
    pub fn push(&mut self, handler: impl MessageHandler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub fn handle_message(&self, envelope: &mut Envelope) -> Result<(), InvokeError> {
        self.handlers
            .iter()
            .try_for_each(|handler| handler.handle_message(envelope))
    }

    /// Every handler sees the fault; it propagates unless one of them suppresses it.
    pub fn handle_fault(&self, fault: &SoapFault) -> bool {
        self.handlers
            .iter()
            .fold(true, |propagate, handler| handler.handle_fault(fault) && propagate)
    }
}

/// Appends the configured header elements to the `Header` of every outgoing envelope.
#[derive(Clone, Debug)]
pub struct HeaderInjector {
    headers: Vec<XmlElement>,
}

impl HeaderInjector {
    /// Fragments are parsed here, so a malformed header fails before anything is sent.
    pub fn new(adapter: &XmlAdapter, fragments: &[XmlFragment]) -> Result<Self, InvokeError> {
        let headers = fragments
            .iter()
            .map(|fragment| {
                adapter
                    .fragment(fragment)
                    .map(|document| document.into_root())
                    .map_err(|source| InvokeError::Fragment {
                        what: "header",
                        xml: fragment.describe(),
                        source,
                    })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { headers })
    }
}

impl MessageHandler for HeaderInjector {
    fn handle_message(&self, envelope: &mut Envelope) -> Result<(), InvokeError> {
        if self.headers.is_empty() {
            return Ok(());
        }
        let header = envelope.header_mut();
        header
            .children
            .extend(self.headers.iter().cloned().map(XmlNode::Element));
        Ok(())
    }
}
