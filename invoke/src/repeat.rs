use std::{
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    thread,
    time::{Duration, Instant},
};

use tracing::info;

use crate::{
    error::InvokeError,
    invoker::ExchangeRecord,
    xml::{Query, XmlAdapter, XmlDocument},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RepeatState {
    Running,
    Stopped,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Wait {
    Elapsed,
    Interrupted,
}

/// Receiving end of an interruption request. Waits on it end early once interrupted.
pub struct Interrupt {
    receiver: Receiver<()>,
}

#[derive(Clone)]
pub struct InterruptHandle {
    sender: Sender<()>,
}

impl Interrupt {
    pub fn new() -> (Self, InterruptHandle) {
        let (sender, receiver) = mpsc::channel();
        (Self { receiver }, InterruptHandle { sender })
    }

    pub fn wait(&self, interval: Duration) -> Wait {
        let deadline = Instant::now() + interval;
        match self.receiver.recv_timeout(interval) {
            Ok(()) => Wait::Interrupted,
            Err(RecvTimeoutError::Timeout) => Wait::Elapsed,
            // every handle is gone, nothing can interrupt anymore
            Err(RecvTimeoutError::Disconnected) => {
                thread::sleep(deadline.saturating_duration_since(Instant::now()));
                Wait::Elapsed
            }
        }
    }
}

impl InterruptHandle {
    pub fn interrupt(&self) {
        // the run may already be over
        let _ = self.sender.send(());
    }
}

#[derive(Debug)]
pub struct RepeatOutcome {
    pub last: ExchangeRecord,
    pub invocations: usize,
    pub interrupted: bool,
}

/// Re-issues a call until a boolean XPath condition holds on the response.
pub struct RepeatController<'a> {
    adapter: &'a XmlAdapter,
    condition: Option<Query>,
    interval: Duration,
}

impl<'a> RepeatController<'a> {
    pub fn new(
        adapter: &'a XmlAdapter,
        condition: Option<&str>,
        interval: Duration,
    ) -> Result<Self, InvokeError> {
        let condition = condition
            .map(|expression| adapter.compile(expression))
            .transpose()
            .map_err(InvokeError::Condition)?;
        Ok(Self {
            adapter,
            condition,
            interval,
        })
    }

    pub fn next_state(&self, response: &XmlDocument) -> Result<RepeatState, InvokeError> {
        let Some(condition) = &self.condition else {
            return Ok(RepeatState::Stopped);
        };
        let done = self
            .adapter
            .evaluate_boolean(condition, response)
            .map_err(InvokeError::Condition)?;
        Ok(if done {
            RepeatState::Stopped
        } else {
            RepeatState::Running
        })
    }

    /// Calls `invoke` at least once, then again after every interval while the condition
    /// is false. An interruption during the wait ends the loop with the last exchange.
    pub fn run<F>(&self, mut invoke: F, interrupt: &Interrupt) -> Result<RepeatOutcome, InvokeError>
    where
        F: FnMut() -> Result<ExchangeRecord, InvokeError>,
    {
        let mut invocations = 0;
        loop {
            let exchange = invoke()?;
            invocations += 1;

            if self.next_state(&exchange.response)? == RepeatState::Stopped {
                return Ok(RepeatOutcome {
                    last: exchange,
                    invocations,
                    interrupted: false,
                });
            }

            info!(
                invocations,
                interval_ms = self.interval.as_millis() as u64,
                "repeat condition not met, waiting"
            );
            if interrupt.wait(self.interval) == Wait::Interrupted {
                info!(invocations, "interrupted, stopping with the last response");
                return Ok(RepeatOutcome {
                    last: exchange,
                    invocations,
                    interrupted: true,
                });
            }
        }
    }
}
