mod console;
mod postgres;

pub use console::ConsoleExporter;
pub use postgres::PostgresExporter;

use async_trait::async_trait;
use log::warn;
use thiserror::Error;

use crate::dns::Record;

type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// Failure taxonomy of the export stage. `StorageUnavailable` is the one
/// distinguished value: it ends the process. Everything else stays local to
/// the failing sink.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write record: {0}")]
    Write(SinkError),
    #[error("storage unavailable after {failures} consecutive write failures: {last}")]
    StorageUnavailable { failures: u32, last: SinkError },
}

/// A one-record consumer. Sinks never see each other; the router isolates
/// their failures.
#[async_trait]
pub trait Exporter: Send {
    fn name(&self) -> &'static str;

    async fn export(&mut self, record: &Record) -> Result<(), ExportError>;
}

/// Fans each emitted record out to every registered sink, in registration
/// order. A sink failure never blocks delivery to the remaining sinks, and
/// the fatal storage error propagates only after the fan-out completes.
pub struct ExportRouter {
    sinks: Vec<Box<dyn Exporter>>,
}

impl ExportRouter {
    pub fn new(sinks: Vec<Box<dyn Exporter>>) -> Self {
        Self { sinks }
    }

    pub async fn dispatch(&mut self, record: &Record) -> Result<(), ExportError> {
        let mut fatal = None;
        for sink in &mut self.sinks {
            match sink.export(record).await {
                Ok(()) => {}
                Err(e @ ExportError::StorageUnavailable { .. }) => fatal = Some(e),
                Err(e) => warn!("{} export failed: {e}", sink.name()),
            }
        }
        match fatal {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
