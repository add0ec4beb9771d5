use async_trait::async_trait;

use super::{ExportError, Exporter};
use crate::dns::Record;

/// Best-effort human-readable sink. Never fails and never retries.
pub struct ConsoleExporter;

#[async_trait]
impl Exporter for ConsoleExporter {
    fn name(&self) -> &'static str {
        "console"
    }

    async fn export(&mut self, record: &Record) -> Result<(), ExportError> {
        println!("{}", record.colorize());
        Ok(())
    }
}
