use super::accountant::Accountant;
use super::store::EntityStore;
use super::EngineError;
use crate::domain::{AuditEntry, HistoricalRecord, PoolEvent};

impl<S: EntityStore> Accountant<'_, S> {
    /// Store a verbatim copy of the event, keyed by its transaction hash and log index.
    ///
    /// # Errors
    /// Returns `EngineError::Payload` if the parameters cannot be encoded.
    pub fn record_audit(&mut self, event: &PoolEvent) -> Result<(), EngineError> {
        let params = event.params_json().map_err(|e| EngineError::Payload {
            position: event.meta.position(),
            message: e.to_string(),
        })?;
        self.write_record(HistoricalRecord::Audit(AuditEntry {
            id: event.meta.event_id(),
            event: event.kind.name().to_string(),
            meta: event.meta.clone(),
            params,
        }));
        Ok(())
    }
}
