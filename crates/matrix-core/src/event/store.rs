use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

use super::{TupleEvent, TupleEventKind};

/// Almacenamiento de eventos append-only.
pub trait EventStore {
    /// Agrega un evento a partir de su kind y devuelve el evento completo (con seq y ts).
    fn append_kind(&mut self, run_id: Uuid, kind: TupleEventKind) -> TupleEvent;
    /// Lista eventos de una ejecución (orden ascendente por seq).
    fn list(&self, run_id: Uuid) -> Vec<TupleEvent>;
    /// Incorpora eventos ya secuenciados por otro store (p. ej. el de un
    /// worker paralelo), conservando seq y ts.
    fn import(&mut self, events: Vec<TupleEvent>);
}

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    pub inner: HashMap<Uuid, Vec<TupleEvent>>,
}

impl EventStore for InMemoryEventStore {
    fn append_kind(&mut self, run_id: Uuid, kind: TupleEventKind) -> TupleEvent {
        let vec = self.inner.entry(run_id).or_default();
        let seq = vec.len() as u64;
        let ev = TupleEvent { seq,
                              run_id,
                              kind,
                              ts: Utc::now() };
        vec.push(ev.clone());
        ev
    }

    fn list(&self, run_id: Uuid) -> Vec<TupleEvent> {
        self.inner.get(&run_id).cloned().unwrap_or_default()
    }

    fn import(&mut self, events: Vec<TupleEvent>) {
        for ev in events {
            self.inner.entry(ev.run_id).or_default().push(ev);
        }
    }
}
