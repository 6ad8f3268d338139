//! Per-client filter sessions with last-write-wins ordering.
//!
//! Each control event carries a client sequence number. A submission older
//! than one already seen is refused, and a finished recompute is only
//! committed if no newer submission arrived while it ran. Results of
//! superseded recomputes are dropped, never displayed.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use hashbrown::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::filter::FilterState;

/// An accepted submission awaiting its recompute
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ticket {
    pub seq: u64,
    pub filter: FilterState,
}

/// Refused submission: a newer one was already seen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stale {
    pub latest: u64,
}

#[derive(Debug)]
struct SessionState {
    latest_seq: Option<u64>,
    applied: FilterState,
}

#[derive(Debug)]
pub struct Session {
    id: Uuid,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(id: Uuid, initial: FilterState) -> Self {
        Self {
            id,
            state: Mutex::new(SessionState {
                latest_seq: None,
                applied: initial,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Register a new filter state; refused if `seq` is not newer than
    /// every earlier submission
    pub fn submit(&self, seq: u64, filter: FilterState) -> Result<Ticket, Stale> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(latest) = state.latest_seq {
            if seq <= latest {
                debug!("Session {}: refusing seq {} (latest {})", self.id, seq, latest);
                return Err(Stale { latest });
            }
        }

        state.latest_seq = Some(seq);
        Ok(Ticket { seq, filter })
    }

    /// Mark the ticket's filter as displayed. Returns false, leaving the
    /// applied state alone, if a newer submission superseded the ticket.
    pub fn commit(&self, ticket: &Ticket) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if state.latest_seq != Some(ticket.seq) {
            debug!(
                "Session {}: discarding superseded result for seq {}",
                self.id, ticket.seq
            );
            return false;
        }

        state.applied = ticket.filter;
        true
    }

    /// The filter state whose result was last committed
    pub fn applied(&self) -> FilterState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .applied
    }

    pub fn latest_seq(&self) -> Option<u64> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .latest_seq
    }
}

#[derive(Debug, Default)]
struct Registry {
    sessions: HashMap<Uuid, Arc<Session>>,
    order: VecDeque<Uuid>,
}

/// All live sessions, bounded by count
#[derive(Debug)]
pub struct SessionStore {
    inner: RwLock<Registry>,
    capacity: usize,
}

impl SessionStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Registry::default()),
            capacity: capacity.max(1),
        }
    }

    /// Open a session starting from `initial`, evicting the oldest session
    /// once the store is full
    pub fn create(&self, initial: FilterState) -> Arc<Session> {
        let session = Arc::new(Session::new(Uuid::new_v4(), initial));
        let mut registry = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        while registry.order.len() >= self.capacity {
            if let Some(oldest) = registry.order.pop_front() {
                registry.sessions.remove(&oldest);
                info!("Evicted session {}", oldest);
            }
        }

        registry.order.push_back(session.id());
        registry.sessions.insert(session.id(), Arc::clone(&session));
        session
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<Session>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sessions
            .get(id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sessions
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
