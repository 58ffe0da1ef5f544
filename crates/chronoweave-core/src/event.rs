//! Turn journal events.
//!
//! Every state change an engine makes during a turn is recorded as a
//! `TurnEvent`. The journal is returned with the turn result so the
//! persistence layer can store it alongside the World Model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::world::{ActorId, DynamicsType, MemoryType, ProtagonistAwareness, TensionType, TurnId};

/// Metadata attached to every journal event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Type name for deserialization routing.
    pub event_type: String,
    /// Turn that produced this event.
    pub turn_id: TurnId,
    /// Position within the turn, starting at 1.
    pub sequence_number: i64,
    /// Correlation ID for tracing a turn through its effects.
    pub correlation_id: Uuid,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

/// Trait that all journal events implement.
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Returns the event type name (used for serialization routing).
    fn event_type(&self) -> &'static str;

    /// Serializes the event payload to JSON.
    fn to_payload(&self) -> serde_json::Value;

    /// Returns the metadata for this event.
    fn metadata(&self) -> &EventMetadata;
}

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEventKind {
    /// A root chain was scheduled from a player choice.
    ChainCreated {
        /// The new chain.
        chain_id: Uuid,
        /// Its magnitude.
        magnitude: f64,
        /// When it will manifest.
        manifest_at_turn: TurnId,
    },
    /// A chain manifested, possibly branching.
    ChainMatured {
        /// The matured chain.
        chain_id: Uuid,
        /// Children spawned from it.
        child_ids: Vec<Uuid>,
    },
    /// A matured chain shifted an actor's relationships.
    RelationshipShifted {
        /// The actor.
        actor_id: ActorId,
        /// Signed shift.
        delta: i32,
        /// Why.
        reason: String,
    },
    /// A relationship web was formed.
    WebFormed {
        /// The new web.
        web_id: Uuid,
        /// Its dynamics.
        dynamics_type: DynamicsType,
    },
    /// A relationship web reached its terminal state.
    WebResolved {
        /// The web.
        web_id: Uuid,
    },
    /// A romantic tension was created.
    TensionCreated {
        /// The new tension.
        tension_id: Uuid,
        /// Its type.
        tension_type: TensionType,
    },
    /// Jealousy raised a tension.
    TensionEscalated {
        /// The tension.
        tension_id: Uuid,
        /// Level after escalation.
        tension_level: i32,
        /// Whether the jealousy threshold was crossed.
        threshold_crossed: bool,
    },
    /// A romantic tension reached its terminal state.
    TensionResolved {
        /// The tension.
        tension_id: Uuid,
    },
    /// Loop mechanics were armed.
    LoopInitialized {
        /// What armed them.
        trigger: String,
    },
    /// A rollback completed.
    LoopTriggered {
        /// Why the loop fired.
        reason: String,
        /// Iteration after the rollback.
        iteration: u32,
        /// Awareness after the rollback.
        awareness: ProtagonistAwareness,
        /// Memories that survived.
        memories_kept: usize,
        /// Memories that were lost.
        memories_discarded: usize,
    },
    /// The reset-scope state was snapshotted.
    CheckpointCaptured {
        /// Turn of the snapshot.
        turn_id: TurnId,
    },
    /// A memory was recorded.
    MemoryRecorded {
        /// Category of the memory.
        memory_type: MemoryType,
    },
    /// Temporal stability was restored.
    StabilityRestored {
        /// Stability after restoration.
        stability: i32,
    },
}

impl TurnEventKind {
    /// Dotted event type name.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ChainCreated { .. } => "consequence.chain_created",
            Self::ChainMatured { .. } => "consequence.chain_matured",
            Self::RelationshipShifted { .. } => "relationship.shifted",
            Self::WebFormed { .. } => "relationship.web_formed",
            Self::WebResolved { .. } => "relationship.web_resolved",
            Self::TensionCreated { .. } => "relationship.tension_created",
            Self::TensionEscalated { .. } => "relationship.tension_escalated",
            Self::TensionResolved { .. } => "relationship.tension_resolved",
            Self::LoopInitialized { .. } => "temporal.loop_initialized",
            Self::LoopTriggered { .. } => "temporal.loop_triggered",
            Self::CheckpointCaptured { .. } => "temporal.checkpoint_captured",
            Self::MemoryRecorded { .. } => "temporal.memory_recorded",
            Self::StabilityRestored { .. } => "temporal.stability_restored",
        }
    }
}

/// Journal event envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: TurnEventKind,
}

impl DomainEvent for TurnEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("TurnEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

/// Collects the events of a single turn.
#[derive(Debug, Clone)]
pub struct TurnJournal {
    turn_id: TurnId,
    correlation_id: Uuid,
    occurred_at: DateTime<Utc>,
    events: Vec<TurnEvent>,
}

impl TurnJournal {
    /// Opens a journal for `turn_id`, stamping every event with the clock's
    /// time at opening.
    #[must_use]
    pub fn new(turn_id: TurnId, correlation_id: Uuid, clock: &dyn Clock) -> Self {
        Self {
            turn_id,
            correlation_id,
            occurred_at: clock.now(),
            events: Vec::new(),
        }
    }

    /// Returns the next sequence number for a new event.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.events.len() as i64 + 1
    }

    /// Appends an event.
    pub fn record(&mut self, kind: TurnEventKind) {
        let event = TurnEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: kind.event_type().to_owned(),
                turn_id: self.turn_id,
                sequence_number: self.next_sequence_number(),
                correlation_id: self.correlation_id,
                occurred_at: self.occurred_at,
            },
            kind,
        };
        self.events.push(event);
    }

    /// Events recorded so far.
    #[must_use]
    pub fn events(&self) -> &[TurnEvent] {
        &self.events
    }

    /// Turn this journal belongs to.
    #[must_use]
    pub fn turn_id(&self) -> TurnId {
        self.turn_id
    }

    /// Consumes the journal.
    #[must_use]
    pub fn into_events(self) -> Vec<TurnEvent> {
        self.events
    }
}
