//! [`ActorEntity`] implementation for [`PackageRecord`].
//!
//! A record is a package together with its event history. Every mutation goes through one
//! actor request, so the package write and the event append it causes are a single unit.

use super::RecordError;
use crate::model::{now, EventType, Package, PackageStatus, WarehouseEvent};
use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};
use keyed_actor::ActorEntity;

#[derive(Debug, Clone)]
pub struct PackageRecord {
    pub package: Package,
    /// Oldest first; timestamps strictly increase.
    pub events: Vec<WarehouseEvent>,
}

#[derive(Debug)]
pub struct NewRecord {
    pub package: Package,
    pub event: WarehouseEvent,
}

/// Appends an event that does not change the package.
#[derive(Debug)]
pub struct EventAppend(pub WarehouseEvent);

/// A status change and the event describing it.
#[derive(Debug, Clone)]
pub struct Transition {
    pub new_status: PackageStatus,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub event_type: EventType,
    pub description: String,
    /// Statuses the package must not currently be in.
    pub forbid: Vec<PackageStatus>,
    /// Status the package must currently be in, if any.
    pub expect: Option<PackageStatus>,
    /// Second event recorded after the transition event, in the same commit.
    pub follow_up: Option<(EventType, String)>,
}

impl Transition {
    pub fn new(new_status: PackageStatus, event_type: EventType, description: impl Into<String>) -> Self {
        Self {
            new_status,
            location: None,
            notes: None,
            event_type,
            description: description.into(),
            forbid: Vec::new(),
            expect: None,
            follow_up: None,
        }
    }

    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = location;
        self
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn forbidding(mut self, statuses: &[PackageStatus]) -> Self {
        self.forbid = statuses.to_vec();
        self
    }

    pub fn expecting(mut self, status: PackageStatus) -> Self {
        self.expect = Some(status);
        self
    }

    pub fn with_follow_up(mut self, event_type: EventType, description: impl Into<String>) -> Self {
        self.follow_up = Some((event_type, description.into()));
        self
    }
}

#[derive(Debug, Clone)]
pub struct Transitioned {
    pub package: Package,
    pub event: WarehouseEvent,
    pub follow_up: Option<WarehouseEvent>,
    pub previous: PackageStatus,
}

#[derive(Debug)]
pub enum RecordAction {
    Transition(Transition),
}

impl PackageRecord {
    fn next_event_time(&self) -> NaiveDateTime {
        let at = now();
        match self.events.last() {
            Some(last) => at.max(last.event_timestamp + Duration::microseconds(1)),
            None => at,
        }
    }

    fn push_event(&mut self, mut event: WarehouseEvent) -> WarehouseEvent {
        let at = self.next_event_time();
        event.event_timestamp = at;
        event.created_at = at;
        self.events.push(event.clone());
        event
    }

    fn transition(&mut self, transition: Transition) -> Result<Transitioned, RecordError> {
        let previous = self.package.status;
        let tracking_id = &self.package.tracking_id;

        if let Some(expected) = transition.expect {
            if expected != previous {
                return Err(RecordError::Unexpected {
                    tracking_id: tracking_id.clone(),
                    expected,
                    actual: previous,
                });
            }
        }
        if transition.forbid.contains(&previous) {
            return Err(RecordError::Forbidden {
                tracking_id: tracking_id.clone(),
                status: previous,
                reason: format!("cannot apply {} after {previous}", transition.event_type),
            });
        }

        let at = self.next_event_time();
        self.package
            .apply_status(transition.new_status, transition.location, transition.notes, at);

        let event = WarehouseEvent::new(transition.event_type, &self.package, transition.description)
            .with_transition(Some(previous), Some(transition.new_status));
        let event = self.push_event(event);
        let follow_up = transition.follow_up.map(|(event_type, description)| {
            self.push_event(WarehouseEvent::new(event_type, &self.package, description))
        });

        Ok(Transitioned {
            package: self.package.clone(),
            event,
            follow_up,
            previous,
        })
    }
}

#[async_trait]
impl ActorEntity for PackageRecord {
    type Id = String;
    type Create = NewRecord;
    type Update = EventAppend;
    type Action = RecordAction;
    type ActionResult = Transitioned;
    type Context = ();
    type Error = RecordError;

    fn from_create_params(id: String, params: NewRecord) -> Result<Self, Self::Error> {
        if params.package.tracking_id != id {
            return Err(RecordError::KeyMismatch {
                key: id,
                tracking_id: params.package.tracking_id,
            });
        }
        let mut record = Self {
            package: params.package,
            events: Vec::new(),
        };
        record.push_event(params.event);
        Ok(record)
    }

    async fn on_update(&mut self, update: EventAppend, _ctx: &()) -> Result<(), Self::Error> {
        self.push_event(update.0);
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: RecordAction,
        _ctx: &(),
    ) -> Result<Transitioned, Self::Error> {
        match action {
            RecordAction::Transition(transition) => self.transition(transition),
        }
    }
}
