//! Core aggregate and domain event traits.

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and named in past tense.
pub trait DomainEvent: Send + Sync + Clone {
    /// Returns the event type name carried in the `Event-Type` header.
    fn event_type(&self) -> &'static str;

    /// Returns the id of the aggregate the event belongs to.
    fn aggregate_id(&self) -> String;
}

/// Trait for aggregates rebuilt by applying events in log order.
///
/// Unlike a single-entity aggregate, an event here may refer to something
/// the aggregate no longer holds (a delete of a missing transaction), so
/// `apply` is fallible and a failed apply leaves the state unchanged.
pub trait Aggregate: Default + Send + Sync + Sized {
    /// The type of events this aggregate consumes.
    type Event: DomainEvent;

    /// The type of errors applying an event can produce.
    type Error: std::error::Error + Send + Sync;

    /// Returns the aggregate type name used to filter history.
    fn aggregate_type() -> &'static str;

    /// Applies an event to the aggregate, updating its state.
    fn apply(&mut self, event: Self::Event) -> Result<(), Self::Error>;

    /// Applies events in sequence, stopping at the first failure.
    fn apply_events(
        &mut self,
        events: impl IntoIterator<Item = Self::Event>,
    ) -> Result<(), Self::Error> {
        for event in events {
            self.apply(event)?;
        }
        Ok(())
    }
}
