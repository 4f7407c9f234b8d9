use std::any::{Any, type_name};

/// A value stored in [`StateCtx`](crate::StateCtx), keyed by its concrete type.
///
/// States are owned by the context thread. Commands never see a `State`
/// directly; they see the clone returned by [`State::snapshot`].
pub trait State: Any {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Clone handed to commands. `None` keeps the state out of command snapshots.
    fn snapshot(&self) -> Option<Box<dyn Any + Send>> {
        None
    }

    /// Applies an update routed to this state by an [`Updater`](crate::Updater).
    fn assign_box(&mut self, new_self: Box<dyn Any + Send>);
}

/// Standard `assign_box` body: replace `target` when the payload has the same type.
pub fn state_assign_impl<T: State>(target: &mut T, new_self: Box<dyn Any + Send>) {
    match new_self.downcast::<T>() {
        Ok(value) => *target = *value,
        Err(_) => log::warn!("Dropped update for {}: payload type mismatch", type_name::<T>()),
    }
}
