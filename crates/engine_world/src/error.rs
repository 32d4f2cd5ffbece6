//! World-level error types.

use engine_component::{EntityId, PayloadError};

use crate::scheduler::SystemId;

/// Everything that can go wrong inside the world.
///
/// None of these are fatal: the world reports them through its
/// [`Reporter`](crate::Reporter), leaves its state untouched (or, for
/// listener and system failures, keeps the mutation that already happened),
/// and stays usable.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The entity was never created or has been destroyed.
    #[error("entity {0} is not alive")]
    EntityNotFound(EntityId),

    /// `update_component` on a type no entity has ever been given.
    #[error("component type '{component}' has never been added (entity {entity})")]
    UnknownComponentType { entity: EntityId, component: String },

    /// `remove_system` with an id that is not registered.
    #[error("system {0} is not registered")]
    SystemNotFound(SystemId),

    /// A typed accessor could not convert a payload.
    #[error("{source} (entity {entity})")]
    Payload {
        entity: EntityId,
        #[source]
        source: PayloadError,
    },

    /// A change listener returned an error or panicked.
    #[error("listener for '{component}' on {entity} failed: {message}")]
    ListenerFailed {
        entity: EntityId,
        component: String,
        message: String,
    },

    /// `update` was called while a frame was already running.
    #[error("update called during frame {frame}; nested call ignored")]
    NestedUpdate { frame: u64 },

    /// A system returned an error or panicked during `update`.
    #[error("system '{name}' failed: {message}")]
    SystemFailed { name: String, message: String },
}

impl WorldError {
    /// How loudly this error should be reported.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::EntityNotFound(_)
            | Self::UnknownComponentType { .. }
            | Self::SystemNotFound(_)
            | Self::NestedUpdate { .. } => Severity::Warn,
            Self::Payload { .. } | Self::ListenerFailed { .. } | Self::SystemFailed { .. } => {
                Severity::Error
            }
        }
    }
}

/// Report level of a [`WorldError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Misuse that was ignored as a no-op.
    Warn,
    /// Something failed while running user code or converting data.
    Error,
}

/// Render a caught panic payload as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_split() {
        assert_eq!(WorldError::EntityNotFound(EntityId(1)).severity(), Severity::Warn);
        let failed = WorldError::SystemFailed {
            name: "physics".into(),
            message: "boom".into(),
        };
        assert_eq!(failed.severity(), Severity::Error);
        assert_eq!(failed.to_string(), "system 'physics' failed: boom");
        let nested = WorldError::NestedUpdate { frame: 3 };
        assert_eq!(nested.severity(), Severity::Warn);
        assert_eq!(nested.to_string(), "update called during frame 3; nested call ignored");
    }

    #[test]
    fn test_panic_message_variants() {
        let s: Box<dyn std::any::Any + Send> = Box::new("static");
        assert_eq!(panic_message(s.as_ref()), "static");
        let owned: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned.as_ref()), "owned");
        let other: Box<dyn std::any::Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(other.as_ref()), "panic with non-string payload");
    }
}
