//! Core [`Component`] trait and payload conversion.
//!
//! The world stores every component as a [`Payload`] (a `serde_json::Value`)
//! keyed by its string type name, so new component kinds need no change to
//! the core. [`Component`] is the typed layer on top: a Rust type that names
//! itself and round-trips through the payload representation.
//!
//! ## Naming
//!
//! The type name is the only identity a component has inside the world.
//! Two Rust types reporting the same [`Component::type_name`] share storage,
//! and every consumer of a name must agree on its payload shape.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// The stored representation of one component instance.
pub type Payload = serde_json::Value;

/// Errors converting between typed components and stored payloads.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// The value could not be turned into a payload.
    #[error("failed to encode '{component}': {source}")]
    Encode {
        component: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The stored payload does not have the shape the reader expected.
    #[error("failed to decode '{component}': {source}")]
    Decode {
        component: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// A typed view of a string-named component.
///
/// # Examples
///
/// ```rust
/// use serde::{Serialize, Deserialize};
/// use engine_component::Component;
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {
///     fn type_name() -> &'static str { "Health" }
/// }
/// ```
pub trait Component: Serialize + DeserializeOwned + 'static {
    /// The component type name this Rust type is stored under.
    fn type_name() -> &'static str;

    /// Convert this value into its stored payload.
    ///
    /// # Errors
    ///
    /// Fails if the `Serialize` impl rejects the value (e.g. non-string map keys).
    fn to_payload(&self) -> Result<Payload, PayloadError> {
        serde_json::to_value(self).map_err(|source| PayloadError::Encode {
            component: Self::type_name(),
            source,
        })
    }

    /// Rebuild a typed value from a stored payload.
    ///
    /// # Errors
    ///
    /// Fails if the payload does not match this type's shape.
    fn from_payload(payload: &Payload) -> Result<Self, PayloadError> {
        <Self as serde::Deserialize>::deserialize(payload).map_err(|source| PayloadError::Decode {
            component: Self::type_name(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Health {
        current: f32,
        max: f32,
    }

    impl Component for Health {
        fn type_name() -> &'static str {
            "Health"
        }
    }

    #[test]
    fn test_to_payload_is_plain_json() {
        let health = Health {
            current: 75.0,
            max: 100.0,
        };
        assert_eq!(
            health.to_payload().unwrap(),
            json!({"current": 75.0, "max": 100.0})
        );
    }

    #[test]
    fn test_from_payload_reads_foreign_json() {
        // Written by a consumer that never saw the Rust type.
        let payload = json!({"current": 10, "max": 20});
        let health = Health::from_payload(&payload).unwrap();
        assert_eq!(
            health,
            Health {
                current: 10.0,
                max: 20.0
            }
        );
    }

    #[test]
    fn test_from_payload_shape_mismatch_names_component() {
        let err = Health::from_payload(&json!({"x": 1})).unwrap_err();
        assert!(matches!(err, PayloadError::Decode { component: "Health", .. }));
        assert!(err.to_string().starts_with("failed to decode 'Health'"));
    }
}
