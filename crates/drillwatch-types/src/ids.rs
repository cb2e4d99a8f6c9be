//! Type-safe identifier wrappers around host-assigned integers.
//!
//! The host world hands out plain integers for everything it owns. Each
//! kind of identifier gets its own newtype so a device unit number can
//! never be passed where an entity handle is expected.
//!
//! Identifiers are never minted by the controller itself; they always come
//! from the host (or from the in-memory simulation standing in for it).

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around `u64` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl $name {
            /// Return the raw integer assigned by the host.
            pub const fn into_inner(self) -> u64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Stable identity of a monitored device (the host's unit number).
    ///
    /// Unique while the device exists and never reused for another device
    /// during that time. The device registry is keyed by this value.
    DeviceId
}

define_id! {
    /// Handle to any entity owned by the host world.
    ///
    /// A handle may become invalid at any moment outside the controller's
    /// control, so validity must be re-checked before every use.
    EntityId
}

define_id! {
    /// Identity of an interactive session (one player's open panel).
    PlayerId
}

define_id! {
    /// Identity of the owning force; productivity bonuses are per force.
    ForceId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prints_raw_integer() {
        assert_eq!(DeviceId(42).to_string(), "42");
        assert_eq!(EntityId::from(7).into_inner(), 7);
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&DeviceId(19)).unwrap_or_default();
        assert_eq!(json, "19");
    }
}
