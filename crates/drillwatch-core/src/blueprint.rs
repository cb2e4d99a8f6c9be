//! Settings bundle carried through blueprints and copy/paste.
//!
//! A device's [`DeviceSettings`] travel as JSON under the [`TAG_KEY`] entry
//! of the host's tag object. Other mods' entries in the same object are
//! left alone.

use drillwatch_types::DeviceSettings;
use serde_json::{Map, Value};

use crate::error::ControllerError;
use crate::registry::MonitoredDeviceRecord;

/// Key of the settings bundle in a tag object.
pub const TAG_KEY: &str = "drillwatch";

/// Settings to carry over from a record.
pub fn capture(record: &MonitoredDeviceRecord) -> DeviceSettings {
    record.settings.clone()
}

/// Overwrite a record's settings. The emitter is left for the next compose.
pub fn apply_settings(record: &mut MonitoredDeviceRecord, settings: DeviceSettings) {
    record.settings = settings;
}

/// Write `settings` into `tags`, creating the tag object if needed.
///
/// # Errors
///
/// Returns [`ControllerError::Tags`] if the settings cannot be encoded.
pub fn write_tags(tags: &mut Value, settings: &DeviceSettings) -> Result<(), ControllerError> {
    let encoded = serde_json::to_value(settings)?;
    if let Value::Object(map) = tags {
        map.insert(TAG_KEY.to_owned(), encoded);
    } else {
        let mut map = Map::new();
        map.insert(TAG_KEY.to_owned(), encoded);
        *tags = Value::Object(map);
    }
    Ok(())
}

/// A fresh tag object holding only `settings`.
///
/// # Errors
///
/// Returns [`ControllerError::Tags`] if the settings cannot be encoded.
pub fn to_tags(settings: &DeviceSettings) -> Result<Value, ControllerError> {
    let mut tags = Value::Object(Map::new());
    write_tags(&mut tags, settings)?;
    Ok(tags)
}

/// Read the settings bundle out of a tag object.
///
/// Returns `Ok(None)` when the object carries no bundle. Fields missing
/// from the bundle (an older schema) default to off.
///
/// # Errors
///
/// Returns [`ControllerError::Tags`] if the bundle is present but malformed.
pub fn from_tags(tags: &Value) -> Result<Option<DeviceSettings>, ControllerError> {
    match tags.get(TAG_KEY) {
        None | Some(Value::Null) => Ok(None),
        Some(bundle) => Ok(Some(serde_json::from_value(bundle.clone())?)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use drillwatch_types::SignalId;
    use serde_json::json;

    use super::*;

    #[test]
    fn bundle_lives_under_its_key_beside_foreign_tags() {
        let settings = DeviceSettings {
            depletion_signal_enabled: true,
            depletion_signal_override: Some(SignalId::virtual_signal("signal-E")),
            ..DeviceSettings::default()
        };
        let mut tags = json!({ "other-mod": { "color": "red" } });
        write_tags(&mut tags, &settings).unwrap();

        assert_eq!(tags["other-mod"]["color"], "red");
        assert_eq!(tags[TAG_KEY]["depletion_signal_enabled"], true);
        assert_eq!(from_tags(&tags).unwrap(), Some(settings));
    }

    #[test]
    fn missing_bundle_reads_as_none() {
        assert_eq!(from_tags(&json!({})).unwrap(), None);
        assert_eq!(from_tags(&Value::Null).unwrap(), None);
    }

    #[test]
    fn older_bundle_defaults_new_flags_off() {
        let tags = json!({ TAG_KEY: { "counter_enabled": true } });
        let settings = from_tags(&tags).unwrap().unwrap();
        assert!(settings.counter_enabled);
        assert!(!settings.effective_yield_enabled);
        assert!(settings.depletion_signal_override.is_none());
    }

    #[test]
    fn malformed_bundle_is_an_error() {
        let tags = json!({ TAG_KEY: { "counter_enabled": "yes" } });
        assert!(matches!(from_tags(&tags), Err(ControllerError::Tags { .. })));
    }
}
