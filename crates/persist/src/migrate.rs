//! Conversion of pre-trigger event data into triggers.

use tileworld_kernel::{ScriptManager, Trigger};
use tileworld_properties::Properties;

use crate::format::VERSION_LEGACY_SCRIPTS;

/// Property names under which version 2 files stored the script for `event`.
fn legacy_property_names(event: &str) -> [String; 4] {
    [
        event.to_string(),
        format!("{event}d"),
        format!("{event}ed"),
        format!("event_{event}"),
    ]
}

fn has_trigger(triggers: &[Trigger], event: &str) -> bool {
    triggers.iter().any(|t| t.event.as_deref() == Some(event))
}

/// Turn one object's legacy event data into triggers.
///
/// Every `(event, script)` entry of the flat map becomes a trigger. Version 2
/// files additionally hid script ids in string properties named after the
/// event; for each event in `defined_events` those properties are removed
/// and the first one naming an existing script becomes a trigger, unless the
/// event already got one from the map. At most one trigger is produced per
/// event.
pub fn migrate_events(
    version: i32,
    properties: &mut Properties,
    legacy_map: &[(String, String)],
    defined_events: &[&str],
    scripts: &ScriptManager,
) -> Vec<Trigger> {
    let mut triggers: Vec<Trigger> = Vec::new();

    for (event, script) in legacy_map {
        if !has_trigger(&triggers, event.as_str()) {
            triggers.push(Trigger::for_event(event.as_str(), script.as_str()));
        }
    }

    if version <= VERSION_LEGACY_SCRIPTS {
        for event in defined_events {
            for name in legacy_property_names(event) {
                let Some(script) = properties
                    .own_property(&name)
                    .and_then(|p| p.value.as_str())
                    .filter(|id| scripts.contains(id))
                    .map(str::to_string)
                else {
                    continue;
                };
                properties.remove(&name);
                if !has_trigger(&triggers, event) {
                    tracing::debug!(
                        event = *event,
                        property = %name,
                        %script,
                        "migrated legacy event property"
                    );
                    triggers.push(Trigger::for_event(*event, script));
                }
            }
        }
    }
    triggers
}

#[cfg(test)]
mod tests {
    use super::*;
    use tileworld_kernel::Script;

    fn scripts() -> ScriptManager {
        let mut s = ScriptManager::new();
        s.insert(Script::new("give_key", "give(key);"));
        s.insert(Script::new("alarm", "alarm();"));
        s
    }

    #[test]
    fn legacy_property_becomes_single_trigger() {
        let mut props = Properties::new();
        props.set("opened", "give_key");
        let triggers = migrate_events(2, &mut props, &[], &["opened"], &scripts());
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].event.as_deref(), Some("opened"));
        assert_eq!(triggers[0].script.as_deref(), Some("give_key"));
        assert!(!props.contains("opened"));
    }

    #[test]
    fn suffix_and_prefix_variants_match() {
        let mut props = Properties::new();
        props.set("opend", "give_key");
        props.set("event_open", "alarm");
        let triggers = migrate_events(2, &mut props, &[], &["open"], &scripts());
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].script.as_deref(), Some("give_key"));
        assert!(props.is_empty());
    }

    #[test]
    fn flat_map_entry_wins_over_property() {
        let mut props = Properties::new();
        props.set("opened", "alarm");
        let map = vec![("opened".to_string(), "give_key".to_string())];
        let triggers = migrate_events(2, &mut props, &map, &["opened"], &scripts());
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].script.as_deref(), Some("give_key"));
        assert!(!props.contains("opened"));
    }

    #[test]
    fn non_script_values_are_left_alone() {
        let mut props = Properties::new();
        props.set("opened", "not_a_script");
        props.set("opened_count", 3);
        let triggers = migrate_events(2, &mut props, &[], &["opened"], &scripts());
        assert!(triggers.is_empty());
        assert_eq!(props.get_string("opened", ""), "not_a_script");
    }

    #[test]
    fn version_three_only_uses_the_map() {
        let mut props = Properties::new();
        props.set("opened", "give_key");
        let map = vec![("room_start".to_string(), "alarm".to_string())];
        let triggers = migrate_events(3, &mut props, &map, &["opened"], &scripts());
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].event.as_deref(), Some("room_start"));
        assert!(props.contains("opened"));
    }
}
