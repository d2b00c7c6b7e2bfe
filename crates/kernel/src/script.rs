use tileworld_assets::ScriptParameter;

/// A named piece of game script.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Script {
    pub id: String,
    pub code: String,
    pub description: String,
    pub parameters: Vec<ScriptParameter>,
    /// Generated scripts (trigger bodies) are hidden from script lists.
    pub hidden: bool,
}

impl Script {
    pub fn new(id: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            ..Default::default()
        }
    }
}

/// Ordered collection of scripts keyed by id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScriptManager {
    scripts: Vec<Script>,
}

impl ScriptManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Script> {
        self.scripts.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Script> {
        self.scripts.iter_mut().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Add a script, replacing one with the same id in place.
    pub fn insert(&mut self, script: Script) {
        match self.scripts.iter_mut().find(|s| s.id == script.id) {
            Some(existing) => *existing = script,
            None => self.scripts.push(script),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Script> {
        let index = self.scripts.iter().position(|s| s.id == id)?;
        Some(self.scripts.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Script> {
        self.scripts.iter()
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

/// Binds one of an object's events to a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub name: String,
    pub event: Option<String>,
    /// Id of the script run when the event fires.
    pub script: Option<String>,
    pub enabled: bool,
    pub fire_once: bool,
    pub description: String,
}

impl Trigger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            event: None,
            script: None,
            enabled: true,
            fire_once: false,
            description: String::new(),
        }
    }

    /// Enabled trigger named after its event.
    pub fn for_event(event: impl Into<String>, script: impl Into<String>) -> Self {
        let event = event.into();
        Self {
            event: Some(event.clone()),
            script: Some(script.into()),
            ..Self::new(event)
        }
    }
}

/// The triggers attached to one object.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Triggers {
    triggers: Vec<Trigger>,
}

impl Triggers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, trigger: Trigger) {
        self.triggers.push(trigger);
    }

    pub fn remove(&mut self, index: usize) -> Option<Trigger> {
        (index < self.triggers.len()).then(|| self.triggers.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trigger> {
        self.triggers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Trigger> {
        self.triggers.iter_mut()
    }

    /// Triggers listening to `event`.
    pub fn for_event<'a>(&'a self, event: &'a str) -> impl Iterator<Item = &'a Trigger> + 'a {
        self.triggers
            .iter()
            .filter(move |t| t.event.as_deref() == Some(event))
    }

    pub fn handles_event(&self, event: &str) -> bool {
        self.for_event(event).next().is_some()
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    pub fn clear(&mut self) {
        self.triggers.clear();
    }
}

impl FromIterator<Trigger> for Triggers {
    fn from_iter<I: IntoIterator<Item = Trigger>>(iter: I) -> Self {
        Self {
            triggers: iter.into_iter().collect(),
        }
    }
}

impl Extend<Trigger> for Triggers {
    fn extend<I: IntoIterator<Item = Trigger>>(&mut self, iter: I) {
        self.triggers.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_by_id() {
        let mut scripts = ScriptManager::new();
        scripts.insert(Script::new("open_door", "door.open();"));
        scripts.insert(Script::new("spawn", "spawn();"));
        scripts.insert(Script::new("open_door", "door.open(true);"));
        assert_eq!(scripts.len(), 2);
        assert_eq!(scripts.get("open_door").unwrap().code, "door.open(true);");
        let ids: Vec<&str> = scripts.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["open_door", "spawn"]);
    }

    #[test]
    fn triggers_filter_by_event() {
        let mut t = Triggers::new();
        t.push(Trigger::for_event("opened", "give_key"));
        t.push(Trigger::new("manual"));
        assert!(t.handles_event("opened"));
        assert!(!t.handles_event("closed"));
        assert_eq!(t.for_event("opened").count(), 1);
        assert!(t.iter().all(|t| t.enabled));
    }
}
