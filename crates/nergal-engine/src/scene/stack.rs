use std::collections::HashMap;

use crate::render::MeshGroup;

use super::World;

/// A unit of gameplay: owns its emitters and layers, drives them while on top
/// of the [`SceneStack`].
pub trait Scene {
    /// Called when the scene becomes the top of the stack.
    fn activate(&mut self, world: &mut World) {
        let _ = world;
    }

    /// Called when another scene covers this one or it is popped.
    fn deactivate(&mut self, world: &mut World) {
        let _ = world;
    }

    fn update(&mut self, world: &mut World, delta: f32);

    /// Groups to draw this frame. Particle layers sync against `world` here.
    fn mesh_groups<'a>(&'a mut self, world: &World) -> Vec<&'a mut dyn MeshGroup>;
}

/// Named scenes plus the stack of currently pushed ones.
#[derive(Default)]
pub struct SceneStack {
    scenes: HashMap<String, Box<dyn Scene>>,
    stack: Vec<String>,
    changed: bool,
}

impl std::fmt::Debug for SceneStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneStack")
            .field("scenes", &self.scenes.keys().collect::<Vec<_>>())
            .field("stack", &self.stack)
            .finish()
    }
}

impl SceneStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `scene` under `id`, returning the scene it replaced.
    pub fn add_scene(
        &mut self,
        id: impl Into<String>,
        scene: impl Scene + 'static,
    ) -> Option<Box<dyn Scene>> {
        let id = id.into();
        if self.stack.contains(&id) {
            log::warn!("replacing scene `{id}` while it is on the stack");
        }
        self.scenes.insert(id, Box::new(scene))
    }

    /// Deactivates the current top and activates `id` on top of it.
    pub fn push_scene(&mut self, id: &str, world: &mut World) -> bool {
        if !self.scenes.contains_key(id) {
            log::warn!("failed to push scene: {id}");
            return false;
        }

        if let Some(top) = self.stack.last() {
            if let Some(current) = self.scenes.get_mut(top.as_str()) {
                current.deactivate(world);
            }
        }

        let Some(scene) = self.scenes.get_mut(id) else {
            return false;
        };
        scene.activate(world);
        self.stack.push(id.to_string());
        self.changed = true;
        log::debug!("pushed scene `{id}` (depth {})", self.stack.len());
        true
    }

    /// Pops the top scene and reactivates the one beneath it.
    pub fn pop_scene(&mut self, world: &mut World) -> Option<String> {
        let id = self.stack.pop()?;
        if let Some(scene) = self.scenes.get_mut(id.as_str()) {
            scene.deactivate(world);
        }
        if let Some(top) = self.stack.last() {
            if let Some(scene) = self.scenes.get_mut(top.as_str()) {
                scene.activate(world);
            }
        }
        self.changed = true;
        log::debug!("popped scene `{id}`");
        Some(id)
    }

    /// Pops every scene then pushes `id`.
    pub fn replace_all(&mut self, id: &str, world: &mut World) -> bool {
        if !self.scenes.contains_key(id) {
            log::warn!("failed to switch to scene: {id}");
            return false;
        }
        while let Some(top) = self.stack.pop() {
            if let Some(scene) = self.scenes.get_mut(top.as_str()) {
                scene.deactivate(world);
            }
        }
        self.push_scene(id, world)
    }

    pub fn get_scene(&self, id: &str) -> Option<&dyn Scene> {
        self.scenes.get(id).map(|s| s.as_ref())
    }

    pub fn get_scene_mut(&mut self, id: &str) -> Option<&mut (dyn Scene + 'static)> {
        self.scenes.get_mut(id).map(|s| s.as_mut())
    }

    pub fn top_id(&self) -> Option<&str> {
        self.stack.last().map(String::as_str)
    }

    pub fn top_mut(&mut self) -> Option<&mut (dyn Scene + 'static)> {
        let id = self.stack.last()?;
        self.scenes.get_mut(id.as_str()).map(|s| s.as_mut())
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Returns whether the top changed since the last call.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    type Journal = Rc<RefCell<Vec<String>>>;

    struct Probe {
        name: &'static str,
        journal: Journal,
    }

    impl Probe {
        fn new(name: &'static str, journal: &Journal) -> Self {
            Self {
                name,
                journal: journal.clone(),
            }
        }

        fn note(&self, what: &str) {
            self.journal.borrow_mut().push(format!("{}:{what}", self.name));
        }
    }

    impl Scene for Probe {
        fn activate(&mut self, _: &mut World) {
            self.note("activate");
        }

        fn deactivate(&mut self, _: &mut World) {
            self.note("deactivate");
        }

        fn update(&mut self, _: &mut World, _: f32) {
            self.note("update");
        }

        fn mesh_groups<'a>(&'a mut self, _: &World) -> Vec<&'a mut dyn MeshGroup> {
            Vec::new()
        }
    }

    fn stack_with(journal: &Journal) -> SceneStack {
        let mut stack = SceneStack::new();
        stack.add_scene("title", Probe::new("title", journal));
        stack.add_scene("game", Probe::new("game", journal));
        stack
    }

    #[test]
    fn push_deactivates_previous_top() {
        let journal = Journal::default();
        let mut world = World::default();
        let mut stack = stack_with(&journal);

        assert!(stack.push_scene("title", &mut world));
        assert!(stack.push_scene("game", &mut world));
        assert_eq!(stack.top_id(), Some("game"));
        assert_eq!(
            *journal.borrow(),
            ["title:activate", "title:deactivate", "game:activate"]
        );
    }

    #[test]
    fn pop_reactivates_new_top() {
        let journal = Journal::default();
        let mut world = World::default();
        let mut stack = stack_with(&journal);
        stack.push_scene("title", &mut world);
        stack.push_scene("game", &mut world);
        journal.borrow_mut().clear();

        assert_eq!(stack.pop_scene(&mut world).as_deref(), Some("game"));
        assert_eq!(*journal.borrow(), ["game:deactivate", "title:activate"]);
        assert_eq!(stack.depth(), 1);

        stack.pop_scene(&mut world);
        assert!(stack.pop_scene(&mut world).is_none());
        assert!(stack.top_mut().is_none());
    }

    #[test]
    fn unknown_scene_is_ignored() {
        let journal = Journal::default();
        let mut world = World::default();
        let mut stack = stack_with(&journal);
        stack.push_scene("title", &mut world);
        journal.borrow_mut().clear();

        assert!(!stack.push_scene("missing", &mut world));
        assert_eq!(stack.top_id(), Some("title"));
        assert!(journal.borrow().is_empty());
    }

    #[test]
    fn only_top_is_reachable_for_update() {
        let journal = Journal::default();
        let mut world = World::default();
        let mut stack = stack_with(&journal);
        stack.push_scene("title", &mut world);
        stack.push_scene("game", &mut world);
        assert!(stack.take_changed());
        assert!(!stack.take_changed());
        journal.borrow_mut().clear();

        if let Some(top) = stack.top_mut() {
            top.update(&mut world, 0.016);
        }
        assert_eq!(*journal.borrow(), ["game:update"]);
        assert!(stack.get_scene("title").is_some());
        assert!(stack.get_scene("missing").is_none());
    }

    #[test]
    fn replace_all_unwinds_stack() {
        let journal = Journal::default();
        let mut world = World::default();
        let mut stack = stack_with(&journal);
        stack.push_scene("title", &mut world);
        stack.push_scene("game", &mut world);

        assert!(stack.replace_all("title", &mut world));
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.top_id(), Some("title"));
    }
}
