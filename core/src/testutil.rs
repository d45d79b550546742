//! Shared test doubles for the host collaborator traits

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use effigy_types::ImageRef;

use crate::error::RenderError;
use crate::host::{
    Broadcast, HostError, HpDelta, ImageApplier, PresetAction, PropertyValue, ScriptRunner,
    TokenProvider, TokenState, TurnMarker, VisualUpdate,
};
use crate::overlay::{Layer, OverlayNodeConfig, SceneBackend};

// ─── Token ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MockToken {
    pub id: String,
    pub actor_type: String,
    pub linked: bool,
    pub hidden: bool,
    pub in_combat: bool,
    pub turn: TurnMarker,
    pub hp_delta: Option<HpDelta>,
    pub dead: bool,
    pub actor_effects: Vec<String>,
    pub instance_effects: Vec<String>,
    pub items: Vec<String>,
    pub image: ImageRef,
    pub default_image: Option<ImageRef>,
    pub properties: HashMap<String, PropertyValue>,
}

impl MockToken {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            actor_type: "character".to_string(),
            linked: true,
            hidden: false,
            in_combat: false,
            turn: TurnMarker::None,
            hp_delta: None,
            dead: false,
            actor_effects: Vec::new(),
            instance_effects: Vec::new(),
            items: Vec::new(),
            image: ImageRef {
                src: "tokens/base.png".to_string(),
                name: String::new(),
            },
            default_image: None,
            properties: HashMap::new(),
        }
    }

    pub fn with_effects(mut self, names: &[&str]) -> Self {
        self.actor_effects = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_property(mut self, path: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(path.into(), value);
        self
    }
}

impl TokenState for MockToken {
    fn id(&self) -> &str {
        &self.id
    }

    fn actor_type(&self) -> &str {
        &self.actor_type
    }

    fn is_linked(&self) -> bool {
        self.linked
    }

    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn in_combat(&self) -> bool {
        self.in_combat
    }

    fn turn_marker(&self) -> TurnMarker {
        self.turn
    }

    fn hp_delta(&self) -> Option<HpDelta> {
        self.hp_delta
    }

    fn is_dead(&self) -> bool {
        self.dead
    }

    fn actor_effect_names(&self) -> Vec<String> {
        self.actor_effects.clone()
    }

    fn instance_effect_names(&self) -> Vec<String> {
        self.instance_effects.clone()
    }

    fn equipped_item_names(&self) -> Vec<String> {
        self.items.clone()
    }

    fn current_image(&self) -> ImageRef {
        self.image.clone()
    }

    fn default_image(&self) -> Option<ImageRef> {
        self.default_image.clone()
    }

    fn resolve_property(&self, path: &str) -> Option<PropertyValue> {
        self.properties.get(path).cloned()
    }
}

// ─── Collaborators ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockProvider {
    tokens: Mutex<HashMap<String, MockToken>>,
}

impl MockProvider {
    pub fn insert(&self, token: MockToken) {
        self.tokens
            .lock()
            .unwrap()
            .insert(token.id.clone(), token);
    }
}

impl TokenProvider for MockProvider {
    fn snapshot(&self, token_id: &str) -> Option<Box<dyn TokenState + Send + Sync>> {
        self.tokens
            .lock()
            .unwrap()
            .get(token_id)
            .cloned()
            .map(|t| Box::new(t) as Box<dyn TokenState + Send + Sync>)
    }
}

#[derive(Default)]
pub struct MockApplier {
    applied: Mutex<Vec<(String, VisualUpdate)>>,
    pub fail: bool,
}

impl MockApplier {
    pub fn applied(&self) -> Vec<(String, VisualUpdate)> {
        self.applied.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageApplier for MockApplier {
    async fn apply(&self, token_id: &str, update: &VisualUpdate) -> Result<(), HostError> {
        if self.fail {
            return Err(HostError::msg("apply refused"));
        }
        self.applied
            .lock()
            .unwrap()
            .push((token_id.to_string(), update.clone()));
        Ok(())
    }
}

#[derive(Clone)]
pub struct MockRunner {
    pub deferred_result: bool,
    pub predicate_result: bool,
    scripts: Arc<Mutex<Vec<String>>>,
    deferred: Arc<Mutex<Vec<String>>>,
    presets: Arc<Mutex<Vec<(String, PresetAction)>>>,
}

impl Default for MockRunner {
    fn default() -> Self {
        Self {
            deferred_result: true,
            predicate_result: true,
            scripts: Arc::new(Mutex::new(Vec::new())),
            deferred: Arc::new(Mutex::new(Vec::new())),
            presets: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockRunner {
    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().unwrap().clone()
    }

    pub fn deferred(&self) -> Vec<String> {
        self.deferred.lock().unwrap().clone()
    }

    pub fn presets(&self) -> Vec<(String, PresetAction)> {
        self.presets.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScriptRunner for MockRunner {
    async fn run_script(&self, _token_id: &str, source: &str) -> Result<(), HostError> {
        self.scripts.lock().unwrap().push(source.to_string());
        Ok(())
    }

    async fn run_deferred(&self, _token_id: &str, source: &str) -> Result<bool, HostError> {
        self.deferred.lock().unwrap().push(source.to_string());
        Ok(self.deferred_result)
    }

    async fn run_preset(
        &self,
        _token_id: &str,
        name: &str,
        action: PresetAction,
    ) -> Result<(), HostError> {
        self.presets
            .lock()
            .unwrap()
            .push((name.to_string(), action));
        Ok(())
    }

    fn eval_predicate(&self, _token: &dyn TokenState, _source: &str) -> Result<bool, HostError> {
        Ok(self.predicate_result)
    }
}

#[derive(Default)]
pub struct MockBroadcast {
    events: Mutex<Vec<String>>,
}

impl MockBroadcast {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl Broadcast for MockBroadcast {
    fn overlays_changed(&self, token_id: &str) {
        self.events.lock().unwrap().push(token_id.to_string());
    }
}

// ─── Scene backend ──────────────────────────────────────────────────────────

/// Records every backend call; handles are sequential integers.
#[derive(Debug, Default)]
pub struct MockBackend {
    next: u32,
    pub fail_create: bool,
    pub created: Vec<(u32, String)>,
    pub destroyed: Vec<u32>,
    pub refreshed: Vec<u32>,
    pub regenerated: Vec<u32>,
    pub reparented: Vec<(u32, Option<u32>)>,
    pub layer_moves: Vec<(u32, Layer)>,
    pub sorts: Vec<(u32, i32)>,
}

impl MockBackend {
    /// Backend that refuses every create call until `fail_create` is reset
    pub fn failing() -> Self {
        Self {
            fail_create: true,
            ..Self::default()
        }
    }
}

impl SceneBackend for MockBackend {
    type Handle = u32;

    fn create(
        &mut self,
        config: &OverlayNodeConfig,
        _layer: Layer,
        _parent: Option<&u32>,
    ) -> Result<u32, RenderError> {
        if self.fail_create {
            return Err(RenderError::Backend("create refused".to_string()));
        }
        self.next += 1;
        self.created.push((self.next, config.id.clone()));
        Ok(self.next)
    }

    fn refresh(&mut self, handle: &mut u32, _config: &OverlayNodeConfig) {
        self.refreshed.push(*handle);
    }

    fn regenerate(&mut self, handle: &mut u32, _config: &OverlayNodeConfig) -> Result<(), RenderError> {
        self.regenerated.push(*handle);
        Ok(())
    }

    fn reparent(&mut self, handle: &mut u32, parent: Option<&u32>) {
        self.reparented.push((*handle, parent.copied()));
    }

    fn set_layer(&mut self, handle: &mut u32, layer: Layer) {
        self.layer_moves.push((*handle, layer));
    }

    fn set_sort(&mut self, handle: &mut u32, sort: i32) {
        self.sorts.push((*handle, sort));
    }

    fn destroy(&mut self, handle: u32) {
        self.destroyed.push(handle);
    }
}
