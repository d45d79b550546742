//! Debounced update coordinator
//!
//! Owns the scheduler, the per-token overlay trees, and the host
//! collaborators; turns drained deltas into resolution passes and applies
//! the results. One flush processes the whole settled batch; collaborator
//! failures are logged and contained per token.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use effigy_types::Settings;

use crate::host::{Broadcast, ImageApplier, ScriptRunner, TokenProvider};
use crate::mappings::{MappingStore, ScriptKind, resolve};
use crate::overlay::{OverlayTree, SceneBackend, clear_tree, reconcile};

use super::{EffectDelta, UpdateScheduler};

/// Overlay trees share one lock with the backend: a reconcile pass never
/// interleaves with another.
struct SceneState<B: SceneBackend> {
    backend: B,
    trees: HashMap<String, OverlayTree<B::Handle>>,
}

pub struct Coordinator<B: SceneBackend> {
    scheduler: Mutex<UpdateScheduler>,
    provider: Arc<dyn TokenProvider>,
    store: Arc<RwLock<MappingStore>>,
    settings: Arc<RwLock<Settings>>,
    applier: Arc<dyn ImageApplier>,
    runner: Arc<dyn ScriptRunner>,
    broadcast: Arc<dyn Broadcast>,
    scene: Mutex<SceneState<B>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl<B> Coordinator<B>
where
    B: SceneBackend + Send + 'static,
    B::Handle: Send,
{
    pub fn new(
        provider: Arc<dyn TokenProvider>,
        store: Arc<RwLock<MappingStore>>,
        settings: Arc<RwLock<Settings>>,
        applier: Arc<dyn ImageApplier>,
        runner: Arc<dyn ScriptRunner>,
        broadcast: Arc<dyn Broadcast>,
        backend: B,
    ) -> Self {
        let delay = Duration::from_millis(Settings::default().debounce_ms);
        Self {
            scheduler: Mutex::new(UpdateScheduler::new(delay)),
            provider,
            store,
            settings,
            applier,
            runner,
            broadcast,
            scene: Mutex::new(SceneState {
                backend,
                trees: HashMap::new(),
            }),
            timer: Mutex::new(None),
        }
    }

    /// Queue an effect delta for a token. Resets the settle timer; the
    /// batch flushes once no further changes arrive within the configured
    /// debounce window.
    pub async fn request_update(self: &Arc<Self>, token_id: &str, delta: EffectDelta) {
        let delay = Duration::from_millis(self.settings.read().await.debounce_ms);
        {
            let mut scheduler = self.scheduler.lock().await;
            scheduler.set_delay(delay);
            scheduler.schedule(token_id, delta);
        }

        let this = Arc::clone(self);
        let mut timer = self.timer.lock().await;
        if let Some(handle) = timer.take() {
            handle.abort();
        }
        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            this.flush().await;
        }));
    }

    /// Drain and process the whole pending batch immediately
    pub async fn flush(&self) {
        let batch = self.scheduler.lock().await.drain();
        for (token_id, delta) in batch {
            self.process(&token_id, delta).await;
        }
    }

    async fn process(&self, token_id: &str, delta: EffectDelta) {
        let Some(token) = self.provider.snapshot(token_id) else {
            tracing::debug!(token = token_id, "token gone before flush");
            return;
        };
        let token = token.as_ref();

        let mappings = self.store.read().await.for_token(token);
        let settings = self.settings.read().await.clone();
        let resolution = resolve(
            token,
            &mappings,
            &settings,
            Some(self.runner.as_ref()),
            &delta.added,
            &delta.removed,
        );

        // Deferred hooks gate the visual update: a script that never calls
        // its continuation (or faults) abandons the rest of the pass.
        for call in &resolution.scripts.deferred {
            let ScriptKind::Script(source) = &call.kind else {
                continue;
            };
            let advanced = match self.runner.run_deferred(token_id, source).await {
                Ok(advanced) => advanced,
                Err(error) => {
                    tracing::warn!(mapping = %call.mapping_id, %error, "deferred script failed");
                    false
                }
            };
            if !advanced {
                tracing::debug!(mapping = %call.mapping_id, "update abandoned by deferred script");
                self.broadcast.overlays_changed(token_id);
                return;
            }
        }

        if !resolution.update.is_empty() {
            if let Err(error) = self.applier.apply(token_id, &resolution.update).await {
                tracing::warn!(token = token_id, %error, "visual update failed");
            }
        }

        {
            let mut scene = self.scene.lock().await;
            let SceneState { backend, trees } = &mut *scene;
            let tree = trees.entry(token_id.to_string()).or_default();
            reconcile(tree, &resolution.overlays, backend);
            if tree.is_empty() {
                trees.remove(token_id);
            }
        }

        for call in &resolution.scripts.immediate {
            let outcome = match &call.kind {
                ScriptKind::Script(source) => self.runner.run_script(token_id, source).await,
                ScriptKind::Preset { name, action } => {
                    self.runner.run_preset(token_id, name, *action).await
                }
            };
            if let Err(error) = outcome {
                tracing::warn!(mapping = %call.mapping_id, %error, "script hook failed");
            }
        }

        self.broadcast.overlays_changed(token_id);
    }

    /// Recompute and reconcile a token's overlays without a delta and
    /// without visual/script side effects. Serves remote change
    /// notifications: each client rebuilds its own scene locally.
    pub async fn refresh_overlays(&self, token_id: &str) {
        let Some(token) = self.provider.snapshot(token_id) else {
            let mut scene = self.scene.lock().await;
            let SceneState { backend, trees } = &mut *scene;
            if let Some(mut tree) = trees.remove(token_id) {
                clear_tree(&mut tree, backend);
            }
            return;
        };
        let token = token.as_ref();

        let mappings = self.store.read().await.for_token(token);
        let settings = self.settings.read().await.clone();
        let empty = HashSet::new();
        let resolution = resolve(
            token,
            &mappings,
            &settings,
            Some(self.runner.as_ref()),
            &empty,
            &empty,
        );

        let mut scene = self.scene.lock().await;
        let SceneState { backend, trees } = &mut *scene;
        let tree = trees.entry(token_id.to_string()).or_default();
        reconcile(tree, &resolution.overlays, backend);
        if tree.is_empty() {
            trees.remove(token_id);
        }
    }

    /// Drop all overlay state for a deleted token
    pub async fn forget_token(&self, token_id: &str) {
        self.scheduler.lock().await.forget(token_id);

        let mut scene = self.scene.lock().await;
        let SceneState { backend, trees } = &mut *scene;
        if let Some(mut tree) = trees.remove(token_id) {
            clear_tree(&mut tree, backend);
        }
    }
}
