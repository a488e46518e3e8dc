//! The Alembic tracker: vials, daily preparations and the formula book for
//! one client, driven by host events and UI actions.
//!
//! # Architecture
//!
//! ```text
//!   HostEvent (mpsc)            Action (UI)
//!         │                          │
//!         ▼                          ▼
//! ┌──────────────────────────────────────────────┐
//! │                  Alembic                     │
//! │  VialCounter · PreparationQueue · Formulas   │
//! │  (errors reported here, never propagated     │
//! │   into the UI shell)                         │
//! └──────────────────────────────────────────────┘
//!         │                          │
//!         ▼                          ▼
//!  watch<TrackerView>        watch<FormulaBookView>
//!         │                          │
//!         └──────── render adapter ──┘
//! ```


use std::num::NonZeroU32;
use std::sync::Arc;

use alembic_types::{AlembicSettings, FormulaBookView, TrackerView, formatting};
use tokio::sync::{mpsc, watch};

use crate::capacity::{self, Capacity, SharedSettings};
use crate::error::{AlembicError, Resource, Result};
use crate::events::{Action, HostEvent};
use crate::expiration::{self, ExpirationReport};
use crate::formulas::FormulaRegistry;
use crate::host::{
    Ability, ActorId, ChatAction, ChatMessage, Host, NoticeLevel, bound_character,
};
use crate::preparations::PreparationQueue;
use crate::vials::VialCounter;

/// In-game seconds between "add vials" prompts.
pub const PROMPT_INTERVAL_SECS: u64 = 600;

/// Vials offered by the prompt card.
pub const PROMPT_VIALS: u32 = 2;

pub struct Alembic<H> {
    host: Arc<H>,
    settings: SharedSettings,
    vials: VialCounter<H>,
    queue: PreparationQueue<H>,
    formulas: FormulaRegistry<H>,
    /// World time of the last ten-minute check
    last_checked_time: u64,
    view_tx: watch::Sender<TrackerView>,
    book_tx: watch::Sender<FormulaBookView>,
}

impl<H: Host> Alembic<H> {
    pub fn new(host: Arc<H>, settings: AlembicSettings, world_time: u64) -> Self {
        let settings = capacity::shared(settings);
        Self {
            vials: VialCounter::new(Arc::clone(&host), Arc::clone(&settings)),
            queue: PreparationQueue::new(Arc::clone(&host), Arc::clone(&settings)),
            formulas: FormulaRegistry::new(Arc::clone(&host)),
            host,
            settings,
            last_checked_time: world_time,
            view_tx: watch::Sender::new(TrackerView::default()),
            book_tx: watch::Sender::new(FormulaBookView::default()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TrackerView> {
        self.view_tx.subscribe()
    }

    pub fn subscribe_formulas(&self) -> watch::Receiver<FormulaBookView> {
        self.book_tx.subscribe()
    }

    pub fn vials(&self) -> &VialCounter<H> {
        &self.vials
    }

    pub fn queue(&self) -> &PreparationQueue<H> {
        &self.queue
    }

    pub fn formulas(&self) -> &FormulaRegistry<H> {
        &self.formulas
    }

    pub async fn settings(&self) -> AlembicSettings {
        *self.settings.read().await
    }

    /// Consume host events until the sender side is dropped.
    pub async fn run(&mut self, mut events: mpsc::Receiver<HostEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
        tracing::debug!("Host event channel closed");
    }

    // ─── Actions ────────────────────────────────────────────────────────────

    /// Run a UI action. Failures are reported to the user and returned for
    /// callers that care; views are refreshed either way.
    pub async fn handle_action(&mut self, action: Action) -> Result<()> {
        let result = self.dispatch(action).await;
        if let Err(e) = &result {
            self.report(e).await;
        }
        self.refresh().await;
        result
    }

    async fn dispatch(&mut self, action: Action) -> Result<()> {
        match action {
            Action::UseVial => {
                self.vials.decrement().await?;
            }
            Action::AddVial => {
                self.vials.increment().await?;
            }
            Action::AddVials(quantity) => {
                self.vials.add(quantity).await?;
            }
            Action::RefillVials => {
                self.vials.refill_to_max().await?;
            }
            Action::Enqueue { name, source } => {
                self.queue.enqueue(&name, &source).await?;
            }
            Action::DropOnTracker(payload) => {
                self.queue.accept_drop(&payload).await?;
            }
            Action::RemovePending(id) => {
                self.queue.remove(&id);
            }
            Action::Commit => {
                let outcome = self.queue.commit().await?;
                self.notify(
                    NoticeLevel::Info,
                    formatting::infused_added(outcome.committed.len()),
                )
                .await;
            }
            Action::ResetDaily => {
                self.queue.reset_daily();
                self.notify(NoticeLevel::Info, formatting::preparations_reset())
                    .await;
            }
            Action::DropOnFormulaBook(payload) => {
                if let Some(name) = self.formulas.learn(&payload).await? {
                    self.notify(NoticeLevel::Info, formatting::formula_learned(&name))
                        .await;
                }
                self.refresh_formulas().await;
            }
            Action::ForgetFormula(uuid) => {
                if self.formulas.forget(&uuid).await? {
                    self.notify(NoticeLevel::Info, formatting::formula_forgotten())
                        .await;
                }
                self.refresh_formulas().await;
            }
            Action::ShareFormula(uuid) => {
                self.formulas.share(&uuid).await?;
            }
        }
        Ok(())
    }

    // ─── Host events ────────────────────────────────────────────────────────

    pub async fn handle_event(&mut self, event: HostEvent) {
        let result = match event {
            HostEvent::WorldTimeAdvanced { world_time } => self.on_world_time(world_time).await,
            HostEvent::ActorUpdated {
                actor,
                formulas_changed,
            } => {
                if self.is_bound(&actor).await {
                    self.refresh().await;
                    if formulas_changed {
                        self.refresh_formulas().await;
                    }
                }
                Ok(())
            }
            HostEvent::ItemUpdated { actor, item } => {
                if self.is_bound(&actor).await {
                    tracing::trace!(item = %item, "Bound character item changed");
                    self.refresh().await;
                }
                Ok(())
            }
            HostEvent::RestForTheNight { actor } => {
                if self.is_bound(&actor).await {
                    self.rest().await.map(|_| ())
                } else {
                    Ok(())
                }
            }
            HostEvent::SettingsChanged(settings) => self.apply_settings(settings).await,
        };
        if let Err(e) = result {
            self.report(&e).await;
        }
    }

    async fn is_bound(&self, actor: &ActorId) -> bool {
        self.host
            .active_character()
            .await
            .is_some_and(|bound| &bound.id == actor)
    }

    /// Prompt for vials every ten in-game minutes outside combat.
    async fn on_world_time(&mut self, world_time: u64) -> Result<()> {
        if world_time < self.last_checked_time {
            // Clock was rewound
            self.last_checked_time = world_time;
            return Ok(());
        }
        if world_time - self.last_checked_time < PROMPT_INTERVAL_SECS {
            return Ok(());
        }
        self.last_checked_time = world_time;

        if self.host.in_combat().await {
            return Ok(());
        }
        // Nobody to prompt; not worth a warning every ten minutes
        let Some(actor) = self.host.active_character().await else {
            return Ok(());
        };
        let reading = self.vials.reading().await?;
        if reading.current < reading.max {
            let card = ChatMessage::public(&actor.id, formatting::ten_minutes_passed())
                .with_action(ChatAction::AddVials);
            self.host.post(card).await;
        }
        Ok(())
    }

    /// Full night's rest: refill vials, expire infused items, reset the day.
    pub async fn rest(&mut self) -> Result<ExpirationReport> {
        let actor = bound_character(&*self.host).await?;
        if let Err(e) = self.vials.refill_to_max().await {
            self.report(&e).await;
        }
        let report = expiration::expire_infused(&*self.host, &actor).await;
        self.queue.reset_daily();
        self.host
            .post(ChatMessage::public(&actor.id, formatting::preparations_reset()))
            .await;
        self.refresh().await;
        report
    }

    /// The chat card button for [`ChatAction::AddVials`].
    pub async fn on_chat_action(&mut self, action: ChatAction) -> Result<()> {
        match action {
            ChatAction::AddVials => self.handle_action(Action::AddVials(PROMPT_VIALS)).await,
        }
    }

    // ─── Settings ───────────────────────────────────────────────────────────

    /// Store new overrides. A lowered vial maximum is enforced by decrementing
    /// the inventory record; a changed preparation count restarts the day.
    ///
    /// The queue reset and view refresh happen even when the vial correction
    /// fails, so the queue never outlives a lowered preparation limit.
    pub async fn apply_settings(&mut self, new: AlembicSettings) -> Result<()> {
        let old = self.settings().await;
        let before = self.vials.reading().await.ok();

        self.vials
            .set_max(new.vials_override().and_then(NonZeroU32::new))
            .await;
        self.settings.write().await.daily_preparations = new.daily_preparations;

        if old.daily_preparations != new.daily_preparations {
            self.queue.reset_daily();
        }

        let corrected = match before {
            Some(before) => self.correct_vials(before.current).await,
            None => Ok(()),
        };

        tracing::info!(
            versatile_vials = new.versatile_vials,
            daily_preparations = new.daily_preparations,
            "Applied settings"
        );
        self.notify(NoticeLevel::Info, formatting::settings_updated())
            .await;
        self.refresh().await;
        corrected
    }

    /// Decrement down to the current maximum, one logged vial at a time.
    async fn correct_vials(&self, previous: u32) -> Result<()> {
        let max = self.vials.max().await?;
        if max >= previous {
            return Ok(());
        }
        let reduction = previous - max;
        for _ in 0..reduction {
            self.vials.decrement().await?;
        }
        self.notify(NoticeLevel::Info, formatting::vials_reduced(reduction))
            .await;
        Ok(())
    }

    /// Attribute-derived capacities for "reset to default" buttons.
    pub async fn default_capacity(&self) -> Capacity {
        let int_mod = match self.host.active_character().await {
            Some(actor) => self
                .host
                .ability_modifier(&actor.id, Ability::Int)
                .await
                .ok(),
            None => None,
        };
        Capacity::defaults(int_mod)
    }

    // ─── Views ──────────────────────────────────────────────────────────────

    async fn snapshot(&self) -> Result<TrackerView> {
        let actor = bound_character(&*self.host).await?;
        let capacity = Capacity::for_actor(&*self.host, &self.settings, &actor.id).await?;
        let reading = self.vials.reading().await?;
        Ok(TrackerView {
            int_mod: capacity.int_mod,
            current_vials: reading.current,
            max_vials: reading.max,
            pending: self.queue.pending().to_vec(),
            spawned: self.queue.spawned().to_vec(),
            max_items: capacity.max_items,
        })
    }

    /// Recompute the tracker view and push it to subscribers.
    pub async fn refresh(&self) {
        let view = match self.snapshot().await {
            Ok(view) => view,
            Err(AlembicError::MissingActor) => TrackerView {
                pending: self.queue.pending().to_vec(),
                spawned: self.queue.spawned().to_vec(),
                ..TrackerView::default()
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to refresh tracker view");
                return;
            }
        };
        self.view_tx.send_replace(view);
    }

    pub async fn refresh_formulas(&self) {
        let view = match self.formulas.by_level().await {
            Ok(view) => view,
            Err(AlembicError::MissingActor) => FormulaBookView::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to refresh formula book");
                return;
            }
        };
        self.book_tx.send_replace(view);
    }

    pub async fn refresh_all(&self) {
        self.refresh().await;
        self.refresh_formulas().await;
    }

    // ─── Reporting ──────────────────────────────────────────────────────────

    async fn notify(&self, level: NoticeLevel, text: String) {
        self.host.notify(level, text).await;
    }

    /// Turn an error into a user-facing notice.
    async fn report(&self, error: &AlembicError) {
        let (level, text) = match error {
            AlembicError::NothingToCommit => {
                tracing::debug!("Commit requested with nothing pending");
                return;
            }
            AlembicError::CapacityExceeded {
                resource: Resource::Vials,
                limit,
            } => (NoticeLevel::Warn, formatting::max_vials_reached(*limit)),
            AlembicError::CapacityExceeded {
                resource: Resource::Preparations,
                limit,
            } => (NoticeLevel::Warn, formatting::max_items_reached(*limit)),
            AlembicError::Empty => (NoticeLevel::Warn, formatting::no_vials()),
            AlembicError::MissingActor => (NoticeLevel::Warn, formatting::no_active_character()),
            AlembicError::AlreadyKnown { name } => {
                (NoticeLevel::Warn, formatting::formula_already_known(name))
            }
            AlembicError::NotConvertible { name } => {
                (NoticeLevel::Warn, formatting::formula_not_convertible(name))
            }
            AlembicError::CommitFailed(_) => (NoticeLevel::Error, formatting::commit_failed()),
            other => (NoticeLevel::Error, other.to_string()),
        };
        tracing::warn!(error = %error, "Alembic operation failed");
        self.notify(level, text).await;
    }
}
