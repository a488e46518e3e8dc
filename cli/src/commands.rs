use std::path::PathBuf;
use std::sync::Arc;

use alembic_core::context::SettingsStore;
use alembic_core::drag::DropData;
use alembic_core::formulas::drag_payload;
use alembic_core::host::{ActorProvider, ChatAction, MemoryHost, NoticeLevel, TemplateRef};
use alembic_core::{Action, Alembic, AlembicError, HostEvent, Registry, TRACKER_KEY};
use alembic_types::{AlembicSettings, formatting};
use tokio::sync::Mutex;

type Tracker = Mutex<Alembic<MemoryHost>>;

// ─────────────────────────────────────────────────────────────────────────────
// Action builders
// ─────────────────────────────────────────────────────────────────────────────

pub fn use_vial() -> Action {
    Action::UseVial
}

pub fn add_vial() -> Action {
    Action::AddVial
}

pub fn add_vials(count: u32) -> Action {
    Action::AddVials(count)
}

pub fn refill() -> Action {
    Action::RefillVials
}

pub fn enqueue(uuid: &str, formula: bool) -> Action {
    let data = DropData {
        kind: "Item".to_string(),
        uuid: TemplateRef::from(uuid),
        is_formula: formula,
    };
    Action::DropOnTracker(data.to_json())
}

pub fn drop_payload(payload: String) -> Action {
    Action::DropOnTracker(payload)
}

pub fn remove(id: String) -> Action {
    Action::RemovePending(id)
}

pub fn reset() -> Action {
    Action::ResetDaily
}

pub fn learn(uuid: &str) -> Action {
    let data = DropData {
        kind: "Item".to_string(),
        uuid: TemplateRef::from(uuid),
        is_formula: false,
    };
    Action::DropOnFormulaBook(data.to_json())
}

pub fn share(uuid: String) -> Action {
    Action::ShareFormula(TemplateRef::new(uuid))
}

pub fn forget(uuid: String) -> Action {
    Action::ForgetFormula(TemplateRef::new(uuid))
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

pub struct Session {
    host: Arc<MemoryHost>,
    registry: Registry<Tracker>,
    settings: AlembicSettings,
    settings_path: Option<PathBuf>,
    world_time: u64,
}

impl Session {
    pub fn new(
        host: Arc<MemoryHost>,
        settings: AlembicSettings,
        settings_path: Option<PathBuf>,
    ) -> Self {
        Self {
            host,
            registry: Registry::new(),
            settings,
            settings_path,
            world_time: 0,
        }
    }

    fn tracker(&self) -> Arc<Tracker> {
        self.registry.get_or_create(TRACKER_KEY, || {
            Mutex::new(Alembic::new(
                Arc::clone(&self.host),
                self.settings,
                self.world_time,
            ))
        })
    }

    pub async fn open(&self) {
        self.tracker().lock().await.refresh_all().await;
    }

    pub async fn reopen(&self) {
        if self.registry.reset(TRACKER_KEY).is_some() {
            println!("Tracker closed.");
        }
        self.open().await;
        println!("Tracker opened.");
    }

    /// Run a UI action. Failures already surface as notices.
    pub async fn act(&self, action: Action) {
        let tracker = self.tracker();
        let mut tracker = tracker.lock().await;
        if let Err(e) = tracker.handle_action(action).await {
            tracing::debug!(error = %e, "Action failed");
        }
    }

    /// An empty queue is not a failure here; say so instead of warning.
    pub async fn commit(&self) {
        let tracker = self.tracker();
        let mut tracker = tracker.lock().await;
        match tracker.handle_action(Action::Commit).await {
            Ok(()) => {}
            Err(AlembicError::NothingToCommit) => println!("{}", formatting::nothing_to_commit()),
            Err(e) => tracing::debug!(error = %e, "Commit failed"),
        }
    }

    pub async fn status(&self) {
        let tracker = self.tracker();
        let tracker = tracker.lock().await;
        tracker.refresh().await;
        let view = tracker.subscribe().borrow().clone();

        match self.host.active_character().await {
            Some(actor) => println!("{} (Int {:+})", actor.name, view.int_mod),
            None => println!("{}", formatting::no_active_character()),
        }
        println!(
            "{}",
            formatting::vial_count_label(view.current_vials, view.max_vials)
        );
        println!(
            "{}",
            formatting::preparations_label(view.preparations_used(), view.max_items)
        );
        for item in &view.pending {
            println!("  pending  {}  {}", item.id, item.name);
        }
        for item in &view.spawned {
            println!("  spawned  {}  {}", item.id, item.name);
        }
    }

    pub async fn formulas(&self) {
        let tracker = self.tracker();
        let tracker = tracker.lock().await;
        tracker.refresh_formulas().await;
        let book = tracker.subscribe_formulas().borrow().clone();

        if book.is_empty() {
            println!("No known formulas.");
            return;
        }
        for (level, formulas) in &book.formulas_by_level {
            println!("Level {level}");
            for formula in formulas {
                let dc = formula.dc.map(|dc| format!(" (DC {dc})")).unwrap_or_default();
                println!("  {}{dc}", formula.name);
                println!("    drag: {}", drag_payload(formula));
            }
        }
    }

    pub async fn rest(&self) -> Result<(), String> {
        let actor = self
            .host
            .active_character()
            .await
            .ok_or_else(formatting::no_active_character)?;
        let tracker = self.tracker();
        tracker
            .lock()
            .await
            .handle_event(HostEvent::RestForTheNight { actor: actor.id })
            .await;
        Ok(())
    }

    pub async fn advance(&mut self, seconds: u64) {
        self.world_time = self.world_time.saturating_add(seconds);
        let tracker = self.tracker();
        tracker
            .lock()
            .await
            .handle_event(HostEvent::WorldTimeAdvanced {
                world_time: self.world_time,
            })
            .await;
        println!("World time: {}s", self.world_time);
    }

    pub async fn accept(&self) {
        let tracker = self.tracker();
        let mut tracker = tracker.lock().await;
        if let Err(e) = tracker.on_chat_action(ChatAction::AddVials).await {
            tracing::debug!(error = %e, "Prompt action failed");
        }
    }

    pub fn set_combat(&self, on: bool) {
        self.host.set_in_combat(on);
        println!("{}", if on { "Combat started." } else { "Combat ended." });
    }

    pub async fn update_settings(
        &mut self,
        vials: Option<u32>,
        preparations: Option<u32>,
    ) -> Result<(), String> {
        if vials.is_none() && preparations.is_none() {
            println!(
                "versatile_vials = {}\ndaily_preparations = {}",
                self.settings.versatile_vials, self.settings.daily_preparations
            );
            return Ok(());
        }

        let new = AlembicSettings {
            versatile_vials: vials.unwrap_or(self.settings.versatile_vials),
            daily_preparations: preparations.unwrap_or(self.settings.daily_preparations),
        };
        let tracker = self.tracker();
        tracker
            .lock()
            .await
            .handle_event(HostEvent::SettingsChanged(new))
            .await;
        self.settings = new;

        let saved = match &self.settings_path {
            Some(path) => new.save_path(path),
            None => new.save(),
        };
        saved.map_err(|e| e.to_string())
    }

    pub async fn defaults(&self) {
        let capacity = self.tracker().lock().await.default_capacity().await;
        println!(
            "Defaults: {} vials, {} daily preparations",
            capacity.max_vials, capacity.max_items
        );
    }

    /// Print and clear chat lines and notices produced by the last command.
    pub fn print_output(&self) {
        let (chat, notices) = self.host.take_output();
        for message in chat {
            let speaker = message
                .speaker
                .as_ref()
                .map_or_else(|| "system".to_string(), ToString::to_string);
            if message.is_whisper() {
                let to: Vec<&str> = message.whisper.iter().map(|u| u.as_str()).collect();
                println!("[whisper to {}] {}", to.join(", "), message.content);
            } else {
                println!("[chat] {speaker}: {}", message.content);
            }
            if message.action == Some(ChatAction::AddVials) {
                println!("       (type `accept` to add vials)");
            }
        }
        for (level, text) in notices {
            let tag = match level {
                NoticeLevel::Info => "info",
                NoticeLevel::Warn => "warn",
                NoticeLevel::Error => "error",
            };
            println!("[{tag}] {text}");
        }
    }
}
