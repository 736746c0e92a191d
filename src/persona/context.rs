//! The persona: one owned context tying phrases, history, throttle, sink,
//! idle chat and task events together.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Duration as CooldownDuration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use tracing::{debug, info, warn};

use crate::config::Config;

use super::events::{EventBridge, TaskEvent, TaskEventFeed};
use super::history::{HistoryStore, Utterance};
use super::phrases::Category;
use super::remote::RemoteLog;
use super::scheduler::IdleScheduler;
use super::selector;
use super::sink::{self, VoiceSink};
use super::speaker::{Clock, SpeakOutcome, Speaker, SystemClock};

/// Actions the idle timer chooses between.
const IDLE_ACTIONS: [Category; 4] = [
    Category::IdleChatter,
    Category::Status,
    Category::Encouragement,
    Category::WorkUpdate,
];

/// Longest idle-chat period accepted from config.
const MAX_IDLE_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Chance of each optional segment in an extended monologue.
const MONOLOGUE_STATUS_CHANCE: f64 = 0.5;
const MONOLOGUE_WORK_CHANCE: f64 = 0.5;
const MONOLOGUE_CHATTER_CHANCE: f64 = 0.3;

/// Outside dependencies a persona is built from.
pub struct PersonaDeps {
    pub remote: Option<Arc<RemoteLog>>,
    pub sink: Option<Arc<dyn VoiceSink>>,
    pub clock: Arc<dyn Clock>,
    pub rng: Box<dyn RngCore + Send>,
}

impl PersonaDeps {
    pub fn from_config(config: &Config) -> Self {
        let remote = config.remote_log.enabled.then(|| {
            Arc::new(RemoteLog::new(
                &config.remote_log.base_url,
                &config.persona.id,
                Duration::from_secs(config.remote_log.timeout_secs),
            ))
        });

        Self {
            remote,
            sink: sink::from_config(&config.voice),
            clock: Arc::new(SystemClock),
            rng: Box::new(StdRng::from_entropy()),
        }
    }
}

pub struct Persona {
    id: String,
    greeting_delay: Duration,
    separator: String,
    idle_chance: f64,
    history: Arc<HistoryStore>,
    speaker: Speaker,
    rng: Mutex<Box<dyn RngCore + Send>>,
    idle: IdleScheduler,
}

impl Persona {
    pub fn new(config: &Config, deps: PersonaDeps) -> Self {
        let history = Arc::new(HistoryStore::new(config.persona.history_capacity, deps.remote));
        let cooldown = CooldownDuration::milliseconds(
            i64::try_from(config.persona.cooldown_ms).unwrap_or(i64::MAX),
        );
        let speaker = Speaker::new(cooldown, history.clone(), deps.sink, deps.clock);

        let idle_chance = if (0.0..=1.0).contains(&config.idle.chance) {
            config.idle.chance
        } else {
            warn!("Idle chance {} out of range, using 0.5", config.idle.chance);
            0.5
        };

        let interval_secs = config.idle.interval_secs.clamp(1, MAX_IDLE_INTERVAL_SECS);
        if interval_secs != config.idle.interval_secs {
            warn!(
                "Idle interval {}s out of range, using {interval_secs}s",
                config.idle.interval_secs
            );
        }

        Self {
            id: config.persona.id.clone(),
            greeting_delay: Duration::from_secs(config.persona.greeting_delay_secs),
            separator: config.persona.monologue_separator.clone(),
            idle_chance,
            history,
            speaker,
            rng: Mutex::new(deps.rng),
            idle: IdleScheduler::new(Duration::from_secs(interval_secs)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn rng(&self) -> MutexGuard<'_, Box<dyn RngCore + Send>> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load history, start idle chat, subscribe to task events, and queue
    /// the opening greeting.
    pub async fn initialize(self: &Arc<Self>, feed: Option<&dyn TaskEventFeed>, idle: bool) {
        self.history.load_from_remote().await;

        if idle {
            self.start_idle();
        }
        EventBridge::attach(self, feed);

        let persona = Arc::downgrade(self);
        let delay = self.greeting_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(persona) = persona.upgrade() {
                persona.greet(false);
            }
        });
        info!("Persona '{}' initialized", self.id);
    }

    pub fn pick(&self, category: Category) -> &'static str {
        selector::pick(category, &self.history, &mut **self.rng())
    }

    /// Pick a phrase for `category` and speak it.
    pub fn say(&self, category: Category, force: bool) -> (&'static str, SpeakOutcome) {
        let text = self.pick(category);
        debug!("Selected {category} phrase");
        (text, self.speaker.speak(text, force))
    }

    pub fn greet(&self, force: bool) -> (&'static str, SpeakOutcome) {
        self.say(Category::Greeting, force)
    }

    pub fn farewell(&self, force: bool) -> (&'static str, SpeakOutcome) {
        self.say(Category::Farewell, force)
    }

    /// Greeting, optional status / work / chatter lines, then encouragement,
    /// spoken as one forced utterance.
    pub fn speak_extended(&self) -> (String, SpeakOutcome) {
        // Each optional segment rolls its own dice, before any phrase is picked
        let optional = {
            let mut rng = self.rng();
            [
                (Category::Status, rng.gen_bool(MONOLOGUE_STATUS_CHANCE)),
                (Category::WorkUpdate, rng.gen_bool(MONOLOGUE_WORK_CHANCE)),
                (Category::IdleChatter, rng.gen_bool(MONOLOGUE_CHATTER_CHANCE)),
            ]
        };

        let mut segments = vec![self.pick(Category::Greeting)];
        for (category, _) in optional.iter().filter(|(_, include)| *include) {
            segments.push(self.pick(*category));
        }
        segments.push(self.pick(Category::Encouragement));

        let text = segments.join(&self.separator);
        let outcome = self.speaker.speak(&text, true);
        (text, outcome)
    }

    /// One idle-timer decision: maybe speak one of the idle actions.
    pub fn idle_tick(&self) -> Option<(Category, SpeakOutcome)> {
        let action = {
            let mut rng = self.rng();
            if !rng.gen_bool(self.idle_chance) {
                debug!("Idle tick: staying quiet");
                return None;
            }
            IDLE_ACTIONS[rng.gen_range(0..IDLE_ACTIONS.len())]
        };
        let (_, outcome) = self.say(action, false);
        Some((action, outcome))
    }

    pub fn on_task_event(&self, event: &TaskEvent) -> Option<SpeakOutcome> {
        let Some(category) = event.reaction() else {
            debug!("Ignoring task state '{}'", event.new_state);
            return None;
        };
        info!("Task '{}' → {}", event.task, event.new_state);
        Some(self.say(category, false).1)
    }

    pub fn start_idle(self: &Arc<Self>) -> bool {
        let persona = Arc::downgrade(self);
        self.idle.start(move || match persona.upgrade() {
            Some(persona) => {
                persona.idle_tick();
                true
            }
            None => false,
        })
    }

    pub fn stop_idle(&self) -> bool {
        self.idle.stop()
    }

    pub fn idle_running(&self) -> bool {
        self.idle.is_running()
    }

    pub fn has_sink(&self) -> bool {
        self.speaker.has_sink()
    }

    pub fn snapshot(&self) -> Vec<Utterance> {
        self.history.snapshot()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn last_spoken_at(&self) -> Option<DateTime<Utc>> {
        self.speaker.last_speech()
    }
}
