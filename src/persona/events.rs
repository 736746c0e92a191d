//! Task lifecycle feed and the bridge that turns transitions into speech.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::context::Persona;
use super::phrases::Category;

pub const PROCESSING_STARTED: &str = "processing-started";
pub const COMPLETE: &str = "complete";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEvent {
    pub task: String,
    #[serde(rename = "newState")]
    pub new_state: String,
}

impl TaskEvent {
    pub fn new(task: impl Into<String>, new_state: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            new_state: new_state.into(),
        }
    }

    /// The speech category this transition triggers, if any.
    pub fn reaction(&self) -> Option<Category> {
        match self.new_state.as_str() {
            PROCESSING_STARTED => Some(Category::TaskStart),
            COMPLETE => Some(Category::TaskComplete),
            _ => None,
        }
    }
}

pub type TaskEventHandler = Box<dyn Fn(&TaskEvent) + Send + Sync>;

pub trait TaskEventFeed: Send + Sync {
    fn subscribe(&self, handler: TaskEventHandler);
}

/// In-process feed. Handlers run synchronously on `publish`.
#[derive(Default)]
pub struct TaskEventBus {
    handlers: Mutex<Vec<Arc<dyn Fn(&TaskEvent) + Send + Sync>>>,
}

impl TaskEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver to every subscriber. Returns how many were notified.
    pub fn publish(&self, event: &TaskEvent) -> usize {
        // Snapshot so handlers may publish or subscribe without deadlocking
        let handlers = self
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        debug!("Task event: {} → {}", event.task, event.new_state);
        for handler in handlers.iter() {
            handler(event);
        }
        handlers.len()
    }
}

impl TaskEventFeed for TaskEventBus {
    fn subscribe(&self, handler: TaskEventHandler) {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::from(handler));
    }
}

pub struct EventBridge;

impl EventBridge {
    /// Subscribe `persona` to `feed`. Without a feed the bridge stays inert.
    pub fn attach(persona: &Arc<Persona>, feed: Option<&dyn TaskEventFeed>) -> bool {
        let Some(feed) = feed else {
            debug!("No task event feed, event bridge inactive");
            return false;
        };

        let persona = Arc::downgrade(persona);
        feed.subscribe(Box::new(move |event| {
            if let Some(persona) = persona.upgrade() {
                persona.on_task_event(event);
            }
        }));
        info!("Subscribed to task events");
        true
    }
}
