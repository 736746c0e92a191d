//! Static phrase bank, one pool per speech category.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Greeting,
    Status,
    Encouragement,
    WorkUpdate,
    IdleChatter,
    Farewell,
    TaskStart,
    TaskComplete,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Greeting,
        Category::Status,
        Category::Encouragement,
        Category::WorkUpdate,
        Category::IdleChatter,
        Category::Farewell,
        Category::TaskStart,
        Category::TaskComplete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Status => "status",
            Self::Encouragement => "encouragement",
            Self::WorkUpdate => "work-update",
            Self::IdleChatter => "idle-chatter",
            Self::Farewell => "farewell",
            Self::TaskStart => "task-start",
            Self::TaskComplete => "task-complete",
        }
    }

    /// Candidate utterances for this category. Never empty.
    pub fn pool(self) -> &'static [&'static str] {
        match self {
            Self::Greeting => GREETINGS,
            Self::Status => STATUS,
            Self::Encouragement => ENCOURAGEMENT,
            Self::WorkUpdate => WORK_UPDATES,
            Self::IdleChatter => IDLE_CHATTER,
            Self::Farewell => FAREWELLS,
            Self::TaskStart => TASK_START,
            Self::TaskComplete => TASK_COMPLETE,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

const GREETINGS: &[&str] = &[
    "Hey there! Good to see you.",
    "Hello again. Ready when you are.",
    "Morning, or whatever time it is for you. Let's get going.",
    "Welcome back. The workspace is warmed up.",
    "Hi! I've been keeping an eye on things.",
];

const STATUS: &[&str] = &[
    "All systems look nominal.",
    "Everything is running smoothly on my end.",
    "Queues are quiet. Nothing needs your attention right now.",
    "Services are healthy and responding.",
    "No errors in the last few minutes. Nice and calm.",
];

const ENCOURAGEMENT: &[&str] = &[
    "You're making good progress.",
    "Keep going, this is coming together nicely.",
    "Nice work so far.",
    "One step at a time. You've got this.",
    "That last change looked solid.",
];

const WORK_UPDATES: &[&str] = &[
    "I'm watching the task board for anything new.",
    "Background jobs are ticking along.",
    "I tidied up a few logs while you were busy.",
    "Monitoring the build pipeline.",
    "Keeping track of what's in progress.",
];

const IDLE_CHATTER: &[&str] = &[
    "It's quiet. Maybe a good moment for a stretch?",
    "Don't forget to drink some water.",
    "Fun fact: the first computer bug was an actual moth.",
    "I wonder what we'll build next.",
    "Still here if you need anything.",
    "Just humming along in the background.",
];

const FAREWELLS: &[&str] = &[
    "Signing off. See you soon.",
    "Goodbye for now.",
    "Shutting down. Great session.",
    "Take care. I'll be here next time.",
];

const TASK_START: &[&str] = &[
    "Starting on that now.",
    "Got it, working on it.",
    "On it.",
    "Task received. Processing.",
];

const TASK_COMPLETE: &[&str] = &[
    "Done! That task is complete.",
    "All finished.",
    "Task complete. Take a look when you're ready.",
    "Wrapped that one up.",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_pool_is_non_empty() {
        for category in Category::ALL {
            assert!(!category.pool().is_empty(), "{category} pool is empty");
        }
    }

    #[test]
    fn test_category_name_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        assert!("weather".parse::<Category>().is_err());
    }
}
