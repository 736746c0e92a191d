//! Persona: a scripted voice companion.
//!
//! Components:
//! - `phrases`: static phrase pools per speech category
//! - `history`: bounded utterance history mirrored to the remote log
//! - `remote`: HTTP client for the remote conversation log
//! - `selector`: phrase picking with repetition avoidance
//! - `speaker`: cooldown throttle and speech choke point
//! - `sink`: voice outputs (TTS API, desktop notification)
//! - `scheduler`: recurring idle-chat timer
//! - `events`: task lifecycle feed and bridge
//! - `context`: the persona itself, wiring everything together
//! - `api`: Axum control server

pub mod api;
pub mod context;
pub mod events;
pub mod history;
pub mod phrases;
pub mod remote;
pub mod scheduler;
pub mod selector;
pub mod sink;
pub mod speaker;

#[cfg(test)]
mod test_support;
