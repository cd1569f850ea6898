//! Agent framework: YAML-configured agents and tasks, run as a sequential crew.
//! Stage outputs travel as prose in an explicit `Context`; nothing is parsed between stages.

pub mod agent;
pub mod config;
pub mod context;
pub mod runner;
pub mod task;

pub use agent::{AgentOptions, AgentsFactory};
pub use runner::{Crew, Process};
pub use task::TasksFactory;
