// src/agentcrew/mod.rs

pub mod agent;
pub mod attachment;
pub mod client_wrapper;
pub mod clients;
pub mod config;
pub mod conversation;
pub mod error;
pub mod event;
pub mod input_source;
pub mod orchestration;
pub mod prompt;
pub mod termination;
pub mod tools;
