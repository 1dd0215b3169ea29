// src/lib.rs

pub mod analyzer;
pub mod api;
pub mod assistant;
pub mod config;
pub mod llm;
pub mod state;
pub mod storage;
pub mod tasks;
