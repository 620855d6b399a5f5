pub mod agent;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod error;
pub mod llm;
pub mod notify;
pub mod provider;
pub mod strategy;
