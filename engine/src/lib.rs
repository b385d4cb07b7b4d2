//! Taskflow Engine Library
//!
//! This library provides the core functionality of the Taskflow engine.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Command execution security module
pub mod command_executor;

/// Text generation abstraction layer
pub mod llm;

/// Conductor orchestration module
pub mod conductor;

/// Built-in native tools
pub mod tools;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
