//! In-memory task dashboard: a typed task store, a create/edit form session,
//! and a terminal board that drives both.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod task;
pub mod task_form;
pub mod task_store;
pub mod ui;
