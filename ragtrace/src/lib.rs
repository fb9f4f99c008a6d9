//! Trace recorder and asynchronous groundedness scorer for
//! retrieval-augmented generation pipelines.

pub mod api;
pub mod blob;
pub mod classifier;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod models;
pub mod scoring;
pub mod services;
