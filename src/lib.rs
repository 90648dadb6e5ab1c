// Copyright 2026 Innsight Contributors
// SPDX-License-Identifier: Apache-2.0

//! Innsight library — resilient hotel data extraction behind a REST API.
//!
//! This library crate exposes the core modules for integration testing.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod mock;
pub mod models;
pub mod renderer;
pub mod rest;
