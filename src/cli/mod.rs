//! CLI infrastructure for the qnav controller
//!
//! This module provides the command-line interface for training the
//! controller headless and inspecting its configuration.

pub mod commands;
pub mod output;
