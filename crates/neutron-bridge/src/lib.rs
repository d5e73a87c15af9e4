//! Neutron Bridge
//!
//! This crate is the boundary the presentation layer talks to. It exposes
//! two operations, saving a parameter record and running the simulation, and
//! keeps them ordered with respect to each other.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Bridge                             │
//! │  - save_config(record)   → artifact replaced                │
//! │  - run_simulation(cancel) → stdout | diagnostic             │
//! │  - artifact guard: saves exclusive, runs shared             │
//! └─────────────────────────────────────────────────────────────┘
//!                 │                               │
//!                 ▼                               ▼
//! ┌───────────────────────────┐   ┌─────────────────────────────┐
//! │   ConfigStore (trait)     │   │       ProcessRunner         │
//! │  - FsConfigStore          │   │  - locate, prepare, spawn   │
//! │  - atomic replace         │   │  - bounded capture          │
//! └───────────────────────────┘   └─────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use neutron_bridge::{Bridge, BridgeConfig};
//! use neutron_config::InstallRoot;
//! use tokio_util::sync::CancellationToken;
//!
//! let root = InstallRoot::from_current_exe()?;
//! let bridge = Bridge::new(BridgeConfig::new(root))?;
//!
//! bridge.save_config(record).await?;
//! let stdout = bridge.run_simulation(CancellationToken::new()).await?;
//! ```

mod bridge;
mod error;
mod response;

pub use bridge::{Bridge, BridgeConfig};
pub use error::{BridgeError, ErrorKind};
pub use response::BridgeResponse;

pub use neutron_config::{InstallRoot, ParameterRecord};
pub use neutron_runner::{ExecutionOutput, RunState};
pub use neutron_store::ConfigStore;
