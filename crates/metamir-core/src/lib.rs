//! Metamir Core - Domain logic and port definitions
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `RemoteItem`, `ItemKind`, identifier newtypes, the
//!   identity mapper and its kind table
//! - **Port definitions** - Traits for adapters: `IRemoteSource`, `IMetadataStore`
//! - **Configuration** - YAML-backed settings for passes and the local store
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure logic with no I/O. Ports define trait
//! interfaces that adapter crates implement; the reconciliation engine in
//! `metamir-engine` orchestrates domain types through the ports.

pub mod config;
pub mod domain;
pub mod ports;
