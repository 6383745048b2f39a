//! radio_show: core library for the radio show producer.
//!
//! Segment audio comes in as files, a finished show (or, when mixing is not
//! possible, a raw concatenation plus playlist) goes out. Synthesis, assembly,
//! the effect pipeline and the fallback path all live here; the CLI is a thin
//! consumer.

pub mod applause;
pub mod assembler;
pub mod background;
pub mod buffer;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod error;
pub mod fallback;
pub mod jingle;
pub mod library;
pub mod pipeline;
pub mod segment;
pub mod show;
pub mod tone;
