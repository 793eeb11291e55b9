//! Common types and utilities shared across Trawl crates.
//!
//! This crate defines the record types passed between the feed reader, the
//! structured-data extractor, and the page store, together with the scalar
//! normalization helpers and the observability initializer. It is
//! intentionally lightweight and dependency-minimal so that all crates can
//! depend on it without introducing heavy transitive costs.
//!
//! # Overview
//!
//! - [`FeedDescriptor`]: one named RSS/Atom source
//! - [`CandidatePage`]: a page harvested from a feed entry, pre-fetch
//! - [`ArticleMetadata`]: fields extracted from structured-data markup
//! - [`PageRecord`]: the persisted HTML + metadata unit
//! - [`normalize`]: text repair and datetime parsing
//! - [`observability`]: centralised tracing/logging initialisation

pub mod normalize;
pub mod observability;
mod records;

pub use records::{ArticleMetadata, CandidatePage, FeedDescriptor, PageRecord};
