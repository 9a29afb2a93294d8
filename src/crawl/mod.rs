// src/crawl/mod.rs
// =============================================================================
// This module discovers every file in the remote repository.
//
// Submodules:
// - normalize: URL -> dedup key
// - classify: page -> file links and folder links
// - path: folder URL -> path relative to the repository root
// - traverse: the depth-first walk that ties them together
// =============================================================================

mod classify;
mod normalize;
mod path;
mod traverse;

pub use traverse::{DiscoveredFile, Failure, TraversalReport, Traverser};
