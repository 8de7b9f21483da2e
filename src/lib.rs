//! # Expanse
//!
//! Outpainting preparation for photos. Expanse puts a photo on a larger
//! canvas of a chosen resolution, fills the empty border with a blurred and
//! darkened copy of the same photo, and hands that composite to a generative
//! image model that replaces the border with realistic surroundings.
//!
//! # Architecture: One Composite, One Round Trip
//!
//! ```text
//! upload bytes ──decode──► SourceImage
//!                              │  fit_contain / cover_rect
//!                              ▼
//!                 composite (background → blurred cover → sharp contain)
//!                              │
//!                              ▼
//!                 CompositeSurface ──encode──► PNG payload ──► ImageGenerator
//!                                                                  │
//!                                   GeneratedResult ◄──────────────┘
//! ```
//!
//! The surface is created, painted, encoded and dropped inside a single
//! request. Nothing is cached between requests.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Fit/cover geometry, the three-layer compositor, PNG export, the backend trait |
//! | [`generation`] | The generative model seam and its Gemini REST implementation |
//! | [`prompt`] | The fixed outpainting instruction template |
//! | [`session`] | Upload → generate → result state machine with error banner |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`types`] | `Resolution` presets, generation settings, results |
//! | [`naming`] | `WIDTHxHEIGHT` parsing and download filenames |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## The Sharp Layer Is Sacred
//!
//! The contain-fitted copy of the photo is painted last and never filtered,
//! so the model receives the user's pixels untouched in the middle of the
//! canvas. The blurred layer only provides low-frequency context (color,
//! lighting) and carries no edges the model could mistake for content.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resampling, blurring and PNG encoding all go through the
//! [`image`](https://docs.rs/image) crate. No system libraries are needed.
//!
//! ## Blocking HTTP
//!
//! The single network call uses `reqwest`'s blocking client. There is exactly
//! one outstanding request at a time, so an async runtime would add weight
//! without adding concurrency.

pub mod config;
pub mod generation;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod prompt;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
