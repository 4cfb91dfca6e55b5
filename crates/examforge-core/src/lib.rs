//! examforge-core: question generation, selection, scoring and weakness
//! profiling for payroll exam practice.
//!
//! Content packs mix static questions with parameterized templates. A seeded
//! RNG drives template hydration and blueprint-weighted selection so that an
//! attempt is fully reproducible from its seed. Scored attempts feed a short
//! history from which a weakness profile is derived.

pub mod allocator;
pub mod attempt;
pub mod config;
pub mod engine;
pub mod error;
pub mod generators;
pub mod hydrate;
pub mod model;
pub mod parser;
pub mod profiler;
pub mod report;
pub mod rng;
pub mod scoring;
pub mod selection;
pub mod settings;
pub mod statistics;
pub mod store;
