//! Build orchestration for sitebuild.
//!
//! This crate ties the task crates (styles, scripts, assets) into the
//! end-to-end workflows: `run_build` (clean → vendor → parallel tasks) and
//! `run_watch` (build, then preview server + filesystem watch loop).

pub mod pipeline;
pub mod watch;
