//! Fill-in-the-blank quiz generation from plain document text, plus the
//! per-user session that walks through the generated questions.

pub mod quiz;
