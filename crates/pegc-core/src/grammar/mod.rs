//! The grammar-description-language meta-parser: one module per production,
//! hand-written against the [`crate::parser::Parser`] primitives the same
//! way a generated parser would be.
//!
//! Grounded on `original_source/grako/bootstrap.py`, the self-hosted
//! generated parser for this exact language (`@graken()`-decorated methods
//! calling `self._token`/`self._cut`/`self._choice`/`self._option`); module
//! layout mirrors a flat one-file-per-production convention.

pub(crate) mod atom;
pub(crate) mod element;
pub(crate) mod expression;
pub(crate) mod literal;
pub(crate) mod rule;
pub(crate) mod term;

pub use rule::grammar;
