//! Layered configuration for semantic manifest entities.
//!
//! Configuration for an entity can come from several places: the project
//! file (globally or scoped to a package/path), the declaring document, and
//! for sub-components their own `config:` block. Each place contributes a
//! [`ConfigFragment`]; fragments are merged in order (least specific first)
//! and resolved into a [`Config`].
//!
//! Merge semantics:
//! - Scalars (`enabled`, `group`): last present value wins
//! - `meta`: per-key union, the more specific layer wins on collisions
//! - Extra keys: dict values merge per key, scalar values override,
//!   dict vs scalar is an error

mod error;
mod fragment;
mod merge;
mod resolved;

pub use error::ConfigError;
pub use fragment::{ConfigFragment, ConfigOrigin, CONFIG_KEYS};
pub use merge::{merge_layers, resolve_layers};
pub use resolved::Config;

/// Metadata mapping carried by every config.
pub type Meta = std::collections::BTreeMap<String, serde_json::Value>;
