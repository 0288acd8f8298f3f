//! # Missive Engine
//!
//! Turns a [`ContractDescriptor`](missive_core::ContractDescriptor) and a set of
//! collaborators into a callable [`Missive`] handle.
//!
//! ```text
//! invoke(method, args)
//!   │
//!   ├─ returns configuration ─▶ Reply::Configuration
//!   ├─ default body ──────────▶ body(&missive, &args)
//!   └─ templated:
//!        viewer locator ─▶ template source ─▶ variable resolution ─▶ composer
//!                                                                      │
//!                                          Returns::Unit ─▶ sender ◀───┤
//!                                          Returns::Message ─▶ Reply::Message
//! ```
//!
//! Variable resolution is a worklist over a per-type, priority-ordered
//! resolver registry; see [`resolution`].

pub mod builder;
pub mod configuration;
pub mod hierarchy;
pub mod missive;
pub mod resolution;
pub mod scanner;

pub use builder::Builder;
pub use configuration::{Configuration, DefaultBody};
pub use hierarchy::{InterfacesFirst, SuperclassFirst};
pub use missive::{Missive, Prepared, Reply};
pub use resolution::StandardResolution;
pub use scanner::{BoundMethods, bind_method, scan_contract};
