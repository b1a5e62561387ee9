//! Entity model for the tower-defense simulation.
//!
//! Provides the [`Entity`] trait, opaque [`EntityId`] handles, per-entity
//! [`ListenerRegistry`] lists and the [`World`] store that drives the
//! `init` / `tick` / `clean` lifecycle.

pub mod context;
pub mod entity;
pub mod error;
pub mod factory;
pub mod id;
pub mod listener;
pub mod observer;
pub mod world;

pub use context::EntityContext;
pub use entity::{Entity, EntityCategory, TARGET_FRAME_RATE};
pub use error::{EntityError, TickError};
pub use factory::{EntityConstructor, EntityRegistry};
pub use id::{EntityAllocator, EntityId};
pub use listener::ListenerRegistry;
pub use observer::EntityObserver;
pub use world::World;
