//! Caucus Streamable System
//!
//! Type-tagged serialization for payloads whose concrete type is only known
//! at deserialization time.
//!
//! # Core Concepts
//!
//! - [`Streamable`]: Field-level `stream_out` / `stream_in` contract
//! - [`DynamicStreamable`]: Object-safe streamable that reports its type name
//! - [`StreamableType`]: Concrete, default-constructible streamable with a stable `TYPE_NAME`
//! - [`Envelope`]: `{ "typeName": ..., "data": ... }` wire wrapper
//! - [`TypeRegistry`]: Explicit registry mapping type names to factories
//!
//! # Example
//!
//! ```rust,ignore
//! use caucus_stream::TypeRegistry;
//!
//! let mut registry = TypeRegistry::new();
//! registry.register_unique::<Message>()?;
//!
//! let flat = registry.flatten(&message)?;
//! let back: Message = registry.resurrect_as(&flat)?;
//! assert_eq!(back, message);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod envelope;
mod error;
mod registry;
mod streamable;

pub use envelope::Envelope;
pub use error::{RegistryError, StreamError, StreamResult};
pub use registry::{Factory, RegistryEntry, TypeRegistry};
pub use streamable::{DynamicStreamable, Streamable, StreamableType};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
