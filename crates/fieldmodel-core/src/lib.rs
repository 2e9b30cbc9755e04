//! Fieldmodel Core - Declarative bidirectional field mapping and coercion
//!
//! This crate maps loosely-shaped raw records (wire or persistence data) into
//! typed logical instances and back, driven by a declarative field table.
//!
//! # Main Components
//!
//! - **Error Handling**: Error types using `thiserror`, diagnostic levels for type checks
//! - **Values**: The dynamic [`Value`] tree, timestamps and the coercion table
//! - **Schemas**: Field normalization, ingestion (`parse`/`update`/`merge`/`attr`),
//!   extraction (`convert`), structural operations and composition
//! - **Extensions**: Enum lookups, field extension factories and YAML/JSON declarations
//!
//! # Example
//!
//! ```
//! use fieldmodel_core::{fields, Field, Model, Primitive, Result, Schema, SchemaOptions};
//! use serde_json::json;
//!
//! fn example() -> Result<()> {
//!     let user = Schema::define(
//!         fields! {
//!             "id" => "user_id",
//!             "name" => Field::keyed("user_name").default_value(""),
//!             "tags" => Field::keyed("user_tags").model(Model::sequence_of(Primitive::Text)),
//!         },
//!         SchemaOptions::new().name("User"),
//!     );
//!
//!     let instance = user.parse(json!({"user_id": 1}))?;
//!     assert_eq!(instance.to_json(), json!({"id": 1, "name": "", "tags": []}));
//!
//!     let raw = user.convert(&instance)?;
//!     assert_eq!(raw.get("user_name"), Some(&json!("")));
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod coerce;
pub mod compose;
pub mod config;
pub mod declaration;
pub mod diagnostics;
pub mod enums;
pub mod error;
pub mod field;
pub mod fields;
pub mod instance;
pub mod normalize;
pub mod options;
pub mod schema;
pub mod value;

// Re-export main types for convenience
pub use error::{Diagnostics, Error, Result};
pub use value::{RawRecord, Record, Timestamp, Value};

pub use coerce::{coerce, Primitive};
pub use compose::Composition;
pub use config::EngineConfig;
pub use declaration::{DeclarationDocument, SchemaRegistry};
pub use diagnostics::TypeCheckPolicy;
pub use enums::{EnumEntry, EnumFactory, EnumLookup, EnumSpec, LabelEnum, LabelEnumFactory};
pub use field::{ConvertContext, Element, Field, FieldContext, Model};
pub use instance::{Instance, InstanceId};
pub use normalize::{normalize, FieldDecl, FieldTable};
pub use options::{HandleOptions, Handler, SchemaOptions};
pub use schema::{Schema, SchemaId, SchemaRef, SchemaSlot, WeakSchema, MAX_NESTING_DEPTH};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
