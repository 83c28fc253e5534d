//! Columnar runtime for the plyexec query engine.
//!
//! Provides the block/tuple vector storage, the shape algebra describing
//! vector contents, and the signature-annotated pipeline primitives that
//! execute over that storage. The query assembler in `plyexec_execution`
//! compiles combinator expressions into chains of these primitives.

pub mod bitmap;
pub mod cardinality;
pub mod datatype;
pub mod functions;
pub mod label;
pub mod pipeline;
pub mod scalar;
pub mod shape;
pub mod signature;
pub mod vector;

pub use cardinality::Cardinality;
pub use datatype::ValueType;
pub use label::Label;
pub use scalar::ScalarValue;
pub use shape::Shape;
pub use signature::Signature;
pub use vector::{BlockVector, Offsets, TupleVector, Vector};
