//! Kinema Style Engine
//!
//! Everything between a tween's loose descriptors and the strings written to
//! a target.
//!
//! # Features
//!
//! - **Value model**: signed numbers (`+=10px`) and unit conversion against
//!   live target measurements
//! - **Unification**: colors, shorthands, shadows, filters and positions
//!   brought to token lists of equal shape
//! - **Transforms**: matrix decomposition and per-channel composition
//! - **Evaluation**: property sets sampled at any progress, fragments
//!   applied to targets

pub mod color;
pub mod frame;
pub mod multi_value;
mod parse;
pub mod property;
pub mod shorthand;
pub mod signed_number;
pub mod target;
pub mod testing;
pub mod token;
pub mod transform;
pub mod unify;
pub mod units;
pub mod value;

pub use frame::{Fragment, FrameValues, PropertySet};
pub use parse::split_top_level;
pub use property::{MultiValueKind, PropertyKind, ShorthandKind};
pub use signed_number::SignedNumber;
pub use target::StyleTarget;
pub use token::Token;
pub use transform::{TransformChannel, TransformKey};
pub use unify::{PropertyTriple, Unifier};
pub use units::{FixedLengths, LengthContext, UnitCategory, UnitConverter};
pub use value::{property_map, PropertyMap, PropertyValue};
