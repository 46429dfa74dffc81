//! Attribute write transforms.
//!
//! Every write through [`Record::set_attribute`](crate::model::Record::set_attribute)
//! passes through the entity's [`AttributePipeline`]. The standard pipeline is:
//!
//! 1. [`NullEmptyString`]: empty or blank strings become null
//! 2. [`CleanHtml`]: markup is stripped from strings
//! 3. [`DateAttribute`]: declared date attributes are parsed and reformatted
//! 4. [`NormalizeFloat`]: declared float attributes accept a decimal comma
//!
//! Each transform is scoped by the entity's [`ModelConfig`] and is a no-op for
//! keys and value types outside its scope.

pub mod clean_html;
pub mod config;
pub mod date;
pub mod error;
pub mod float;
pub mod null_empty;
pub mod pipeline;

#[doc(inline)]
pub use clean_html::{strip_tags, CleanHtml};
#[doc(inline)]
pub use self::config::{AttributeFilter, DateFormats, ModelConfig};
#[doc(inline)]
pub use date::{format_date, parse_date, read_date, DateAttribute};
#[doc(inline)]
pub use error::AttributeError;
#[doc(inline)]
pub use float::{normalize_float, NormalizeFloat};
#[doc(inline)]
pub use null_empty::NullEmptyString;
#[doc(inline)]
pub use pipeline::{AttributePipeline, AttributeTransform, TransformContext};
