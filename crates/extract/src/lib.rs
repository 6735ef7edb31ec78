//! PDF form-field extraction -- loads a document with `lopdf`, walks the
//! AcroForm field tree, and produces a FormFlow [`Template`].
//!
//! Encrypted documents are tolerated as long as the object structure
//! parses; corrupt streams are not.

mod acroform;
mod error;

pub use acroform::extract_template;
pub use error::ExtractError;
