//! Article document tree
//!
//! [`DocTree`] is the arena every rewrite pass operates on; [`kind`] holds the
//! closed vocabulary and its kind sets.

pub mod doc;
pub mod import;
pub mod kind;
pub mod node;
pub mod shape;

pub use doc::DocTree;
pub use import::{ImportedArticle, import_article};
pub use kind::{Kind, KindSet};
pub use node::{Attrs, DocNode, Element, Label};
pub use shape::Shape;
