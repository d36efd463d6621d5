//! A multi-dimensional packet classifier built on a FIS-tree (Fat Inverted
//! Segment tree): one layer of per-dimension range-location trees per
//! classification dimension, each cell annotated with the lowest-cost rule
//! that covers it.
//!
//! Typical use:
//!
//! ```
//! use fis_classify::{build, Interval, Rule};
//!
//! let rules = vec![
//!     Rule::new("default-deny", [Interval::make_anytoany()], 100, false),
//!     Rule::new("allow-web", [Interval::make_range(80, 81)], 10, true),
//! ];
//! let classifier = build(rules, 0).unwrap().unwrap();
//! assert_eq!(classifier.query([80]).unwrap().action, true);
//! assert_eq!(classifier.query([22]).unwrap().action, false);
//! ```
//!
//! A classifier is built once from a rule set and queried many times; it
//! does not support in-place mutation. Callers who need to update a live
//! rule set build a new classifier and swap it in (an `ArcSwap` or
//! equivalent), which is why [`Classifier`] is `Send + Sync` but not
//! `Clone`-on-write.

pub mod dim;
pub mod error;
pub mod interval;
pub mod logging;
mod rl_tree;
pub mod rule;

mod fis_tree;

pub use error::BuildError;
pub use fis_tree::{build, destroy, Classifier};
pub use interval::{Interval, Range};
pub use rule::Rule;
