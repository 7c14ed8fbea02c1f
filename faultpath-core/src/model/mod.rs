//! Rupture graph model: sections, clusters, jumps, ruptures and the tree
//! navigator that answers predecessor/descendant queries over them.

mod cluster;
mod jump;
mod rupture;
mod section;
mod tree;

pub use cluster::Cluster;
pub use jump::Jump;
pub use rupture::{Rupture, RuptureKey};
pub use section::{ParentId, Section, SectionId};
pub use tree::TreeNavigator;
