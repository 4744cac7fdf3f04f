mod apply;
mod field;
mod flood;
mod parallel;
mod smooth;
mod topology;

pub use apply::{apply_mask, apply_regions, ApplySettings};
pub use field::{InfluenceField, ITERATION_UNSET};
pub use flood::{build_influence, FloodSettings};
pub use smooth::smooth_mask;
pub use topology::{MeshTopology, Neighbor, Topology};
