pub mod flux_map;
pub mod pipeline;
pub mod serialization;
pub mod weights;

mod traits;

pub use traits::{ArtifactLocator, StageLauncher};
