pub mod config;
pub mod constants;
pub mod particles;

pub use config::{DEFAULT_CONFIG_FILE, RunConfig, TpcGeometry, validate_nside};
pub use particles::{ParticleSpec, default_particle_catalog, find_particle, select_particles};
