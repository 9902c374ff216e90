// Domain layer: core models and ports (interfaces) to the record store,
// the generation services and the revision surface.

pub mod model;
pub mod ports;
