// Domain layer: route/prediction models and the ports the core depends on.

pub mod model;
pub mod ports;
