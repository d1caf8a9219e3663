// Domain layer: models and ports. Platform specifics live in `adapters`.

pub mod model;
pub mod ports;
