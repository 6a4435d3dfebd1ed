// Observability: metric recording through the `metrics` facade

pub mod metrics;
