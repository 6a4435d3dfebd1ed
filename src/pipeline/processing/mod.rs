// Pipeline processing: parsing, cleaning, enrichment, and reporting

pub mod parser;
pub mod normalize;
pub mod quality_gate;
pub mod filter;
pub mod enrich;
pub mod aggregate;
pub mod report;
