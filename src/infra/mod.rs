// Adapters implementing the application ports

pub mod enrich_output_adapter;
pub mod http_product_lookup;
pub mod local_catalog_lookup;
pub mod report_output_adapter;
pub mod validation_output_adapter;

pub use enrich_output_adapter::FileEnrichOutputAdapter;
pub use http_product_lookup::HttpProductLookup;
pub use local_catalog_lookup::LocalCatalogLookup;
pub use report_output_adapter::FileReportOutputAdapter;
pub use validation_output_adapter::FileValidationOutputAdapter;
