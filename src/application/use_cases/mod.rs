pub mod batch_generator;
pub mod exporter;
pub mod gherkin_parser;
pub mod prompt_builder;
pub mod rate_limiter;
pub mod story_pipeline;
pub mod table_export;
pub mod test_case_generator;
