pub mod use_cases;

pub use use_cases::batch_generator::{AppendFileSink, BatchConfig, BatchGenerationUseCase, BatchSink};
pub use use_cases::rate_limiter::{RateLimiter, TokenBucket, Unthrottled};
pub use use_cases::story_pipeline::{StoryExport, StoryPipelineUseCase};
pub use use_cases::test_case_generator::TestCaseGenerationUseCase;
