//! Token approximation for generated content.
//!
//! Providers report usage differently (or not at all), so the reported
//! figure is the whitespace-delimited word count of the generated text.

pub struct TokenCounter;

impl TokenCounter {
    /// Number of whitespace-delimited words in `text`.
    pub fn estimate_tokens(text: &str) -> usize {
        text.split_whitespace().count()
    }

    /// Word count summed over several outputs, e.g. all batches of a run.
    pub fn estimate_total<'a>(texts: impl IntoIterator<Item = &'a str>) -> usize {
        texts.into_iter().map(Self::estimate_tokens).sum()
    }
}
