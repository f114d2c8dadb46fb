use super::index::ScoredChunk;

/// Separator between passages in the assembled context block.
pub const CHUNK_SEPARATOR: &str = "\n\n---\n\n";

/// Concatenate retrieved chunks into one context block of at most `budget`
/// characters.
///
/// Chunks are taken in result order (already similarity-descending) and
/// included whole or not at all — a chunk that would push the total past
/// the budget ends the assembly, preserving coherent passages. The one
/// exception: if the single best chunk alone exceeds the budget, it is
/// truncated to fit rather than returning empty context, since some context
/// beats none.
pub fn assemble(results: &[ScoredChunk], budget: usize) -> String {
    let separator_chars = CHUNK_SEPARATOR.chars().count();
    let mut context = String::new();
    let mut used = 0usize;

    for (i, result) in results.iter().enumerate() {
        let text = &result.chunk.text;
        let text_chars = text.chars().count();
        let needed = if i == 0 { text_chars } else { text_chars + separator_chars };

        if used + needed > budget {
            if i == 0 {
                // Last resort: truncate the best chunk to the budget.
                return text.chars().take(budget).collect();
            }
            break;
        }

        if i > 0 {
            context.push_str(CHUNK_SEPARATOR);
        }
        context.push_str(text);
        used += needed;
    }

    context
}
