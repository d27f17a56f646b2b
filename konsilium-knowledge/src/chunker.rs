use sha2::{Digest, Sha256};

use crate::errors::{KnowledgeError, KnowledgeResult};

/// A segment cut from a document, before it gets an id and a domain.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentDraft {
    pub text: String,
    /// 0-based position in the cut sequence.
    pub ordinal: usize,
    /// 1-based page the segment starts on.
    pub page: usize,
}

/// Break candidates from coarse to fine: paragraph, line, sentence, word.
/// A hard character cut is the last resort.
const BREAKS: [&str; 4] = ["\n\n", "\n", ".", " "];

/// Split a paginated document into overlapping segments.
///
/// Pages are concatenated verbatim; page boundaries are kept only to stamp
/// each segment with the page its first character falls on. Offsets are in
/// characters, not bytes.
///
/// Each window holds up to `chunk_size` characters and is cut at the
/// coarsest break found strictly after `start + chunk_overlap` (so every cut
/// makes progress). The next segment starts `chunk_overlap` characters
/// before the cut, which makes consecutive segments share exactly
/// `chunk_overlap` characters.
pub fn chunk_pages(
    pages: &[String],
    chunk_size: usize,
    chunk_overlap: usize,
) -> KnowledgeResult<Vec<SegmentDraft>> {
    if chunk_size == 0 || chunk_overlap >= chunk_size {
        return Err(KnowledgeError::InvalidChunking {
            chunk_size,
            chunk_overlap,
        });
    }

    let text: Vec<char> = pages.iter().flat_map(|page| page.chars()).collect();
    let mut page_starts = Vec::with_capacity(pages.len());
    let mut offset = 0;
    for page in pages {
        page_starts.push(offset);
        offset += page.chars().count();
    }

    let len = text.len();
    let mut drafts = Vec::new();
    let mut pos = 0;
    while pos < len {
        let window_end = (pos + chunk_size).min(len);
        let cut = if window_end < len {
            best_break(&text, pos, window_end, chunk_overlap)
        } else {
            window_end
        };

        drafts.push(SegmentDraft {
            text: text[pos..cut].iter().collect(),
            ordinal: drafts.len(),
            page: page_of(&page_starts, pos),
        });

        // A final window shorter than chunk_size consumed the tail. A full
        // window ending exactly at the end still leaves its overlap span,
        // which becomes the last segment on the next pass.
        if cut == len && cut - pos < chunk_size {
            break;
        }
        pos = cut - chunk_overlap;
    }

    Ok(drafts)
}

/// Coarsest acceptable cut inside `[start, window_end)`. A cut is the end of
/// a break occurrence and must lie strictly after `start + overlap`.
fn best_break(text: &[char], start: usize, window_end: usize, overlap: usize) -> usize {
    let min_cut = start + overlap;
    for brk in BREAKS {
        let pat: Vec<char> = brk.chars().collect();
        if let Some(cut) = last_break_end(text, start, window_end, &pat)
            && cut > min_cut
        {
            return cut;
        }
    }
    window_end
}

/// End offset (exclusive) of the last occurrence of `pat` fully inside
/// `[start, window_end)`.
fn last_break_end(text: &[char], start: usize, window_end: usize, pat: &[char]) -> Option<usize> {
    let window = &text[start..window_end];
    if window.len() < pat.len() {
        return None;
    }
    (0..=window.len() - pat.len())
        .rev()
        .find(|&i| window[i..i + pat.len()] == *pat)
        .map(|i| start + i + pat.len())
}

fn page_of(page_starts: &[usize], pos: usize) -> usize {
    match page_starts.binary_search(&pos) {
        Ok(i) => i + 1,
        Err(i) => i.max(1),
    }
}

/// Deterministic segment id: re-ingesting identical content reproduces the
/// same id, while content drift changes the hash suffix.
pub fn segment_id(domain: &str, ordinal: usize, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{domain}_{ordinal}_{}", &digest[..8])
}
