//! Byte-level BPE encoding (GPT-2 style).
//!
//! A word is converted to UTF-8 bytes, each byte is mapped to a character
//! through the GPT-2 byte-to-unicode table, and merge rules are applied to
//! the resulting symbols in rank order until none applies.

use crate::core::{MergeRules, Vocabulary};
use crate::{Result, TokenizerError};
use ahash::AHashMap;
use dary_heap::OctonaryHeap;
use std::cmp::Ordering;
use std::sync::Arc;

/// Byte-level BPE over a shared vocabulary and merge table.
#[derive(Debug, Clone)]
pub struct ByteLevelBpe {
    /// Vocabulary for token lookups
    vocab: Arc<Vocabulary>,
    /// Merge rules: pair -> (rank, new_token_id)
    merges: Arc<MergeRules>,
    /// Byte to unicode mapping
    byte_encoder: [char; 256],
    /// Unicode to byte mapping for decoding
    byte_decoder: AHashMap<char, u8>,
}

/// A pending merge of the symbol at `pos` with its right neighbour.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MergeOp {
    rank: u32,
    pos: usize,
    pair: (u32, u32),
    new_id: u32,
}

// Max-heap: lower rank first, then leftmost position.
impl Ord for MergeOp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank
            .cmp(&other.rank)
            .then_with(|| self.pos.cmp(&other.pos))
            .reverse()
    }
}

impl PartialOrd for MergeOp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A symbol in the doubly linked list of a word being merged.
#[derive(Debug, Clone, Copy)]
struct Symbol {
    id: u32,
    prev: Option<usize>,
    next: Option<usize>,
    alive: bool,
}

impl ByteLevelBpe {
    /// Create a new byte-level BPE over shared vocabulary and merges.
    pub fn new(vocab: Arc<Vocabulary>, merges: Arc<MergeRules>) -> Self {
        let byte_encoder = bytes_to_unicode();
        let byte_decoder = byte_encoder
            .iter()
            .enumerate()
            .map(|(byte, &ch)| (ch, byte as u8))
            .collect();

        Self {
            vocab,
            merges,
            byte_encoder,
            byte_decoder,
        }
    }

    /// The shared vocabulary.
    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// The shared merge rules.
    pub fn merges(&self) -> &MergeRules {
        &self.merges
    }

    /// Map a byte to its unicode stand-in.
    #[inline]
    pub fn byte_char(&self, byte: u8) -> char {
        self.byte_encoder[byte as usize]
    }

    /// Encode a single pre-tokenized word.
    ///
    /// Every byte of the word must have its stand-in character in the
    /// vocabulary.
    pub fn encode_word(&self, word: &str) -> Result<Vec<u32>> {
        let mut buf = [0u8; 4];
        let ids = word
            .bytes()
            .map(|b| {
                let symbol = self.byte_char(b).encode_utf8(&mut buf);
                self.vocab
                    .get_id(symbol)
                    .ok_or_else(|| TokenizerError::UnknownToken(symbol.to_string()))
            })
            .collect::<Result<Vec<u32>>>()?;

        Ok(self.apply_merges(ids))
    }

    /// Apply merge rules to a sequence of symbol ids.
    fn apply_merges(&self, ids: Vec<u32>) -> Vec<u32> {
        if ids.len() < 2 || self.merges.is_empty() {
            return ids;
        }

        let len = ids.len();
        let mut symbols: Vec<Symbol> = ids
            .iter()
            .enumerate()
            .map(|(i, &id)| Symbol {
                id,
                prev: i.checked_sub(1),
                next: (i + 1 < len).then_some(i + 1),
                alive: true,
            })
            .collect();

        let mut heap = OctonaryHeap::with_capacity(len);
        for pos in 0..len - 1 {
            self.push_candidate(&mut heap, &symbols, pos, pos + 1);
        }

        while let Some(op) = heap.pop() {
            let left = op.pos;
            if !symbols[left].alive {
                continue;
            }
            let Some(right) = symbols[left].next else {
                continue;
            };

            // Stale entry: one side has been merged since it was queued
            if (symbols[left].id, symbols[right].id) != op.pair {
                continue;
            }

            let after = symbols[right].next;
            symbols[left].id = op.new_id;
            symbols[left].next = after;
            symbols[right].alive = false;
            if let Some(after) = after {
                symbols[after].prev = Some(left);
                self.push_candidate(&mut heap, &symbols, left, after);
            }
            if let Some(before) = symbols[left].prev {
                self.push_candidate(&mut heap, &symbols, before, left);
            }
        }

        symbols
            .into_iter()
            .filter(|s| s.alive)
            .map(|s| s.id)
            .collect()
    }

    fn push_candidate(
        &self,
        heap: &mut OctonaryHeap<MergeOp>,
        symbols: &[Symbol],
        left: usize,
        right: usize,
    ) {
        let pair = (symbols[left].id, symbols[right].id);
        if let Some((rank, new_id)) = self.merges.get(pair) {
            heap.push(MergeOp {
                rank,
                pos: left,
                pair,
                new_id,
            });
        }
    }

    /// Decode token ids to raw bytes.
    ///
    /// Characters outside the byte table are emitted as their own UTF-8
    /// encoding. Callers that want text only filter control ids first.
    pub fn decode_bytes(&self, ids: &[u32], out: &mut Vec<u8>) -> Result<()> {
        let mut buf = [0u8; 4];
        for &id in ids {
            let token = self
                .vocab
                .get_token(id)
                .ok_or(TokenizerError::UnknownTokenId(id))?;

            for ch in token.chars() {
                match self.byte_decoder.get(&ch) {
                    Some(&byte) => out.push(byte),
                    None => out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes()),
                }
            }
        }
        Ok(())
    }

    /// Decode token ids back to text, replacing invalid UTF-8.
    pub fn decode(&self, ids: &[u32]) -> Result<String> {
        let mut bytes = Vec::with_capacity(ids.len() * 4);
        self.decode_bytes(ids, &mut bytes)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// The GPT-2 byte-to-unicode table.
///
/// Printable Latin-1 bytes map to themselves; the remaining bytes map, in
/// ascending order, to code points starting at 256 (space becomes `Ġ`).
pub fn bytes_to_unicode() -> [char; 256] {
    let mut table = ['\0'; 256];
    let mut shifted = 0u32;

    for byte in 0u32..256 {
        let printable = (0x21..=0x7E).contains(&byte)
            || (0xA1..=0xAC).contains(&byte)
            || (0xAE..=0xFF).contains(&byte);
        let codepoint = if printable {
            byte
        } else {
            shifted += 1;
            255 + shifted
        };
        // Code points below 512 are never surrogates
        table[byte as usize] = char::from_u32(codepoint).unwrap_or(char::REPLACEMENT_CHARACTER);
    }

    table
}
