//! The encoder: payload bytes in, finished [`Symbol`] out.
//!
//! The pipeline is version selection, bit construction, Reed-Solomon
//! blocks with interleaving, module placement, and mask selection by
//! penalty score.

use log::{debug, trace};

use crate::bits::BitWriter;
use crate::ec_level::EcLevel;
use crate::error::QrError;
use crate::mask::Mask;
use crate::matrix::{Symbol, SymbolGrid};
use crate::reed_solomon;
use crate::segment::Segment;
use crate::tables::{block_layout, data_capacity_bits};
use crate::version::Version;

// Terminator: up to four zero bits, truncated at capacity.
const TERMINATOR_BITS: usize = 4;

/// Encodes binary data at the given error correction level, always in byte
/// mode, choosing the smallest version that fits.
///
/// Returns [`QrError::PayloadTooLarge`] if no version up to 40 admits the
/// payload at this level.
pub fn encode(data: &[u8], level: EcLevel) -> Result<Symbol, QrError> {
    encode_segments(&[Segment::bytes(data)], level, None)
}

/// Encodes a text string, picking numeric or alphanumeric mode when the
/// whole string fits the denser character set, byte mode otherwise.
pub fn encode_text(text: &str, level: EcLevel) -> Result<Symbol, QrError> {
    encode_segments(&[Segment::for_text(text)], level, None)
}

/// Like [`encode`], but with the mask pinned instead of selected by
/// penalty score.
pub fn encode_with_mask(data: &[u8], level: EcLevel, mask: Mask) -> Result<Symbol, QrError> {
    encode_segments(&[Segment::bytes(data)], level, Some(mask))
}

fn encode_segments(
    segs: &[Segment],
    level: EcLevel,
    forced_mask: Option<Mask>,
) -> Result<Symbol, QrError> {
    let version = select_version(segs, level)?;
    debug!(
        "encoding {} segment(s) at version {} level {:?}",
        segs.len(),
        version.value(),
        level
    );

    let data_codewords = build_data_codewords(segs, version, level);
    let all_codewords = add_ec_and_interleave(&data_codewords, version, level);

    let mut grid = SymbolGrid::new(version);
    grid.draw_function_patterns(level);
    place_data(&mut grid, &all_codewords);

    let mask = forced_mask.unwrap_or_else(|| select_mask(&mut grid, level));
    grid.apply_mask(mask);
    grid.draw_format_bits(level, mask);
    Ok(grid.into_symbol(level, mask))
}

// Smallest version whose data capacity covers header + payload +
// terminator bits.
fn select_version(segs: &[Segment], level: EcLevel) -> Result<Version, QrError> {
    for v in Version::MIN.value()..=Version::MAX.value() {
        let version = Version::new(v);
        if let Some(needed) = required_bits(segs, version) {
            if needed <= data_capacity_bits(version, level) {
                return Ok(version);
            }
        }
    }
    let needed = segs
        .iter()
        .map(|seg| 4 + seg.mode().char_count_bits(Version::MAX) + seg.data.len())
        .sum::<usize>()
        + TERMINATOR_BITS;
    Err(QrError::PayloadTooLarge {
        needed,
        available: data_capacity_bits(Version::MAX, level),
    })
}

fn required_bits(segs: &[Segment], version: Version) -> Option<usize> {
    let mut total = TERMINATOR_BITS;
    for seg in segs {
        total = total.checked_add(seg.total_bits(version)?)?;
    }
    Some(total)
}

// Mode headers and payload bits, terminator, byte alignment, then pad
// bytes until the exact data codeword capacity.
fn build_data_codewords(segs: &[Segment], version: Version, level: EcLevel) -> Vec<u8> {
    let capacity = data_capacity_bits(version, level);
    let mut bb = BitWriter::new();
    for seg in segs {
        bb.write(seg.mode().mode_bits(), 4);
        bb.write(
            seg.num_chars() as u32,
            seg.mode().char_count_bits(version) as u8,
        );
        bb.extend(&seg.data);
    }
    debug_assert!(bb.len() <= capacity);

    for _ in 0..TERMINATOR_BITS.min(capacity - bb.len()) {
        bb.push(false);
    }
    while bb.len() % 8 != 0 {
        bb.push(false);
    }
    for &pad in [0xECu32, 0x11].iter().cycle() {
        if bb.len() >= capacity {
            break;
        }
        bb.write(pad, 8);
    }
    debug_assert_eq!(bb.len(), capacity);
    bb.to_bytes()
}

// Splits the data codewords into blocks, appends the per-block EC
// codewords, and interleaves: data column-wise across blocks, then EC
// column-wise across blocks.
fn add_ec_and_interleave(data: &[u8], version: Version, level: EcLevel) -> Vec<u8> {
    let layout = block_layout(version, level);
    debug_assert_eq!(data.len(), layout.data_codewords());

    let mut blocks: Vec<&[u8]> = Vec::with_capacity(layout.block_count());
    let mut k = 0;
    for (count, len) in layout.groups {
        for _ in 0..count {
            blocks.push(&data[k..k + len]);
            k += len;
        }
    }

    let gen = reed_solomon::generator(layout.ec_per_block);
    let ec_blocks: Vec<Vec<u8>> = blocks
        .iter()
        .map(|block| reed_solomon::encode_with_generator(block, &gen))
        .collect();

    let max_data_len = layout.groups[0].1.max(layout.groups[1].1);
    let mut out = Vec::with_capacity(data.len() + layout.ec_per_block * blocks.len());
    for i in 0..max_data_len {
        for block in &blocks {
            if let Some(&cw) = block.get(i) {
                out.push(cw);
            }
        }
    }
    for i in 0..layout.ec_per_block {
        for ec in &ec_blocks {
            out.push(ec[i]);
        }
    }
    out
}

// Deposits the codeword bits along the zigzag traversal; trailing
// remainder modules stay light.
fn place_data(grid: &mut SymbolGrid, codewords: &[u8]) {
    let total_bits = codewords.len() * 8;
    for (i, (x, y)) in grid.data_positions().into_iter().enumerate() {
        if i >= total_bits {
            break;
        }
        let bit = codewords[i >> 3] >> (7 - (i & 7)) & 1 != 0;
        grid.set_data_module(x as i32, y as i32, bit);
    }
}

// Tries all eight masks with their format bits in place and keeps the one
// with the lowest penalty; ties fall to the lowest index.
fn select_mask(grid: &mut SymbolGrid, level: EcLevel) -> Mask {
    let mut best = Mask::M0;
    let mut best_penalty = u32::MAX;
    for mask in Mask::ALL {
        grid.apply_mask(mask);
        grid.draw_format_bits(level, mask);
        let penalty = penalty_score(grid.size(), grid.modules());
        trace!("mask {} penalty {}", mask.index(), penalty);
        if penalty < best_penalty {
            best = mask;
            best_penalty = penalty;
        }
        grid.apply_mask(mask); // XOR undoes the trial
    }
    debug!("selected mask {} (penalty {})", best.index(), best_penalty);
    best
}

/// Penalty score for a finished module grid: same-color runs, 2x2 blocks,
/// finder-lookalike patterns, and dark/light imbalance.
pub(crate) fn penalty_score(size: usize, modules: &[bool]) -> u32 {
    let at = |x: usize, y: usize| modules[y * size + x];
    let mut score = 0u32;

    // Runs of five or more same-colored modules, per row and column.
    for i in 0..size {
        let mut run_len = [1usize; 2];
        for j in 1..size {
            for (axis, run) in run_len.iter_mut().enumerate() {
                let (prev, cur) = if axis == 0 {
                    (at(j - 1, i), at(j, i))
                } else {
                    (at(i, j - 1), at(i, j))
                };
                if cur == prev {
                    *run += 1;
                    if j == size - 1 && *run >= 5 {
                        score += (*run - 2) as u32;
                    }
                } else {
                    if *run >= 5 {
                        score += (*run - 2) as u32;
                    }
                    *run = 1;
                }
            }
        }
    }

    // 2x2 blocks of a single color.
    for y in 0..size - 1 {
        for x in 0..size - 1 {
            let c = at(x, y);
            if c == at(x + 1, y) && c == at(x, y + 1) && c == at(x + 1, y + 1) {
                score += 3;
            }
        }
    }

    // 1:1:3:1:1 finder lookalikes with a four-module light margin on
    // either side, per row and column.
    const CORE: [bool; 7] = [true, false, true, true, true, false, true];
    for i in 0..size {
        for start in 0..=size - 7 {
            for axis in 0..2 {
                let get = |k: usize| {
                    if axis == 0 {
                        at(k, i)
                    } else {
                        at(i, k)
                    }
                };
                if (0..7).any(|k| get(start + k) != CORE[k]) {
                    continue;
                }
                let light_before = start >= 4 && (start - 4..start).all(|k| !get(k));
                let light_after =
                    start + 11 <= size && (start + 7..start + 11).all(|k| !get(k));
                if light_before || light_after {
                    score += 40;
                }
            }
        }
    }

    // Dark/light balance, in 5% steps away from an even split.
    let dark = modules.iter().filter(|&&m| m).count();
    let percent = dark as f64 * 100.0 / (size * size) as f64;
    score += 10 * ((percent - 50.0).abs() / 5.0).floor() as u32;

    score
}
