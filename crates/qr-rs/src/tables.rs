//! The ISO/IEC 18004 capacity and information tables.
//!
//! Index 0 of every per-version table is padding so tables can be indexed
//! directly by version number.

use crate::ec_level::EcLevel;
use crate::version::Version;

/// Total codewords (data + error correction) per version.
pub static TOTAL_CODEWORDS: [u16; 41] = [
    0, 26, 44, 70, 100, 134, 172, 196, 242, 292, 346, 404, 466, 532, 581, 655, 733, 815, 901, 991,
    1085, 1156, 1258, 1364, 1474, 1588, 1706, 1828, 1921, 2051, 2185, 2323, 2465, 2611, 2761,
    2876, 3034, 3196, 3362, 3532, 3706,
];

/// Error correction codewords per block, by `[level][version]`.
pub static ECC_CODEWORDS_PER_BLOCK: [[u8; 41]; 4] = [
    // Version: 1, 2, 3, ..., 40
    [
        0, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28,
        30, 30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Low
    [
        0, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28,
        28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ], // Medium
    [
        0, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30,
        30, 30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Quartile
    [
        0, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // High
];

/// Error correction block count, by `[level][version]`.
pub static NUM_ERROR_CORRECTION_BLOCKS: [[u8; 41]; 4] = [
    // Version: 1, 2, 3, ..., 40
    [
        0, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12,
        13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ], // Low
    [
        0, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21,
        23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ], // Medium
    [
        0, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27,
        29, 34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ], // Quartile
    [
        0, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32,
        35, 37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ], // High
];

/// Alignment pattern center coordinates per version, on both axes.
pub static ALIGNMENT_POSITIONS: [&[usize]; 41] = [
    &[],
    &[],
    &[6, 18],
    &[6, 22],
    &[6, 26],
    &[6, 30],
    &[6, 34],
    &[6, 22, 38],
    &[6, 24, 42],
    &[6, 26, 46],
    &[6, 28, 50],
    &[6, 30, 54],
    &[6, 32, 58],
    &[6, 34, 62],
    &[6, 26, 46, 66],
    &[6, 26, 48, 70],
    &[6, 26, 50, 74],
    &[6, 30, 54, 78],
    &[6, 30, 56, 82],
    &[6, 30, 58, 86],
    &[6, 34, 62, 90],
    &[6, 28, 50, 72, 94],
    &[6, 26, 50, 74, 98],
    &[6, 30, 54, 78, 102],
    &[6, 28, 54, 80, 106],
    &[6, 32, 58, 84, 110],
    &[6, 30, 58, 86, 114],
    &[6, 34, 62, 90, 118],
    &[6, 26, 50, 74, 98, 122],
    &[6, 30, 54, 78, 102, 126],
    &[6, 26, 52, 78, 104, 130],
    &[6, 30, 56, 82, 108, 134],
    &[6, 34, 60, 86, 112, 138],
    &[6, 30, 58, 86, 114, 142],
    &[6, 34, 62, 90, 118, 146],
    &[6, 30, 54, 78, 102, 126, 150],
    &[6, 24, 50, 76, 102, 128, 154],
    &[6, 28, 54, 80, 106, 132, 158],
    &[6, 32, 58, 84, 110, 136, 162],
    &[6, 26, 54, 82, 110, 138, 166],
    &[6, 30, 58, 86, 114, 142, 170],
];

/// Precomputed 18-bit BCH(18,6) version information words, valid for
/// versions 7 through 40 (entries below 7 are padding).
pub static VERSION_INFO: [u32; 41] = [
    0, 0, 0, 0, 0, 0, 0, 0x07C94, 0x085BC, 0x09A99, 0x0A4D3, 0x0BBF6, 0x0C762, 0x0D847, 0x0E60D,
    0x0F928, 0x10B78, 0x1145D, 0x12A17, 0x13532, 0x149A6, 0x15683, 0x168C9, 0x177EC, 0x18EC4,
    0x191E1, 0x1AFAB, 0x1B08E, 0x1CC1A, 0x1D33F, 0x1ED75, 0x1F250, 0x209D5, 0x216F0, 0x228BA,
    0x2379F, 0x24B0B, 0x2542E, 0x26A64, 0x27541, 0x28C69,
];

/// Precomputed 15-bit format information words as placed in the symbol
/// (BCH(15,5) of `ec_bits << 3 | mask`, already XORed with 0x5412), by
/// `[level][mask]`.
pub static FORMAT_INFO: [[u16; 8]; 4] = [
    [
        0x77C4, 0x72F3, 0x7DAA, 0x789D, 0x662F, 0x6318, 0x6C41, 0x6976,
    ], // Low
    [
        0x5412, 0x5125, 0x5E7C, 0x5B4B, 0x45F9, 0x40CE, 0x4F97, 0x4AA0,
    ], // Medium
    [
        0x355F, 0x3068, 0x3F31, 0x3A06, 0x24B4, 0x2183, 0x2EDA, 0x2BED,
    ], // Quartile
    [
        0x1689, 0x13BE, 0x1CE7, 0x19D0, 0x0762, 0x0255, 0x0D0C, 0x083B,
    ], // High
];

/// How a version's codewords split into error correction blocks.
///
/// Each group is `(block_count, data_codewords_per_block)`; the second
/// group's blocks carry one extra data codeword, and `blocks2` may be zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    pub ec_per_block: usize,
    pub groups: [(usize, usize); 2],
}

impl BlockLayout {
    /// Total number of blocks across both groups.
    pub fn block_count(&self) -> usize {
        self.groups[0].0 + self.groups[1].0
    }

    /// Total data codewords across both groups.
    pub fn data_codewords(&self) -> usize {
        self.groups[0].0 * self.groups[0].1 + self.groups[1].0 * self.groups[1].1
    }
}

/// Returns the `(ec_per_block, blocks1, data1, blocks2, data2)` row for a
/// `(version, level)` pair.
pub fn block_layout(version: Version, level: EcLevel) -> BlockLayout {
    let v = usize::from(version.value());
    let total = usize::from(TOTAL_CODEWORDS[v]);
    let ec_per_block = usize::from(ECC_CODEWORDS_PER_BLOCK[level.ordinal()][v]);
    let num_blocks = usize::from(NUM_ERROR_CORRECTION_BLOCKS[level.ordinal()][v]);

    // Short blocks come first; the remainder codewords lengthen the tail
    // blocks by one each.
    let long_blocks = total % num_blocks;
    let short_blocks = num_blocks - long_blocks;
    let short_data = total / num_blocks - ec_per_block;
    BlockLayout {
        ec_per_block,
        groups: [(short_blocks, short_data), (long_blocks, short_data + 1)],
    }
}

/// Total codewords for a version.
pub fn total_codewords(version: Version) -> usize {
    usize::from(TOTAL_CODEWORDS[usize::from(version.value())])
}

/// Data codewords (total minus error correction) for a version and level.
pub fn data_codewords(version: Version, level: EcLevel) -> usize {
    block_layout(version, level).data_codewords()
}

/// Data capacity in bits for a version and level.
pub fn data_capacity_bits(version: Version, level: EcLevel) -> usize {
    data_codewords(version, level) * 8
}
