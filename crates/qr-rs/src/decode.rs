//! The decoder: raw RGBA frame in, payload bytes out.
//!
//! Every stage can fail on a malformed frame; the public entry point
//! flattens all of it to `None` so callers can poll camera frames without
//! error plumbing.

use log::{debug, trace};

use crate::binarize::{binarize, binarize_global, Bitmap};
use crate::bits::BitReader;
use crate::ec_level::EcLevel;
use crate::error::QrError;
use crate::finder::find_patterns;
use crate::locate::{estimate_size, order_patterns, Corners, Grid};
use crate::mask::Mask;
use crate::matrix::{format_positions, version_positions, SymbolGrid};
use crate::reed_solomon;
use crate::segment::DataMode;
use crate::tables::{block_layout, total_codewords, FORMAT_INFO, VERSION_INFO};
use crate::version::Version;
use crate::ALPHANUMERIC_CHARSET;

// Worst acceptable Hamming distance when matching format and version
// words against their codeword tables.
const MAX_WORD_DISTANCE: u32 = 3;

/// Decodes a QR symbol from an RGBA8 frame (`4 * width * height` bytes,
/// interleaved rows, top-left origin).
///
/// Returns `None` on any malformed or absent symbol; this never panics on
/// hostile input. Adaptive binarization is tried first, then a plain
/// global threshold as the fallback for clean synthetic frames.
pub fn decode(pixels: &[u8], width: usize, height: usize) -> Option<Vec<u8>> {
    let adaptive = binarize(pixels, width, height)?;
    match decode_bitmap(&adaptive) {
        Ok(payload) => Some(payload),
        Err(err) => {
            trace!("adaptive pass failed ({err}), retrying with global threshold");
            let global = binarize_global(pixels, width, height)?;
            decode_bitmap(&global).ok()
        }
    }
}

fn decode_bitmap(bitmap: &Bitmap) -> Result<Vec<u8>, QrError> {
    let patterns = find_patterns(bitmap);
    if patterns.len() < 3 {
        return Err(QrError::MalformedFrame("fewer than three finder patterns"));
    }
    let top3: [_; 3] = [patterns[0], patterns[1], patterns[2]];
    let corners =
        order_patterns(&top3).ok_or(QrError::MalformedFrame("degenerate finder geometry"))?;

    let (version, grid) = resolve_version(bitmap, &corners)?;
    debug!("sampling as version {}", version.value());

    let size = version.size();
    let mut modules = vec![false; size * size];
    for row in 0..size {
        for col in 0..size {
            modules[row * size + col] = grid.sample(bitmap, row, col);
        }
    }

    let (level, mask) = read_format(size, &modules)
        .ok_or(QrError::MalformedFrame("unreadable format information"))?;
    debug!("format: {level:?}, mask {}", mask.index());

    let bits = extract_bits(version, mask, &mut modules);
    let data = deinterleave_and_check(&bits, version, level)?;
    let data_bits: Vec<bool> = data
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |i| byte >> i & 1 != 0))
        .collect();
    parse_payload(&data_bits, version)
}

// Undoes the block interleave of the codeword stream and checks every
// block's Reed-Solomon syndromes. The syndromes gate misreads (a wrong
// threshold or sampling pass) rather than correcting them; damaged
// symbols are rejected, not repaired.
fn deinterleave_and_check(
    bits: &[bool],
    version: Version,
    level: EcLevel,
) -> Result<Vec<u8>, QrError> {
    let total = total_codewords(version);
    if bits.len() < total * 8 {
        return Err(QrError::MalformedFrame("short codeword stream"));
    }
    let mut codewords = vec![0u8; total];
    for (i, &bit) in bits.iter().take(total * 8).enumerate() {
        codewords[i >> 3] |= u8::from(bit) << (7 - (i & 7));
    }

    let layout = block_layout(version, level);
    let mut data_lens = Vec::with_capacity(layout.block_count());
    for (count, len) in layout.groups {
        data_lens.extend(std::iter::repeat(len).take(count));
    }
    let mut blocks: Vec<Vec<u8>> = data_lens
        .iter()
        .map(|&len| Vec::with_capacity(len + layout.ec_per_block))
        .collect();

    let mut stream = codewords.iter().copied();
    let max_data_len = layout.groups[0].1.max(layout.groups[1].1);
    for i in 0..max_data_len {
        for (block, &len) in blocks.iter_mut().zip(data_lens.iter()) {
            if i < len {
                block.extend(stream.next());
            }
        }
    }
    for _ in 0..layout.ec_per_block {
        for block in blocks.iter_mut() {
            block.extend(stream.next());
        }
    }

    for block in &blocks {
        for i in 0..layout.ec_per_block {
            if reed_solomon::syndrome(block, i) != 0 {
                return Err(QrError::MalformedFrame("error correction check failed"));
            }
        }
    }
    Ok(blocks
        .iter()
        .zip(data_lens.iter())
        .flat_map(|(block, &len)| block[..len].iter().copied())
        .collect())
}

// Seeds the version from the finder spacing and settles it by sampling:
// version-information blocks for 7 and up, format plausibility below.
// Candidates are tried nearest the estimate first.
fn resolve_version(bitmap: &Bitmap, corners: &Corners) -> Result<(Version, Grid), QrError> {
    let estimated = ((estimate_size(corners) - 17.0) / 4.0).round() as i64;
    for delta in [0i64, 1, -1, 2, -2] {
        let candidate = estimated + delta;
        if !(1..=40).contains(&candidate) {
            continue;
        }
        let version = Version::new(candidate as u8);
        let grid = Grid::new(corners, version.size());
        if version_confirmed(bitmap, &grid, version) {
            return Ok((version, grid));
        }
    }
    Err(QrError::MalformedFrame("no plausible version"))
}

fn version_confirmed(bitmap: &Bitmap, grid: &Grid, version: Version) -> bool {
    let size = version.size();
    if version.value() < 7 {
        // No version blocks below 7; accept only if the format area reads
        // near-exactly at this size.
        let mut modules = vec![false; size * size];
        for row in 0..size {
            for col in 0..size {
                modules[row * size + col] = grid.sample(bitmap, row, col);
            }
        }
        return matches!(read_format_scored(size, &modules), Some((dist, ..)) if dist <= 1);
    }
    for copy in version_positions(size) {
        let mut word = 0u32;
        for (i, &(x, y)) in copy.iter().enumerate() {
            if grid.sample(bitmap, y, x) {
                word |= 1 << i;
            }
        }
        let matched = (7..=40).min_by_key(|&v| (VERSION_INFO[v] ^ word).count_ones());
        if let Some(v) = matched {
            if (VERSION_INFO[v] ^ word).count_ones() <= MAX_WORD_DISTANCE
                && v == usize::from(version.value())
            {
                return true;
            }
        }
    }
    false
}

// Reads both format copies and picks the table word nearest either copy.
fn read_format(size: usize, modules: &[bool]) -> Option<(EcLevel, Mask)> {
    let (dist, level, mask) = read_format_scored(size, modules)?;
    (dist <= MAX_WORD_DISTANCE).then_some((level, mask))
}

fn read_format_scored(size: usize, modules: &[bool]) -> Option<(u32, EcLevel, Mask)> {
    let words = format_positions(size).map(|copy| {
        let mut word = 0u16;
        for (i, &(x, y)) in copy.iter().enumerate() {
            if modules[y * size + x] {
                word |= 1 << i;
            }
        }
        word
    });

    let mut best: Option<(u32, EcLevel, Mask)> = None;
    for level in EcLevel::ALL {
        for mask in Mask::ALL {
            let reference = FORMAT_INFO[level.ordinal()][usize::from(mask.index())];
            let dist = words
                .iter()
                .map(|&w| u32::from((w ^ reference).count_ones()))
                .min()
                .unwrap_or(u32::MAX);
            if best.map_or(true, |(d, _, _)| dist < d) {
                best = Some((dist, level, mask));
            }
        }
    }
    best
}

// Demasks the data area and walks the zigzag in read direction.
fn extract_bits(version: Version, mask: Mask, modules: &mut [bool]) -> Vec<bool> {
    let reservation = SymbolGrid::reservation(version);
    let size = version.size();
    for row in 0..size {
        for col in 0..size {
            if !reservation.is_reserved(col as i32, row as i32) {
                modules[row * size + col] ^= mask.inverts(row, col);
            }
        }
    }
    reservation
        .data_positions()
        .into_iter()
        .map(|(x, y)| modules[y * size + x])
        .collect()
}

// Mode-segmented payload: numeric, alphanumeric, and byte segments until
// the terminator or bit exhaustion.
fn parse_payload(bits: &[bool], version: Version) -> Result<Vec<u8>, QrError> {
    let mut reader = BitReader::new(bits);
    let mut out = Vec::new();
    loop {
        if reader.remaining() < 4 {
            break; // implicit terminator
        }
        let mode_bits = reader.take(4).unwrap_or(0);
        if mode_bits == 0 {
            break;
        }
        let mode = DataMode::from_mode_bits(mode_bits).ok_or(QrError::Unsupported {
            mode: mode_bits as u8,
        })?;
        let count = reader
            .take(mode.char_count_bits(version))
            .ok_or(QrError::MalformedFrame("truncated character count"))?
            as usize;
        match mode {
            DataMode::Numeric => read_numeric(&mut reader, count, &mut out)?,
            DataMode::Alphanumeric => read_alphanumeric(&mut reader, count, &mut out)?,
            DataMode::Byte => {
                for _ in 0..count {
                    let byte = reader
                        .take(8)
                        .ok_or(QrError::MalformedFrame("truncated byte segment"))?;
                    out.push(byte as u8);
                }
            }
        }
    }
    Ok(out)
}

fn read_numeric(reader: &mut BitReader, count: usize, out: &mut Vec<u8>) -> Result<(), QrError> {
    let truncated = QrError::MalformedFrame("truncated numeric segment");
    let overflow = QrError::MalformedFrame("numeric group out of range");
    let mut left = count;
    while left > 0 {
        let (digits, width, limit) = match left {
            1 => (1, 4, 9),
            2 => (2, 7, 99),
            _ => (3, 10, 999),
        };
        let group = reader.take(width).ok_or(truncated.clone())?;
        if group > limit {
            return Err(overflow);
        }
        let mut divisor = 10u32.pow(digits - 1);
        for _ in 0..digits {
            out.push(b'0' + (group / divisor % 10) as u8);
            divisor /= 10;
        }
        left -= digits as usize;
    }
    Ok(())
}

fn read_alphanumeric(
    reader: &mut BitReader,
    count: usize,
    out: &mut Vec<u8>,
) -> Result<(), QrError> {
    let charset = ALPHANUMERIC_CHARSET.as_bytes();
    let truncated = QrError::MalformedFrame("truncated alphanumeric segment");
    let overflow = QrError::MalformedFrame("alphanumeric group out of range");
    let mut left = count;
    while left > 0 {
        if left >= 2 {
            let pair = reader.take(11).ok_or(truncated.clone())?;
            if pair >= 45 * 45 {
                return Err(overflow);
            }
            out.push(charset[(pair / 45) as usize]);
            out.push(charset[(pair % 45) as usize]);
            left -= 2;
        } else {
            let single = reader.take(6).ok_or(truncated.clone())?;
            if single >= 45 {
                return Err(overflow);
            }
            out.push(charset[single as usize]);
            left -= 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::BitWriter;

    fn payload_bits(build: impl FnOnce(&mut BitWriter)) -> Vec<bool> {
        let mut w = BitWriter::new();
        build(&mut w);
        w.bits().to_vec()
    }

    #[test]
    fn parses_byte_segment() {
        let bits = payload_bits(|w| {
            w.write(0b0100, 4);
            w.write(2, 8);
            w.write(u32::from(b'O'), 8);
            w.write(u32::from(b'K'), 8);
            w.write(0, 4);
        });
        assert_eq!(parse_payload(&bits, Version::new(1)).unwrap(), b"OK");
    }

    #[test]
    fn parses_numeric_groups_with_leading_zeros() {
        let bits = payload_bits(|w| {
            w.write(0b0001, 4);
            w.write(4, 10);
            w.write(12, 10); // "012"
            w.write(7, 4); // "7"
        });
        assert_eq!(parse_payload(&bits, Version::new(1)).unwrap(), b"0127");
    }

    #[test]
    fn parses_alphanumeric_pair_and_tail() {
        let bits = payload_bits(|w| {
            w.write(0b0010, 4);
            w.write(3, 9);
            w.write(10 * 45 + 12, 11); // "AC"
            w.write(14, 6); // "E"
        });
        assert_eq!(parse_payload(&bits, Version::new(1)).unwrap(), b"ACE");
    }

    #[test]
    fn rejects_kanji_and_eci_modes() {
        for mode in [0b1000u32, 0b0111, 0b0011] {
            let bits = payload_bits(|w| {
                w.write(mode, 4);
                w.write(0, 12);
            });
            assert!(matches!(
                parse_payload(&bits, Version::new(1)),
                Err(QrError::Unsupported { .. })
            ));
        }
    }

    #[test]
    fn rejects_overflowing_numeric_group() {
        let bits = payload_bits(|w| {
            w.write(0b0001, 4);
            w.write(3, 10);
            w.write(1000, 10);
        });
        assert!(parse_payload(&bits, Version::new(1)).is_err());
    }

    #[test]
    fn format_recovery_tolerates_bit_damage() {
        let size = 21;
        let mut modules = vec![false; size * size];
        let reference = FORMAT_INFO[EcLevel::Quartile.ordinal()][5];
        let [first, second] = format_positions(size);
        for copy in [first, second] {
            for (i, &(x, y)) in copy.iter().enumerate() {
                modules[y * size + x] = reference >> i & 1 != 0;
            }
        }
        assert_eq!(
            read_format(size, &modules),
            Some((EcLevel::Quartile, Mask::M5))
        );
        // Damage two bits of one copy; the other still matches exactly.
        let (x, y) = first[3];
        modules[y * size + x] = !modules[y * size + x];
        let (x, y) = first[9];
        modules[y * size + x] = !modules[y * size + x];
        assert_eq!(
            read_format(size, &modules),
            Some((EcLevel::Quartile, Mask::M5))
        );
    }

    #[test]
    fn corrupted_module_is_rejected_not_misread() {
        let symbol = crate::encode(b"SYNDROME GUARD", EcLevel::Low).unwrap();
        let scale = 4usize;
        let margin = 4usize;
        let mut frame = crate::render::to_rgba(&symbol, scale, margin);
        // Invert one data module near the bottom-right corner.
        let (mx, my) = (20usize, 20usize);
        let was_dark = symbol.module(mx as i32, my as i32);
        let value = if was_dark { 0xFF } else { 0x00 };
        for py in 0..scale {
            for px in 0..scale {
                let x = (margin + mx) * scale + px;
                let y = (margin + my) * scale + py;
                let at = (y * frame.width + x) * 4;
                frame.data[at] = value;
                frame.data[at + 1] = value;
                frame.data[at + 2] = value;
            }
        }
        assert_eq!(decode(&frame.data, frame.width, frame.height), None);
    }

    #[test]
    fn version_blocks_override_a_bad_size_estimate() {
        let payload: Vec<u8> = (0..110u8).collect();
        let symbol = crate::encode(&payload, EcLevel::Medium).unwrap();
        assert_eq!(symbol.version(), Version::new(7));
        let frame = crate::render::to_rgba(&symbol, 4, 4);
        let bitmap =
            crate::binarize::binarize_global(&frame.data, frame.width, frame.height).unwrap();
        let patterns = find_patterns(&bitmap);
        assert!(patterns.len() >= 3);
        let top3 = [patterns[0], patterns[1], patterns[2]];
        let mut corners = order_patterns(&top3).unwrap();
        // Skew the module estimate so the finder spacing suggests
        // version 9; the version blocks must pull it back.
        corners.module *= 38.0 / 46.0;
        let (version, _) = resolve_version(&bitmap, &corners).unwrap();
        assert_eq!(version, Version::new(7));
    }

    #[test]
    fn garbage_frames_return_none() {
        assert_eq!(decode(&[], 0, 0), None);
        let noise: Vec<u8> = (0..40 * 40 * 4).map(|i| (i * 37 % 251) as u8).collect();
        assert_eq!(decode(&noise, 40, 40), None);
        // Solid white.
        assert_eq!(decode(&vec![0xFF; 32 * 32 * 4], 32, 32), None);
    }
}
