//! Bitplane coding: WDR run coder, sorting pass, refinement pass.
//!
//! One invocation codes a single bitplane of a single subband. The
//! sorting pass discovers newly significant coefficients through
//! run-coded distances along the LIP; the refinement pass emits the
//! next lower-order bit of every already-significant coefficient.
//! Every bit of I/O is checked; an exhausted budget unwinds through
//! `Eob` leaving both encoder and decoder state consistent up to the
//! last fully-received bit.

use crate::arena::{exchange, merge, NIL};
use crate::bit_io::{BitReader, BitWriter, Eob};
use crate::plane::PlaneSet;
use crate::subband::Subband;

/// Writes the WDR form of `run >= 1`: `k = floor(log2 run)` zero bits,
/// a terminating one, then the low `k` bits of `run` MSB-first.
pub fn write_wdr(writer: &mut BitWriter<'_>, run: u32) -> Result<(), Eob> {
    debug_assert!(run >= 1);
    let k = 31 - run.leading_zeros();
    for _ in 0..k {
        writer.write_bit(0)?;
    }
    writer.write_bit(1)?;
    if k > 0 {
        writer.write_bits(run & ((1 << k) - 1), k)?;
    }
    Ok(())
}

/// Reads one WDR-coded run: zeros count the magnitude, then the value
/// is one followed by that many bits.
pub fn read_wdr(reader: &mut BitReader<'_>) -> Result<u32, Eob> {
    let mut k = 0u32;
    while reader.read_bit()? == 0 {
        k += 1;
        if k > 31 {
            // Corrupt padding; treat like an exhausted stream.
            return Err(Eob);
        }
    }
    if k == 0 {
        return Ok(1);
    }
    Ok((1 << k) | reader.read_bits(k)?)
}

/// Encodes one bitplane (sorting pass then refinement pass) of `band`.
pub fn encode_bitplane(
    band: &mut Subband,
    plane: &[i16],
    stride: usize,
    writer: &mut BitWriter<'_>,
) -> Result<(), Eob> {
    let bitplane = band.bitplane as u32;
    let x0 = band.x0;
    let y0 = band.y0;
    let state = match band.state.as_mut() {
        Some(state) => state,
        None => return Ok(()),
    };

    // Sorting pass: walk the LIP, run-code the gaps between hits.
    let total = state.lip.len;
    let mut index = 0u32;
    let mut last = 0u32;
    let mut prev = NIL;
    let mut cursor = state.lip.head;
    while cursor != NIL {
        index += 1;
        let node = state.arena.node(cursor);
        let next = node.next;
        let word = plane[(y0 + node.y as usize) * stride + x0 + node.x as usize] as i32;
        if (word >> bitplane) & 1 == 1 {
            write_wdr(writer, index - last)?;
            writer.write_bit((word & 1) as u32)?;
            exchange(&mut state.lip, &mut state.nsp, &mut state.arena, cursor, prev);
            last = index;
        } else {
            prev = cursor;
        }
        cursor = next;
    }
    // Tail run pushes the decoder past the list end.
    write_wdr(writer, total - last + 1)?;

    // Refinement pass over the LSP in promotion order.
    let mut cursor = state.lsp.head;
    while cursor != NIL {
        let node = state.arena.node(cursor);
        let word = plane[(y0 + node.y as usize) * stride + x0 + node.x as usize] as i32;
        writer.write_bit(((word >> bitplane) & 1) as u32)?;
        cursor = node.next;
    }

    merge(&mut state.nsp, &mut state.lsp, &mut state.arena);
    Ok(())
}

/// Decodes one bitplane of `band`, mirroring [`encode_bitplane`].
pub fn decode_bitplane(
    band: &mut Subband,
    plane: &mut [i16],
    stride: usize,
    reader: &mut BitReader<'_>,
) -> Result<(), Eob> {
    let bitplane = band.bitplane as u32;
    let x0 = band.x0;
    let y0 = band.y0;
    let state = match band.state.as_mut() {
        Some(state) => state,
        None => return Ok(()),
    };

    let total = state.lip.len;
    let mut index = 0u32;
    let mut last = 0u32;
    let mut prev = NIL;
    let mut cursor = state.lip.head;
    loop {
        let run = read_wdr(reader)?;
        let target = last.saturating_add(run);
        if target > total {
            break;
        }
        let sign = reader.read_bit()?;
        while index < target - 1 {
            index += 1;
            prev = cursor;
            cursor = state.arena.node(cursor).next;
        }
        index = target;
        let node = state.arena.node(cursor);
        let next = node.next;
        plane[(y0 + node.y as usize) * stride + x0 + node.x as usize] =
            ((1 << bitplane) | sign) as i16;
        exchange(&mut state.lip, &mut state.nsp, &mut state.arena, cursor, prev);
        cursor = next;
        last = target;
    }

    let mut cursor = state.lsp.head;
    while cursor != NIL {
        let node = state.arena.node(cursor);
        let bit = reader.read_bit()?;
        plane[(y0 + node.y as usize) * stride + x0 + node.x as usize] |= (bit << bitplane) as i16;
        cursor = node.next;
    }

    merge(&mut state.nsp, &mut state.lsp, &mut state.arena);
    Ok(())
}

/// Rounds truncated coefficients toward the midpoint of their
/// uncertainty interval: for every subband still holding unresolved
/// low bits, OR `((1 << bitplane) - 1) ^ 1` into each promoted
/// coefficient, preserving the sign bit. Insignificant coefficients
/// stay zero.
pub fn round_truncated_coefficients(bands: &mut [Subband], planes: &mut PlaneSet) {
    let stride = planes.width();
    for band in bands.iter_mut() {
        let x0 = band.x0;
        let y0 = band.y0;
        let plane_index = band.plane;
        if band.max_bitplane == 0 || band.bitplane < 2 {
            continue;
        }
        let state = match band.state.as_mut() {
            Some(state) => state,
            None => continue,
        };
        // Pixels promoted in an interrupted pass sit in NSP with the
        // same unresolved range as the LSP, so fold them in first.
        merge(&mut state.nsp, &mut state.lsp, &mut state.arena);
        let mask = (((1u32 << band.bitplane) - 1) ^ 1) as i16;
        let plane = planes.plane_mut(plane_index);
        let mut cursor = state.lsp.head;
        while cursor != NIL {
            let node = state.arena.node(cursor);
            plane[(y0 + node.y as usize) * stride + x0 + node.x as usize] |= mask;
            cursor = node.next;
        }
    }
}
