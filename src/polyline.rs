//! Encoded polyline codec for route geometries.
//!
//! Routes arrive from the directions API as strings in the Google encoded
//! polyline format (precision 5). This module decodes them into coordinate
//! sequences and encodes coordinate sequences back into the same format.
//!
//! Each point is stored as a pair of deltas against the previous point,
//! scaled by 1e5 and rounded. Each delta is zig-zag mapped to an unsigned
//! integer and written as 5-bit groups, least significant first, with
//! `0x20` set on every group except the last and `63` added to make the
//! byte printable.

use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const PRECISION: f64 = 1e5;
const ASCII_OFFSET: u8 = 63;
const CONTINUATION: u64 = 0x20;
const GROUP_MASK: u64 = 0x1f;
const MAX_CHAR: u8 = 126;

/// Errors produced while decoding an encoded polyline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolylineError {
    /// The input ended inside a chunk, or after a latitude with no longitude.
    #[error("polyline truncated at byte {position}")]
    Truncated { position: usize },
    /// A byte outside the printable range used by the format.
    #[error("invalid polyline character {character:?} at byte {position}")]
    InvalidCharacter { character: char, position: usize },
    /// A chunk or running coordinate does not fit in 64 bits.
    #[error("polyline value overflows at byte {position}")]
    Overflow { position: usize },
}

/// A polyline representing a route geometry as decoded coordinates.
///
/// Stores latitude/longitude points directly. Encoding to and from the
/// compact string form goes through [`Polyline::decode`] and
/// [`Polyline::encode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    /// Creates a new Polyline from decoded coordinate points.
    ///
    /// Each point is a (latitude, longitude) tuple.
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Decodes an encoded polyline string.
    pub fn decode(encoded: &str) -> Result<Self, PolylineError> {
        decode(encoded).map(Self::new)
    }

    /// Encodes the points back into the compact string form.
    pub fn encode(&self) -> String {
        encode(&self.points)
    }

    /// Returns a reference to the coordinate points.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Consumes the polyline and returns the owned coordinate points.
    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromStr for Polyline {
    type Err = PolylineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

/// Decodes an encoded polyline into (latitude, longitude) pairs.
///
/// An empty string decodes to an empty sequence. Input that stops in the
/// middle of a point is rejected rather than silently truncated.
pub fn decode(encoded: &str) -> Result<Vec<(f64, f64)>, PolylineError> {
    let bytes = encoded.as_bytes();
    let mut points = Vec::new();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while index < bytes.len() {
        let start = index;
        let dlat = read_delta(bytes, &mut index)?;
        let dlng = read_delta(bytes, &mut index)?;

        lat = lat
            .checked_add(dlat)
            .ok_or(PolylineError::Overflow { position: start })?;
        lng = lng
            .checked_add(dlng)
            .ok_or(PolylineError::Overflow { position: start })?;

        points.push((lat as f64 / PRECISION, lng as f64 / PRECISION));
    }

    Ok(points)
}

/// Encodes (latitude, longitude) pairs into a polyline string.
///
/// Coordinates are rounded to 5 decimal places. Out-of-range values are
/// encoded as-is. `NaN` encodes as `0.0` and infinities saturate to the
/// largest representable value, so callers should pass finite coordinates.
pub fn encode(points: &[(f64, f64)]) -> String {
    let mut out = String::with_capacity(points.len() * 8);
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for &(lat, lng) in points {
        let lat = scale(lat);
        let lng = scale(lng);
        write_delta(&mut out, lat.wrapping_sub(prev_lat));
        write_delta(&mut out, lng.wrapping_sub(prev_lng));
        prev_lat = lat;
        prev_lng = lng;
    }

    out
}

/// Decodes many route strings in parallel, preserving input order.
pub fn decode_all<S>(encoded: &[S]) -> Vec<Result<Polyline, PolylineError>>
where
    S: AsRef<str> + Sync,
{
    encoded
        .par_iter()
        .map(|route| Polyline::decode(route.as_ref()))
        .collect()
}

fn scale(value: f64) -> i64 {
    (value * PRECISION).round() as i64
}

/// Reads one variable-length chunk and undoes the zig-zag mapping.
fn read_delta(bytes: &[u8], index: &mut usize) -> Result<i64, PolylineError> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    loop {
        let position = *index;
        let &byte = bytes
            .get(position)
            .ok_or(PolylineError::Truncated { position })?;
        if !(ASCII_OFFSET..=MAX_CHAR).contains(&byte) {
            return Err(PolylineError::InvalidCharacter {
                character: char::from(byte),
                position,
            });
        }

        let b = u64::from(byte - ASCII_OFFSET);
        let group = b & GROUP_MASK;
        if shift >= u64::BITS || (group << shift) >> shift != group {
            return Err(PolylineError::Overflow { position });
        }
        result |= group << shift;
        shift += 5;
        *index += 1;

        if b & CONTINUATION == 0 {
            break;
        }
    }

    let half = (result >> 1) as i64;
    Ok(if result & 1 == 1 { !half } else { half })
}

fn write_delta(out: &mut String, delta: i64) {
    let shifted = delta.wrapping_shl(1);
    let mut value = (if delta < 0 { !shifted } else { shifted }) as u64;

    while value >= CONTINUATION {
        out.push(char::from(
            ((CONTINUATION | (value & GROUP_MASK)) as u8) + ASCII_OFFSET,
        ));
        value >>= 5;
    }
    out.push(char::from(value as u8 + ASCII_OFFSET));
}
