//! Position extraction from validated sentences
//!
//! Only two things are read out of a sentence: a latitude and a longitude,
//! each located by the hemisphere letter that follows it. The scan walks the
//! payload fields left to right without copying, remembering the previous
//! field:
//!
//! ```text
//! GPRMC , , , 4807.038 , N , 01131.000 , W , ...
//!             ^^^^^^^^   ^   ^^^^^^^^^   ^
//!             previous   |   previous    longitude marker
//!                        latitude marker
//! ```
//!
//! Which letters count as markers, and which of them negate the coordinate,
//! is decided by a [`HemispherePolicy`].

use heapless::{String, Vec};

use crate::constants::nmea::{DEFAULT_POSITION_SENTENCES, RECEIVER_CONFIG_PAYLOAD};
use crate::errors::{TelemetryError, TelemetryResult};
use crate::frame::{encode, EncodedFrame, ValidatedSentence};

/// Longest talker + type token accepted by the filter (e.g. `GPRMC`)
pub const SENTENCE_TYPE_CAPACITY: usize = 8;

/// Number of sentence types the filter can hold
pub const MAX_SENTENCE_TYPES: usize = 8;

/// Position in signed decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoFix {
    /// Degrees north of the equator (negative south)
    pub latitude: f64,
    /// Degrees east of Greenwich (negative west)
    pub longitude: f64,
}

/// How hemisphere letters are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HemispherePolicy {
    /// Only `N` marks a latitude and only `W` marks a longitude; the
    /// longitude is always negated. Fixes in the southern or eastern
    /// hemisphere are not reported. This is the behaviour of the deployed
    /// firmware, which was only ever flown north-west of Greenwich.
    #[default]
    NorthWest,
    /// `N`/`S` mark latitude and `E`/`W` mark longitude; `S` and `W` negate.
    Signed,
}

#[derive(Clone, Copy)]
enum Axis {
    Latitude,
    Longitude,
}

impl HemispherePolicy {
    /// Axis and sign a marker field stands for, if any
    fn classify(self, field: &[u8]) -> Option<(Axis, f64)> {
        match (self, field) {
            (_, b"N") => Some((Axis::Latitude, 1.0)),
            (_, b"W") => Some((Axis::Longitude, -1.0)),
            (Self::Signed, b"S") => Some((Axis::Latitude, -1.0)),
            (Self::Signed, b"E") => Some((Axis::Longitude, 1.0)),
            _ => None,
        }
    }
}

/// Allow-list of sentence types that carry a position
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SentenceFilter {
    allowed: Vec<String<SENTENCE_TYPE_CAPACITY>, MAX_SENTENCE_TYPES>,
}

impl SentenceFilter {
    /// Filter that accepts nothing
    pub const fn empty() -> Self {
        Self { allowed: Vec::new() }
    }

    /// Add a sentence type
    ///
    /// Returns `false` if the token is too long or the filter is full.
    pub fn allow(&mut self, sentence_type: &str) -> bool {
        if self.accepts(sentence_type) {
            return true;
        }
        let Ok(token) = String::try_from(sentence_type) else {
            return false;
        };
        self.allowed.push(token).is_ok()
    }

    /// Builder form of [`allow`](Self::allow); entries that do not fit are dropped
    pub fn with(mut self, sentence_type: &str) -> Self {
        self.allow(sentence_type);
        self
    }

    /// True if `sentence_type` is on the list
    pub fn accepts(&self, sentence_type: &str) -> bool {
        self.allowed.iter().any(|t| t.as_str() == sentence_type)
    }

    /// True if the sentence is valid and of an allowed type
    pub fn matches(&self, sentence: &ValidatedSentence<'_>) -> bool {
        sentence.is_valid()
            && sentence
                .sentence_type()
                .map_or(false, |kind| self.accepts(kind))
    }

    /// Allowed sentence types
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(|t| t.as_str())
    }
}

impl Default for SentenceFilter {
    fn default() -> Self {
        DEFAULT_POSITION_SENTENCES
            .iter()
            .fold(Self::empty(), |filter, kind| filter.with(kind))
    }
}

/// `DDMM.MMMM` (or `DDDMM.MMMM`) to decimal degrees
pub fn ddmm_to_degrees(raw: f64) -> f64 {
    let degrees = libm::floor(raw / 100.0);
    degrees + (raw - 100.0 * degrees) / 60.0
}

fn parse_coordinate(field: &[u8]) -> Option<f64> {
    let text = core::str::from_utf8(field).ok()?;
    let raw: f64 = text.parse().ok()?;
    raw.is_finite().then(|| ddmm_to_degrees(raw))
}

/// Extract a position, reporting why none was found
///
/// `MalformedFrame`/`ChecksumMismatch` for invalid sentences, otherwise
/// `NoFixThisCycle` when either marker is missing or the field before a
/// marker is not a number. The first marker of each axis decides.
pub fn try_decode(
    sentence: &ValidatedSentence<'_>,
    policy: HemispherePolicy,
) -> TelemetryResult<GeoFix> {
    if let Some(reason) = sentence.rejection() {
        return Err(reason);
    }

    let mut latitude: Option<Option<f64>> = None;
    let mut longitude: Option<Option<f64>> = None;
    let mut previous: &[u8] = &[];

    for field in sentence.fields() {
        if let Some((axis, sign)) = policy.classify(field) {
            let slot = match axis {
                Axis::Latitude => &mut latitude,
                Axis::Longitude => &mut longitude,
            };
            if slot.is_none() {
                *slot = Some(parse_coordinate(previous).map(|deg| sign * deg));
            }
        }
        previous = field;
    }

    match (latitude, longitude) {
        (Some(Some(latitude)), Some(Some(longitude))) => Ok(GeoFix {
            latitude,
            longitude,
        }),
        _ => Err(TelemetryError::NoFixThisCycle),
    }
}

/// Extract a position from a validated sentence
///
/// `None` means no fix this cycle; invalid sentences never decode.
pub fn decode(sentence: &ValidatedSentence<'_>, policy: HemispherePolicy) -> Option<GeoFix> {
    try_decode(sentence, policy).ok()
}

/// Framed receiver configuration sentence sent once at startup
pub fn receiver_config_sentence() -> TelemetryResult<EncodedFrame> {
    encode(RECEIVER_CONFIG_PAYLOAD.as_bytes())
}
