use std::fmt;
use thiserror::Error;

/// Packet count assumed when the set's real count is unknown.
pub const DEFAULT_MAX_PACKET_NUMBER: u32 = 24;

/// Highest packet number any set may have.
pub const PACKET_NUMBER_LIMIT: u32 = 999;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectionError {
    #[error("please enter a set name")]
    MissingSetName,

    #[error("invalid packet number: {token}")]
    InvalidPacketNumber { token: String },

    #[error("invalid packet range: {token}")]
    InvalidPacketRange { token: String },

    #[error("packet {number} is out of range (1-{max})")]
    PacketOutOfRange { number: u32, max: u32 },

    #[error("no packets selected")]
    NoPackets,

    #[error("max packet number {max} is above the limit of {limit}")]
    MaxPacketTooLarge { max: u32, limit: u32 },

    #[error("invalid question number: {raw}")]
    InvalidQuestionNumber { raw: String },
}

//
// ─── PACKET RANGE ──────────────────────────────────────────────────────────────
//

/// Ordered list of packet numbers chosen by the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketRange(Vec<u32>);

impl PacketRange {
    /// Parse a selection like `"1-3, 7, 10-"`.
    ///
    /// Blank input selects every packet `1..=max`. A trailing `-` runs to
    /// `max`. Numbers above `max` are rejected. A `max` of zero means the
    /// set's count is unknown and only [`PACKET_NUMBER_LIMIT`] applies.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError` for malformed tokens, zero, inverted or
    /// out-of-range numbers, a `max` above [`PACKET_NUMBER_LIMIT`], or an
    /// empty result.
    pub fn parse(raw: &str, max: u32) -> Result<Self, SelectionError> {
        if max > PACKET_NUMBER_LIMIT {
            return Err(SelectionError::MaxPacketTooLarge {
                max,
                limit: PACKET_NUMBER_LIMIT,
            });
        }
        let raw = raw.trim();
        if raw.is_empty() {
            if max == 0 {
                return Err(SelectionError::NoPackets);
            }
            return Ok(Self((1..=max).collect()));
        }

        let mut packets = Vec::new();
        for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token.split_once('-') {
                Some((lo, hi)) => {
                    let lo = parse_packet_number(lo, token, max)?;
                    let hi = if hi.trim().is_empty() {
                        bound(max)
                    } else {
                        parse_packet_number(hi, token, max)?
                    };
                    if lo > hi {
                        return Err(SelectionError::InvalidPacketRange {
                            token: token.to_owned(),
                        });
                    }
                    packets.extend(lo..=hi);
                }
                None => packets.push(parse_packet_number(token, token, max)?),
            }
        }

        if packets.is_empty() {
            return Err(SelectionError::NoPackets);
        }
        Ok(Self(packets))
    }

    #[must_use]
    pub fn first(&self) -> Option<u32> {
        self.0.first().copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn parse_packet_number(raw: &str, token: &str, max: u32) -> Result<u32, SelectionError> {
    let number: u32 = raw
        .trim()
        .parse()
        .map_err(|_| SelectionError::InvalidPacketNumber {
            token: token.to_owned(),
        })?;
    if number == 0 {
        return Err(SelectionError::InvalidPacketNumber {
            token: token.to_owned(),
        });
    }
    let max = bound(max);
    if number > max {
        return Err(SelectionError::PacketOutOfRange { number, max });
    }
    Ok(number)
}

fn bound(max: u32) -> u32 {
    if max == 0 { PACKET_NUMBER_LIMIT } else { max }
}

impl fmt::Display for PacketRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        f.write_str(&joined)
    }
}

//
// ─── SELECTION ─────────────────────────────────────────────────────────────────
//

/// A validated "read this set" request: which set, which packets, and where
/// to start within the first packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketSelection {
    set_name: String,
    packets: PacketRange,
    start_question: u32,
}

impl PacketSelection {
    /// Build a selection from raw reader input.
    ///
    /// The set name is trimmed and must be non-empty. A blank question
    /// number means question 1.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError` if any input is invalid.
    pub fn new(
        set_name: &str,
        packets: &str,
        question_number: &str,
        max_packet_number: u32,
    ) -> Result<Self, SelectionError> {
        let set_name = set_name.trim();
        if set_name.is_empty() {
            return Err(SelectionError::MissingSetName);
        }

        let packets = PacketRange::parse(packets, max_packet_number)?;

        let question_number = question_number.trim();
        let start_question = if question_number.is_empty() {
            1
        } else {
            question_number
                .parse::<u32>()
                .ok()
                .filter(|n| *n >= 1)
                .ok_or_else(|| SelectionError::InvalidQuestionNumber {
                    raw: question_number.to_owned(),
                })?
        };

        Ok(Self {
            set_name: set_name.to_owned(),
            packets,
            start_question,
        })
    }

    #[must_use]
    pub fn set_name(&self) -> &str {
        &self.set_name
    }

    #[must_use]
    pub fn packets(&self) -> &PacketRange {
        &self.packets
    }

    /// One-based question number to start from in the first packet.
    #[must_use]
    pub fn start_question(&self) -> u32 {
        self.start_question
    }

    /// Zero-based index of the starting question.
    #[must_use]
    pub fn start_index(&self) -> usize {
        usize::try_from(self.start_question.saturating_sub(1)).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_range_selects_every_packet() {
        let range = PacketRange::parse("  ", 4).unwrap();
        assert_eq!(range.as_slice(), &[1, 2, 3, 4]);
        assert_eq!(PacketRange::parse("", 0), Err(SelectionError::NoPackets));
    }

    #[test]
    fn mixes_ranges_and_single_packets() {
        let range = PacketRange::parse("1-3, 7,10", 24).unwrap();
        assert_eq!(range.as_slice(), &[1, 2, 3, 7, 10]);
        assert_eq!(range.first(), Some(1));
        assert_eq!(range.to_string(), "1, 2, 3, 7, 10");
    }

    #[test]
    fn open_range_runs_to_max() {
        let range = PacketRange::parse("22-", 24).unwrap();
        assert_eq!(range.as_slice(), &[22, 23, 24]);
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(matches!(
            PacketRange::parse("x", 24),
            Err(SelectionError::InvalidPacketNumber { .. })
        ));
        assert!(matches!(
            PacketRange::parse("0", 24),
            Err(SelectionError::InvalidPacketNumber { .. })
        ));
        assert!(matches!(
            PacketRange::parse("5-2", 24),
            Err(SelectionError::InvalidPacketRange { .. })
        ));
        assert_eq!(
            PacketRange::parse("30", 24),
            Err(SelectionError::PacketOutOfRange { number: 30, max: 24 })
        );
        assert_eq!(PacketRange::parse(" , ", 24), Err(SelectionError::NoPackets));
    }

    #[test]
    fn packet_numbers_are_capped() {
        assert_eq!(
            PacketRange::parse("", u32::MAX),
            Err(SelectionError::MaxPacketTooLarge {
                max: u32::MAX,
                limit: PACKET_NUMBER_LIMIT
            })
        );
        assert_eq!(
            PacketSelection::new("2021 ACF Fall", "1", "", PACKET_NUMBER_LIMIT + 1),
            Err(SelectionError::MaxPacketTooLarge {
                max: PACKET_NUMBER_LIMIT + 1,
                limit: PACKET_NUMBER_LIMIT
            })
        );
        // unknown packet count: the limit still bounds explicit ranges
        assert_eq!(
            PacketRange::parse("1-4000000000", 0),
            Err(SelectionError::PacketOutOfRange {
                number: 4_000_000_000,
                max: PACKET_NUMBER_LIMIT
            })
        );
        let open = PacketRange::parse("998-", 0).unwrap();
        assert_eq!(open.as_slice(), &[998, 999]);
        assert_eq!(
            PacketRange::parse("", PACKET_NUMBER_LIMIT).unwrap().len(),
            999
        );
    }

    #[test]
    fn selection_requires_set_name() {
        assert_eq!(
            PacketSelection::new("   ", "1", "", DEFAULT_MAX_PACKET_NUMBER),
            Err(SelectionError::MissingSetName)
        );
    }

    #[test]
    fn selection_defaults_to_first_question() {
        let selection =
            PacketSelection::new(" 2021 ACF Fall ", "2-3", "", DEFAULT_MAX_PACKET_NUMBER).unwrap();
        assert_eq!(selection.set_name(), "2021 ACF Fall");
        assert_eq!(selection.packets().as_slice(), &[2, 3]);
        assert_eq!(selection.start_question(), 1);
        assert_eq!(selection.start_index(), 0);
    }

    #[test]
    fn selection_rejects_bad_question_number() {
        for raw in ["0", "-1", "abc"] {
            assert!(matches!(
                PacketSelection::new("Set", "", raw, 24),
                Err(SelectionError::InvalidQuestionNumber { .. })
            ));
        }
        let selection = PacketSelection::new("Set", "", "5", 24).unwrap();
        assert_eq!(selection.start_index(), 4);
    }
}
