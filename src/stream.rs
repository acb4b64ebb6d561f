use std::fmt;

use bytes::Bytes;
use thiserror::Error as ThisError;

/// Identifier of one stream record: a millisecond timestamp plus a sequence
/// number disambiguating records within the same millisecond. The derived
/// ordering (timestamp first, then sequence) is the total order the stream
/// invariant is defined over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct StreamId {
    pub ms: u64,
    pub seq: u64,
}

impl StreamId {
    /// `0-0`: the smallest possible id. Never valid for a new record.
    pub const MIN: StreamId = StreamId { ms: 0, seq: 0 };
    pub const MAX: StreamId = StreamId {
        ms: u64::MAX,
        seq: u64::MAX,
    };

    /// Parses a fully explicit `<ms>-<seq>` id.
    pub fn parse(input: &str) -> Result<StreamId, StreamIdError> {
        let (ms, seq) = input.split_once('-').ok_or(StreamIdError::Malformed)?;
        let ms = ms.parse::<u64>().map_err(|_| StreamIdError::Malformed)?;
        let seq = seq.parse::<u64>().map_err(|_| StreamIdError::Malformed)?;

        Ok(StreamId { ms, seq })
    }

    /// Parses a range bound, where a bare `<ms>` leaves the sequence part to
    /// `default_seq` (0 for a lower bound, `u64::MAX` for an upper bound).
    pub fn parse_bound(input: &str, default_seq: u64) -> Result<StreamId, StreamIdError> {
        match input.split_once('-') {
            Some(_) => Self::parse(input),
            None => {
                let ms = input.parse::<u64>().map_err(|_| StreamIdError::Malformed)?;
                Ok(StreamId {
                    ms,
                    seq: default_seq,
                })
            }
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

// Error messages match the replies Redis sends for the same violations.
#[derive(Debug, ThisError, PartialEq)]
pub enum StreamIdError {
    #[error("Invalid stream ID specified as stream command argument")]
    Malformed,
    #[error("The ID specified in XADD must be greater than 0-0")]
    MinimumId,
    #[error("The ID specified in XADD is equal or smaller than the target stream top item")]
    NotGreaterThanLast,
}

/// One appended record: its id plus the field/value pairs in the order the
/// client sent them.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamRecord {
    pub id: StreamId,
    pub fields: Vec<(Bytes, Bytes)>,
}

/// An append-only sequence of records with strictly increasing ids. Records
/// are never mutated or removed once appended, so the backing vector stays
/// sorted by construction and range queries can binary-search it.
#[derive(Debug, Default, PartialEq)]
pub struct Stream {
    records: Vec<StreamRecord>,
}

impl Stream {
    pub fn new() -> Stream {
        Stream {
            records: Vec::new(),
        }
    }

    pub fn last_id(&self) -> Option<StreamId> {
        self.records.last().map(|record| record.id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Resolves an XADD id argument against the stream's current last id.
    ///
    /// * `*`: `now_ms` with sequence 0. When `now_ms` does not advance past
    ///   the last id, the last id's sequence is bumped instead, so ids stay
    ///   strictly increasing even if the wall clock stalls or steps back.
    /// * `<ms>-*`: explicit timestamp, auto sequence. One past the largest
    ///   sequence recorded for that timestamp, 0 for a fresh timestamp,
    ///   except timestamp 0 which starts at 1 so `0-0` stays unused.
    /// * `<ms>-<seq>`: fully explicit. Must be well-formed, greater than
    ///   `0-0`, and greater than the current last id.
    pub fn resolve_id(&self, requested: &str, now_ms: u64) -> Result<StreamId, StreamIdError> {
        if requested == "*" {
            return Ok(self.next_auto_id(now_ms));
        }

        if let Some(ms) = requested.strip_suffix("-*") {
            let ms = ms.parse::<u64>().map_err(|_| StreamIdError::Malformed)?;
            let seq = self.next_seq_for_ms(ms)?;
            return Ok(StreamId { ms, seq });
        }

        let id = StreamId::parse(requested)?;

        if id <= StreamId::MIN {
            return Err(StreamIdError::MinimumId);
        }

        if self.last_id().is_some_and(|last| id <= last) {
            return Err(StreamIdError::NotGreaterThanLast);
        }

        Ok(id)
    }

    fn next_auto_id(&self, now_ms: u64) -> StreamId {
        match self.last_id() {
            Some(last) if last.ms >= now_ms => StreamId {
                ms: last.ms,
                seq: last.seq + 1,
            },
            _ if now_ms == 0 => StreamId { ms: 0, seq: 1 },
            _ => StreamId { ms: now_ms, seq: 0 },
        }
    }

    fn next_seq_for_ms(&self, ms: u64) -> Result<u64, StreamIdError> {
        match self.last_id() {
            // Ids are strictly increasing, so the last record carries the
            // largest sequence seen for its timestamp.
            Some(last) if last.ms == ms => Ok(last.seq + 1),
            Some(last) if last.ms > ms => Err(StreamIdError::NotGreaterThanLast),
            _ if ms == 0 => Ok(1),
            _ => Ok(0),
        }
    }

    /// Appends a record. `id` must come from [`Stream::resolve_id`] under the
    /// same store lock acquisition, which guarantees it exceeds the last id.
    pub fn append(&mut self, id: StreamId, fields: Vec<(Bytes, Bytes)>) {
        self.records.push(StreamRecord { id, fields });
    }

    /// All records with `start <= id <= end`, in stored order. Inverted
    /// bounds select nothing.
    pub fn range(&self, start: StreamId, end: StreamId) -> &[StreamRecord] {
        let low = self.records.partition_point(|record| record.id < start);
        let high = self.records.partition_point(|record| record.id <= end);
        self.records.get(low..high).unwrap_or(&[])
    }

    /// All records with `id > after`, in stored order.
    pub fn read_after(&self, after: StreamId) -> &[StreamRecord] {
        let low = self.records.partition_point(|record| record.id <= after);
        &self.records[low..]
    }
}
