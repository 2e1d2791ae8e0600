//! Upload ingestion
//!
//! Decodes a top-level JSON array one element at a time and writes each
//! record into the store as soon as it decodes.
//!
//! Element policy is skip-and-continue: an element that is valid JSON but
//! not a valid user record is logged, reported in [`IngestReport::skipped`]
//! and ingestion moves on. Structural problems with the array itself
//! (empty body, not an array, truncated, trailing content) fail the whole
//! upload with [`InsightsError::MalformedInput`]. Records written before a
//! structural failure stay in the store; there is no rollback.

use std::fmt;

use serde::de::{Deserializer as _, SeqAccess, Visitor};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{InsightsError, Result};
use crate::models::UserRecord;
use crate::store::{RecordStore, StoreWriter};

/// Outcome of one successful upload
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    /// Store size after the upload
    pub record_count: usize,
    /// Elements decoded and written
    pub accepted: usize,
    /// Accepted elements whose id was already present and got overwritten
    pub replaced: usize,
    /// Elements that failed to decode
    pub skipped: Vec<SkippedRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedRecord {
    pub index: usize,
    pub reason: String,
}

impl From<SkippedRecord> for InsightsError {
    fn from(skipped: SkippedRecord) -> Self {
        InsightsError::RecordDecode {
            index: skipped.index,
            reason: skipped.reason,
        }
    }
}

/// Ingest an uploaded body into the store.
///
/// The store's write guard is held for the whole decode, so concurrent
/// uploads are applied one after the other and never interleave. The decode
/// runs on the blocking pool so a large upload does not stall a runtime worker.
pub async fn ingest_slice<B>(store: &RecordStore, input: B) -> Result<IngestReport>
where
    B: AsRef<[u8]> + Send + 'static,
{
    let writer = store.writer().await;
    let (report, decoded) =
        tokio::task::spawn_blocking(move || decode_into(writer, input.as_ref()))
            .await
            .map_err(|e| InsightsError::IngestTask(e.to_string()))?;

    if let Err(e) = decoded {
        warn!(
            error = %e,
            kept = report.accepted,
            "Upload rejected; records decoded before the failure were kept"
        );
        return Err(e);
    }

    info!(
        accepted = report.accepted,
        replaced = report.replaced,
        skipped = report.skipped.len(),
        record_count = report.record_count,
        "Upload ingested"
    );

    Ok(report)
}

/// Decode `input` straight into the locked store; the guard drops on return
fn decode_into(mut writer: StoreWriter, input: &[u8]) -> (IngestReport, Result<()>) {
    let mut report = IngestReport::default();

    let decoded = decode_array(input, |index, element| match element {
        Ok(record) => {
            report.accepted += 1;
            if writer.put(record) {
                report.replaced += 1;
            }
        }
        Err(e) => {
            let skipped = SkippedRecord {
                index,
                reason: e.to_string(),
            };
            warn!(error = %InsightsError::from(skipped.clone()), "Skipping undecodable record");
            report.skipped.push(skipped);
        }
    });

    report.record_count = writer.len();
    (report, decoded)
}

/// Walk a JSON array, handing each element's decode result to `on_element`
fn decode_array<F>(input: &[u8], mut on_element: F) -> Result<()>
where
    F: FnMut(usize, std::result::Result<UserRecord, serde_json::Error>),
{
    if input.iter().all(u8::is_ascii_whitespace) {
        return Err(InsightsError::MalformedInput("upload is empty".to_string()));
    }

    let mut de = serde_json::Deserializer::from_slice(input);
    de.deserialize_seq(ArrayVisitor {
        on_element: &mut on_element,
    })
    .map_err(|e| InsightsError::MalformedInput(e.to_string()))?;

    de.end().map_err(|e| {
        InsightsError::MalformedInput(format!("unexpected content after the array: {e}"))
    })
}

struct ArrayVisitor<'f, F> {
    on_element: &'f mut F,
}

impl<'de, F> Visitor<'de> for ArrayVisitor<'_, F>
where
    F: FnMut(usize, std::result::Result<UserRecord, serde_json::Error>),
{
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a JSON array of user records")
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut index = 0;
        // A syntax error inside an element surfaces here and aborts the array;
        // a well-formed element with the wrong shape only fails its own decode.
        while let Some(element) = seq.next_element::<serde_json::Value>()? {
            (self.on_element)(index, serde_json::from_value(element));
            index += 1;
        }
        Ok(())
    }
}
