//! Streaming JSON array to JSONL conversion.
//!
//! The input is parsed on a blocking worker one array element at a time. Each
//! element is re-encoded onto its own line and handed to the consumer through a
//! bounded channel, so at most a handful of lines are buffered however large the
//! file is. Dropping the stream stops the worker at its next send.

use bytes::Bytes;
use futures::Stream;
use serde::de::{Deserializer as _, Error as _, SeqAccess, Visitor};
use serde_json::{Map, Value};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};

use crate::errors::{OpenAIError, OpenAIResult};
use crate::purpose::UploadPurpose;

const CHANNEL_CAPACITY: usize = 16;
const CONSUMER_GONE: &str = "jsonl consumer dropped";

/// Whether an upload of `filename` with `purpose` is sent as JSONL.
///
/// True only for `.json` names (any case) uploaded for fine-tuning. The decision
/// never looks at the file content.
pub fn should_convert(filename: &str, purpose: Option<UploadPurpose>) -> bool {
    let is_json = filename.len() >= 5
        && filename
            .get(filename.len() - 5..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(".json"));

    is_json && purpose.is_some_and(UploadPurpose::requires_jsonl)
}

/// Opens `path` and converts its JSON array to a JSONL stream.
pub async fn convert(path: impl AsRef<Path>) -> OpenAIResult<JsonlStream> {
    let path = path.as_ref();
    let file = tokio::fs::File::open(path).await.map_err(|e| {
        OpenAIError::conversion(format!("failed to open {}: {}", path.display(), e))
    })?;

    convert_file(file.into_std().await).await
}

/// Converts an already opened file.
///
/// Resolves once the input is known to start with a JSON array; anything else
/// fails here rather than on the first read. Malformed elements further in
/// surface as an error item on the stream.
pub async fn convert_file(file: File) -> OpenAIResult<JsonlStream> {
    let (ready_tx, ready_rx) = oneshot::channel();
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

    tokio::task::spawn_blocking(move || run_worker(file, ready_tx, tx));

    match ready_rx.await {
        Ok(Ok(())) => Ok(JsonlStream { rx }),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(OpenAIError::conversion("conversion worker exited early")),
    }
}

/// Lazy JSONL output; one item per line, each ending in `\n`.
#[derive(Debug)]
pub struct JsonlStream {
    rx: mpsc::Receiver<OpenAIResult<Bytes>>,
}

impl Stream for JsonlStream {
    type Item = OpenAIResult<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

fn run_worker(
    file: File,
    ready: oneshot::Sender<OpenAIResult<()>>,
    tx: mpsc::Sender<OpenAIResult<Bytes>>,
) {
    let mut reader = BufReader::new(file);

    if let Err(e) = expect_array_start(&mut reader) {
        let _ = ready.send(Err(e));
        return;
    }
    if ready.send(Ok(())).is_err() {
        return;
    }

    match write_lines(reader, &tx) {
        Ok(lines) => tracing::debug!(lines, "converted json array to jsonl"),
        Err(_) if tx.is_closed() => tracing::debug!("jsonl consumer went away"),
        Err(e) => {
            tracing::debug!(error = %e, "jsonl conversion failed");
            let _ = tx.blocking_send(Err(e));
        }
    }
}

/// Skips leading whitespace and checks the next byte opens an array.
fn expect_array_start<R: BufRead>(reader: &mut R) -> OpenAIResult<()> {
    loop {
        let buf = reader
            .fill_buf()
            .map_err(|e| OpenAIError::conversion(format!("failed to read input: {}", e)))?;
        if buf.is_empty() {
            return Err(OpenAIError::conversion("input is empty"));
        }

        let skipped = buf.iter().take_while(|b| b.is_ascii_whitespace()).count();
        if skipped < buf.len() {
            let first = buf[skipped];
            reader.consume(skipped);
            return if first == b'[' {
                Ok(())
            } else {
                Err(OpenAIError::conversion("top-level value is not an array"))
            };
        }
        reader.consume(skipped);
    }
}

fn write_lines<R: std::io::Read>(
    reader: R,
    tx: &mpsc::Sender<OpenAIResult<Bytes>>,
) -> OpenAIResult<usize> {
    let mut de = serde_json::Deserializer::from_reader(reader);
    let lines = (&mut de)
        .deserialize_seq(LineVisitor { tx })
        .map_err(|e| OpenAIError::conversion(e.to_string()))?;
    de.end()
        .map_err(|e| OpenAIError::conversion(e.to_string()))?;
    Ok(lines)
}

struct LineVisitor<'a> {
    tx: &'a mpsc::Sender<OpenAIResult<Bytes>>,
}

impl<'de, 'a> Visitor<'de> for LineVisitor<'a> {
    type Value = usize;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON array of objects")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<usize, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut lines = 0;
        while let Some(record) = seq.next_element::<Map<String, Value>>()? {
            let mut line = serde_json::to_vec(&record).map_err(A::Error::custom)?;
            line.push(b'\n');

            if self.tx.blocking_send(Ok(Bytes::from(line))).is_err() {
                return Err(A::Error::custom(CONSUMER_GONE));
            }
            lines += 1;
        }
        Ok(lines)
    }
}
