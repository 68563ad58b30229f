use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use rand::RngCore;
use std::collections::HashMap;

use crate::errors::{OpenAIError, OpenAIResult};
use crate::transport::ByteStream;

/// Form field that carries the uploaded file.
pub const FILE_FIELD: &str = "file";

/// Writer for multipart/form-data bodies.
///
/// Parts are appended to an in-memory buffer. The only way to get the body out is
/// [`MultipartWriter::close`], which writes the terminating boundary, so an
/// unterminated body can never reach the transport.
pub struct MultipartWriter {
    boundary: String,
    buf: BytesMut,
    parts: usize,
}

impl MultipartWriter {
    /// Creates a writer with a random boundary.
    pub fn new() -> Self {
        let mut raw = [0u8; 30];
        rand::thread_rng().fill_bytes(&mut raw);
        let boundary = raw.iter().map(|b| format!("{:02x}", b)).collect();

        Self {
            boundary,
            buf: BytesMut::new(),
            parts: 0,
        }
    }

    /// Creates a writer with a fixed boundary (RFC 2046: 1 to 70 safe characters).
    pub fn with_boundary(boundary: impl Into<String>) -> OpenAIResult<Self> {
        let boundary = boundary.into();
        let valid = !boundary.is_empty()
            && boundary.len() <= 70
            && !boundary.ends_with(' ')
            && boundary
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b"'()+_,-./:=? ".contains(&b));
        if !valid {
            return Err(OpenAIError::encoding(format!(
                "invalid multipart boundary {:?}",
                boundary
            )));
        }

        Ok(Self {
            boundary,
            buf: BytesMut::new(),
            parts: 0,
        })
    }

    /// The boundary separating parts.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the request's Content-Type header.
    pub fn content_type(&self) -> String {
        format!("{}; boundary={}", mime::MULTIPART_FORM_DATA, self.boundary)
    }

    /// Starts a file part; following [`write`](Self::write) calls fill it.
    pub fn create_form_file(&mut self, field: &str, filename: &str) -> OpenAIResult<()> {
        let disposition = format!(
            "form-data; name=\"{}\"; filename=\"{}\"",
            escape_quotes(field)?,
            escape_quotes(filename)?
        );
        self.begin_part(&disposition, Some(mime::APPLICATION_OCTET_STREAM.as_ref()));
        Ok(())
    }

    /// Appends bytes to the current part.
    pub fn write(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Writes a complete text field.
    pub fn write_field(&mut self, name: &str, value: &str) -> OpenAIResult<()> {
        let disposition = format!("form-data; name=\"{}\"", escape_quotes(name)?);
        self.begin_part(&disposition, None);
        self.buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    /// Writes the closing boundary and returns the finished body.
    pub fn close(mut self) -> MultipartBody {
        if self.parts > 0 {
            self.buf.extend_from_slice(b"\r\n");
        }
        self.buf.extend_from_slice(b"--");
        self.buf.extend_from_slice(self.boundary.as_bytes());
        self.buf.extend_from_slice(b"--\r\n");

        MultipartBody {
            content_type: self.content_type(),
            boundary: self.boundary,
            body: self.buf.freeze(),
        }
    }

    fn begin_part(&mut self, disposition: &str, content_type: Option<&str>) {
        if self.parts > 0 {
            self.buf.extend_from_slice(b"\r\n");
        }
        self.parts += 1;

        self.buf.extend_from_slice(b"--");
        self.buf.extend_from_slice(self.boundary.as_bytes());
        self.buf.extend_from_slice(b"\r\n");

        self.buf.extend_from_slice(b"Content-Disposition: ");
        self.buf.extend_from_slice(disposition.as_bytes());
        self.buf.extend_from_slice(b"\r\n");

        if let Some(content_type) = content_type {
            self.buf.extend_from_slice(b"Content-Type: ");
            self.buf.extend_from_slice(content_type.as_bytes());
            self.buf.extend_from_slice(b"\r\n");
        }

        self.buf.extend_from_slice(b"\r\n");
    }
}

impl Default for MultipartWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Quotes `\` and `"` for a Content-Disposition parameter; CR and LF cannot be encoded.
fn escape_quotes(value: &str) -> OpenAIResult<String> {
    if value.contains(|c: char| c == '\r' || c == '\n') {
        return Err(OpenAIError::encoding(format!(
            "multipart parameter {:?} contains a line break",
            value
        )));
    }
    Ok(value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// A terminated multipart/form-data body.
#[derive(Clone)]
pub struct MultipartBody {
    boundary: String,
    content_type: String,
    body: Bytes,
}

impl MultipartBody {
    /// The boundary separating parts.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the request's Content-Type header.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The encoded body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consumes the form, returning the encoded body.
    pub fn into_bytes(self) -> Bytes {
        self.body
    }
}

impl std::fmt::Debug for MultipartBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultipartBody")
            .field("boundary", &self.boundary)
            .field("len", &self.body.len())
            .finish()
    }
}

/// Encodes a file upload form: one `file` part plus flat string fields.
pub struct MultipartEncoder;

impl MultipartEncoder {
    /// Copies `file` verbatim into a part named `file`, then writes every entry of
    /// `fields` except the reserved `file` key. The source stream is dropped before
    /// this returns.
    pub async fn encode(
        file: ByteStream,
        filename: &str,
        fields: &HashMap<String, String>,
    ) -> OpenAIResult<MultipartBody> {
        Self::encode_with(MultipartWriter::new(), file, filename, fields).await
    }

    /// Same as [`encode`](Self::encode) with a caller-supplied writer.
    pub async fn encode_with(
        mut writer: MultipartWriter,
        mut file: ByteStream,
        filename: &str,
        fields: &HashMap<String, String>,
    ) -> OpenAIResult<MultipartBody> {
        writer.create_form_file(FILE_FIELD, filename)?;

        let mut copied = 0usize;
        while let Some(chunk) = file.next().await {
            let chunk = chunk?;
            copied += chunk.len();
            writer.write(&chunk);
        }
        drop(file);

        for (name, value) in fields {
            if name == FILE_FIELD {
                continue;
            }
            writer.write_field(name, value).map_err(|e| match e {
                OpenAIError::Encoding { message } => OpenAIError::encoding(format!(
                    "failed to write field {:?}: {}",
                    name, message
                )),
                other => other,
            })?;
        }

        tracing::debug!(
            filename = filename,
            file_bytes = copied,
            fields = fields.len(),
            "encoded multipart form"
        );

        Ok(writer.close())
    }
}

/// One decoded part, for assertions in tests.
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct DecodedPart {
    pub name: String,
    pub filename: Option<String>,
    pub data: Vec<u8>,
}

/// Splits a body produced by [`MultipartWriter`] back into parts.
#[cfg(test)]
pub(crate) fn decode(boundary: &str, body: &[u8]) -> Vec<DecodedPart> {
    let text = String::from_utf8_lossy(body).into_owned();
    let delimiter = format!("--{}", boundary);
    let mut parts = Vec::new();

    for section in text.split(&delimiter).skip(1) {
        if section.starts_with("--") {
            break;
        }
        let section = section.trim_start_matches("\r\n");
        let (head, data) = section.split_once("\r\n\r\n").unwrap_or((section, ""));
        let data = data.strip_suffix("\r\n").unwrap_or(data);

        let disposition = head
            .lines()
            .find(|l| l.starts_with("Content-Disposition:"))
            .unwrap_or_default();
        let param = |key: &str| {
            let marker = format!("{}=\"", key);
            disposition.find(&marker).map(|start| {
                let rest = &disposition[start + marker.len()..];
                rest[..rest.find('"').unwrap_or(rest.len())].to_string()
            })
        };

        parts.push(DecodedPart {
            name: param(" name").unwrap_or_default(),
            filename: param("filename"),
            data: data.as_bytes().to_vec(),
        });
    }

    parts
}
