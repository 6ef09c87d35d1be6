// ABOUTME: Connect protocol framing for the in-sandbox envd process service
// ABOUTME: Encodes process start requests and folds streamed process events into an ExecResult

use super::{ExecResult, ProviderError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const ENVD_PORT: u16 = 49983;
pub const DEFAULT_USER: &str = "user";
pub const PROCESS_START_PATH: &str = "/process.Process/Start";
pub const FILES_PATH: &str = "/files";
pub const CONNECT_CONTENT_TYPE: &str = "application/connect+json";
pub const CONNECT_PROTOCOL_VERSION: &str = "1";

const FLAG_COMPRESSED: u8 = 0x01;
const FLAG_END_STREAM: u8 = 0x02;
const HEADER_LEN: usize = 5;

/// Body of a `process.Process/Start` call
#[derive(Debug, Serialize)]
pub struct StartRequest<'a> {
    process: ProcessConfig<'a>,
    stdin: bool,
}

#[derive(Debug, Serialize)]
struct ProcessConfig<'a> {
    cmd: &'a str,
    args: Vec<&'a str>,
    envs: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cwd: Option<&'a str>,
}

impl<'a> StartRequest<'a> {
    /// Run `command` through a login shell, the way interactive users see the template
    pub fn shell(command: &'a str) -> Self {
        Self {
            process: ProcessConfig {
                cmd: "/bin/bash",
                args: vec!["-l", "-c", command],
                envs: HashMap::new(),
                cwd: None,
            },
            stdin: false,
        }
    }
}

/// One enveloped Connect message
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame<'a> {
    pub flags: u8,
    pub payload: &'a [u8],
}

impl Frame<'_> {
    pub fn is_end_stream(&self) -> bool {
        self.flags & FLAG_END_STREAM != 0
    }
}

#[derive(Debug, Deserialize)]
struct StartResponse {
    event: Option<ProcessEvent>,
}

#[derive(Debug, Deserialize)]
struct ProcessEvent {
    data: Option<DataEvent>,
    end: Option<EndEvent>,
}

#[derive(Debug, Deserialize)]
struct DataEvent {
    stdout: Option<String>,
    stderr: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EndEvent {
    // proto3 JSON omits zero values, so a clean exit has no exitCode field
    #[serde(default)]
    exit_code: i64,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct EndOfStream {
    error: Option<ConnectError>,
}

#[derive(Debug, Deserialize)]
struct ConnectError {
    code: String,
    message: Option<String>,
}

/// Wrap a JSON message in a Connect envelope
pub fn encode_envelope<T: Serialize>(message: &T) -> Result<Vec<u8>> {
    encode_frame(0, message)
}

fn encode_frame<T: Serialize>(flags: u8, message: &T) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(message).map_err(|e| ProviderError::Protocol(e.to_string()))?;
    let len = u32::try_from(json.len())
        .map_err(|_| ProviderError::Protocol("message too large for envelope".to_string()))?;

    let mut frame = Vec::with_capacity(HEADER_LEN + json.len());
    frame.push(flags);
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(&json);
    Ok(frame)
}

/// Split a response body into its enveloped frames
pub fn decode_frames(body: &[u8]) -> Result<Vec<Frame<'_>>> {
    let mut frames = Vec::new();
    let mut rest = body;

    while !rest.is_empty() {
        if rest.len() < HEADER_LEN {
            return Err(ProviderError::Protocol(format!(
                "truncated envelope header ({} bytes)",
                rest.len()
            )));
        }

        let flags = rest[0];
        let len = u32::from_be_bytes([rest[1], rest[2], rest[3], rest[4]]) as usize;
        if flags & FLAG_COMPRESSED != 0 {
            return Err(ProviderError::Protocol(
                "compressed envelopes are not supported".to_string(),
            ));
        }
        if rest.len() < HEADER_LEN + len {
            return Err(ProviderError::Protocol(format!(
                "truncated envelope: expected {} bytes, got {}",
                len,
                rest.len() - HEADER_LEN
            )));
        }

        frames.push(Frame {
            flags,
            payload: &rest[HEADER_LEN..HEADER_LEN + len],
        });
        rest = &rest[HEADER_LEN + len..];
    }

    Ok(frames)
}

/// Fold a complete `process.Process/Start` response stream into one result
pub fn collect_exec_result(body: &[u8]) -> Result<ExecResult> {
    let mut result = ExecResult::default();
    let mut ended = false;

    for frame in decode_frames(body)? {
        if frame.is_end_stream() {
            let trailer: EndOfStream = if frame.payload.is_empty() {
                EndOfStream::default()
            } else {
                serde_json::from_slice(frame.payload)
                    .map_err(|e| ProviderError::Protocol(e.to_string()))?
            };
            if let Some(error) = trailer.error {
                return Err(ProviderError::Protocol(format!(
                    "{}: {}",
                    error.code,
                    error.message.unwrap_or_default()
                )));
            }
            continue;
        }

        let message: StartResponse = serde_json::from_slice(frame.payload)
            .map_err(|e| ProviderError::Protocol(e.to_string()))?;
        let Some(event) = message.event else {
            continue;
        };

        if let Some(data) = event.data {
            if let Some(chunk) = data.stdout {
                result.stdout.extend(decode_bytes(&chunk)?);
            }
            if let Some(chunk) = data.stderr {
                result.stderr.extend(decode_bytes(&chunk)?);
            }
        }

        if let Some(end) = event.end {
            result.exit_code = end.exit_code;
            if let Some(error) = end.error.filter(|e| !e.is_empty()) {
                if result.stderr.is_empty() {
                    result.stderr.extend_from_slice(error.as_bytes());
                }
            }
            ended = true;
        }
    }

    if !ended {
        return Err(ProviderError::Protocol(
            "process stream closed without an end event".to_string(),
        ));
    }

    Ok(result)
}

fn decode_bytes(chunk: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(chunk)
        .map_err(|e| ProviderError::Protocol(format!("invalid base64 in process output: {}", e)))
}

/// `Authorization` header value selecting the sandbox user
pub fn basic_auth(user: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:", user)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn end_stream_frame(payload: serde_json::Value) -> Vec<u8> {
        encode_frame(FLAG_END_STREAM, &payload).unwrap()
    }

    pub(crate) fn stdout_frame(text: &str) -> Vec<u8> {
        encode_envelope(&json!({"event": {"data": {"stdout": STANDARD.encode(text)}}})).unwrap()
    }

    pub(crate) fn stderr_frame(text: &str) -> Vec<u8> {
        encode_envelope(&json!({"event": {"data": {"stderr": STANDARD.encode(text)}}})).unwrap()
    }

    pub(crate) fn end_frame(exit_code: i64) -> Vec<u8> {
        let end = if exit_code == 0 {
            json!({"exited": true, "status": "exit status 0"})
        } else {
            json!({"exitCode": exit_code, "exited": true, "status": format!("exit status {}", exit_code)})
        };
        encode_envelope(&json!({"event": {"end": end}})).unwrap()
    }

    #[test]
    fn test_shell_request_shape() {
        let value = serde_json::to_value(StartRequest::shell("codex --version")).unwrap();
        assert_eq!(value["process"]["cmd"], "/bin/bash");
        assert_eq!(value["process"]["args"], json!(["-l", "-c", "codex --version"]));
        assert!(value["process"].get("cwd").is_none());
        assert_eq!(value["stdin"], false);
    }

    #[test]
    fn test_envelope_header() {
        let frame = encode_envelope(&json!({"a": 1})).unwrap();
        assert_eq!(frame[0], 0);
        assert_eq!(u32::from_be_bytes([frame[1], frame[2], frame[3], frame[4]]), 7);
        assert_eq!(&frame[5..], br#"{"a":1}"#);
    }

    #[test]
    fn test_collect_concatenates_output() {
        let mut body = encode_envelope(&json!({"event": {"start": {"pid": 42}}})).unwrap();
        body.extend(stdout_frame("v22."));
        body.extend(stdout_frame("11.0\n"));
        body.extend(stderr_frame("warning\n"));
        body.extend(encode_envelope(&json!({"event": {"keepalive": {}}})).unwrap());
        body.extend(end_frame(0));
        body.extend(end_stream_frame(json!({})));

        let result = collect_exec_result(&body).unwrap();
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout_lossy(), "v22.11.0\n");
        assert_eq!(result.stderr_lossy(), "warning\n");
    }

    #[test]
    fn test_collect_reports_nonzero_exit() {
        let mut body = stderr_frame("bash: node: command not found\n");
        body.extend(end_frame(127));

        let result = collect_exec_result(&body).unwrap();
        assert_eq!(result.exit_code, 127);
        assert!(!result.success());
    }

    #[test]
    fn test_end_error_fills_empty_stderr() {
        let body = encode_envelope(&json!({
            "event": {"end": {"exitCode": -1, "exited": false, "error": "signal: killed"}}
        }))
        .unwrap();

        let result = collect_exec_result(&body).unwrap();
        assert_eq!(result.exit_code, -1);
        assert_eq!(result.stderr_lossy(), "signal: killed");
    }

    #[test]
    fn test_trailer_error_is_protocol_error() {
        let body = end_stream_frame(json!({
            "error": {"code": "unavailable", "message": "sandbox not reachable"}
        }));

        let err = collect_exec_result(&body).unwrap_err();
        assert!(matches!(err, ProviderError::Protocol(_)));
        assert!(err.to_string().contains("unavailable: sandbox not reachable"));
    }

    #[test]
    fn test_missing_end_event_is_error() {
        let body = stdout_frame("partial");
        assert!(matches!(
            collect_exec_result(&body),
            Err(ProviderError::Protocol(_))
        ));
    }

    #[test]
    fn test_truncated_frame_is_error() {
        let mut body = stdout_frame("hello");
        body.truncate(body.len() - 2);
        assert!(decode_frames(&body).is_err());
        assert!(decode_frames(&[0, 0, 0]).is_err());
    }

    #[test]
    fn test_compressed_frame_rejected() {
        let mut body = stdout_frame("hello");
        body[0] = FLAG_COMPRESSED;
        assert!(decode_frames(&body).is_err());
    }

    #[test]
    fn test_basic_auth_user() {
        // base64("user:")
        assert_eq!(basic_auth("user"), "Basic dXNlcjo=");
    }
}
