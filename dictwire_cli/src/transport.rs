//! Wire protocol for the listing service.
//!
//! One request, one response, then the connection closes. The response
//! payload is the JSON listing, passed through the compressor the request
//! named (empty name means identity). An xxh3 checksum over the payload
//! catches transport corruption before the bytes reach a decoder.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use xxhash_rust::xxh3::xxh3_64;

use crate::listing::{list_dir, sanitize_request_path};

pub const REQUEST_MAGIC: [u8; 4] = *b"DWQ1";
pub const RESPONSE_MAGIC: [u8; 4] = *b"DWS1";

/// Response payloads larger than this are refused on both ends of the wire.
const MAX_PAYLOAD: u32 = 64 << 20;

// ── frames ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Registered compressor name, or empty for an uncompressed response.
    pub encoding: String,
    /// Path relative to the served root.
    pub path: String,
    /// Requested recursion depth; the server may clamp it.
    pub depth: u32,
}

impl Request {
    pub fn write_to<W: Write>(&self, w: &mut W) -> anyhow::Result<()> {
        if self.encoding.len() > u8::MAX as usize {
            anyhow::bail!("encoding name longer than 255 bytes");
        }
        if self.path.len() > u16::MAX as usize {
            anyhow::bail!("request path longer than 65535 bytes");
        }
        w.write_all(&REQUEST_MAGIC)?;
        w.write_all(&[self.encoding.len() as u8])?;
        w.write_all(self.encoding.as_bytes())?;
        w.write_all(&(self.path.len() as u16).to_le_bytes())?;
        w.write_all(self.path.as_bytes())?;
        w.write_all(&self.depth.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> anyhow::Result<Self> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if magic != REQUEST_MAGIC {
            anyhow::bail!("bad request magic {:02x?}", magic);
        }
        let mut len = [0u8; 1];
        r.read_exact(&mut len)?;
        let encoding = read_string(r, len[0] as usize)?;
        let mut len = [0u8; 2];
        r.read_exact(&mut len)?;
        let path = read_string(r, u16::from_le_bytes(len) as usize)?;
        let mut depth = [0u8; 4];
        r.read_exact(&mut depth)?;
        Ok(Self {
            encoding,
            path,
            depth: u32::from_le_bytes(depth),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Status {
    Ok,
    /// The server has no compressor registered under the requested name.
    Unsupported,
    Error,
}

impl Status {
    fn to_byte(self) -> u8 {
        match self {
            Status::Ok => 0,
            Status::Unsupported => 1,
            Status::Error => 2,
        }
    }

    fn from_byte(byte: u8) -> anyhow::Result<Self> {
        match byte {
            0 => Ok(Status::Ok),
            1 => Ok(Status::Unsupported),
            2 => Ok(Status::Error),
            other => anyhow::bail!("bad response status {other}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: Status,
    /// Listing bytes on `Ok`, a human-readable message otherwise.
    pub payload: Vec<u8>,
}

impl Response {
    pub fn ok(payload: Vec<u8>) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    pub fn unsupported(encoding: &str) -> Self {
        Self {
            status: Status::Unsupported,
            payload: format!("no compressor registered as '{encoding}'").into_bytes(),
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            payload: message.as_bytes().to_vec(),
        }
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> anyhow::Result<()> {
        if self.payload.len() > MAX_PAYLOAD as usize {
            anyhow::bail!(
                "response payload of {} bytes exceeds limit",
                self.payload.len()
            );
        }
        w.write_all(&RESPONSE_MAGIC)?;
        w.write_all(&[self.status.to_byte()])?;
        w.write_all(&(self.payload.len() as u32).to_le_bytes())?;
        w.write_all(&xxh3_64(&self.payload).to_le_bytes())?;
        w.write_all(&self.payload)?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> anyhow::Result<Self> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if magic != RESPONSE_MAGIC {
            anyhow::bail!("bad response magic {:02x?}", magic);
        }
        let mut status = [0u8; 1];
        r.read_exact(&mut status)?;
        let status = Status::from_byte(status[0])?;
        let mut len = [0u8; 4];
        r.read_exact(&mut len)?;
        let len = u32::from_le_bytes(len);
        if len > MAX_PAYLOAD {
            anyhow::bail!("response payload of {len} bytes exceeds limit");
        }
        let mut checksum = [0u8; 8];
        r.read_exact(&mut checksum)?;
        let checksum = u64::from_le_bytes(checksum);
        let mut payload = vec![0u8; len as usize];
        r.read_exact(&mut payload)?;
        if xxh3_64(&payload) != checksum {
            anyhow::bail!("response payload failed checksum");
        }
        Ok(Self { status, payload })
    }
}

fn read_string<R: Read>(r: &mut R, len: usize) -> anyhow::Result<String> {
    let mut bytes = vec![0u8; len];
    r.read_exact(&mut bytes)?;
    String::from_utf8(bytes).context("frame field is not UTF-8")
}

// ── server ──────────────────────────────────────────────────────────────────

pub struct ServerConfig {
    /// Directory all request paths resolve under.
    pub root: PathBuf,
    /// Upper bound on recursion depth regardless of what requests ask for.
    pub max_depth: u32,
}

/// Accept loop, one thread per connection. Runs until the listener fails.
pub fn serve(listener: TcpListener, config: ServerConfig) -> anyhow::Result<()> {
    let config = Arc::new(config);
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(_) => continue,
        };
        let config = Arc::clone(&config);
        std::thread::spawn(move || {
            if let Err(e) = handle(stream, &config) {
                eprintln!("connection error: {e:#}");
            }
        });
    }
    Ok(())
}

fn handle(mut stream: TcpStream, config: &ServerConfig) -> anyhow::Result<()> {
    let request = Request::read_from(&mut stream)?;
    respond(&request, config).write_to(&mut stream)
}

fn respond(request: &Request, config: &ServerConfig) -> Response {
    let compressor = if request.encoding.is_empty() {
        None
    } else {
        match dictwire_core::lookup(&request.encoding) {
            Some(compressor) => Some(compressor),
            None => return Response::unsupported(&request.encoding),
        }
    };

    let json = sanitize_request_path(&request.path)
        .and_then(|rel| list_dir(&config.root.join(rel), request.depth.min(config.max_depth)))
        .and_then(|listing| serde_json::to_vec(&listing).map_err(Into::into));
    let json = match json {
        Ok(json) => json,
        Err(e) => return Response::error(&format!("{e:#}")),
    };

    match compressor {
        None => Response::ok(json),
        Some(compressor) => match compressor.compress(&json) {
            Ok(payload) => Response::ok(payload),
            Err(e) => Response::error(&format!("compress: {e}")),
        },
    }
}

// ── client ──────────────────────────────────────────────────────────────────

/// Send one request and return the decoded listing bytes.
///
/// Decoding uses the client's own registry, so a `zstd-dict` response needs
/// the same dictionary registered on both ends.
pub fn fetch(addr: &str, request: &Request) -> anyhow::Result<Vec<u8>> {
    let mut stream =
        TcpStream::connect(addr).with_context(|| format!("connecting to {addr}"))?;
    request.write_to(&mut stream)?;
    let response = Response::read_from(&mut stream)?;
    match response.status {
        Status::Ok => {}
        Status::Unsupported | Status::Error => anyhow::bail!(
            "server refused request: {}",
            String::from_utf8_lossy(&response.payload)
        ),
    }
    if request.encoding.is_empty() {
        return Ok(response.payload);
    }
    let compressor = dictwire_core::lookup_required(&request.encoding)
        .context("decoding the response locally")?;
    Ok(compressor.decompress(&response.payload)?)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use dictwire_core::{register_default_codecs, train, TrainOptions};

    use super::*;
    use crate::listing::ListResponse;

    #[test]
    fn request_frame_round_trips() {
        let request = Request {
            encoding: "zstd-dict".to_string(),
            path: "logs/2026".to_string(),
            depth: 3,
        };
        let mut wire = Vec::new();
        request.write_to(&mut wire).unwrap();
        let back = Request::read_from(&mut Cursor::new(wire)).unwrap();
        assert_eq!(back, request);
    }

    #[test]
    fn response_frame_round_trips() {
        let response = Response::ok(b"{\"root\":\"/srv\",\"entries\":[]}".to_vec());
        let mut wire = Vec::new();
        response.write_to(&mut wire).unwrap();
        let back = Response::read_from(&mut Cursor::new(wire)).unwrap();
        assert_eq!(back, response);
    }

    #[test]
    fn corrupted_payload_fails_the_checksum() {
        let response = Response::ok(b"listing bytes".to_vec());
        let mut wire = Vec::new();
        response.write_to(&mut wire).unwrap();
        let last = wire.len() - 1;
        wire[last] ^= 0xff;
        let err = Response::read_from(&mut Cursor::new(wire)).unwrap_err();
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn oversized_payload_is_refused_on_write() {
        let response = Response::ok(vec![0u8; MAX_PAYLOAD as usize + 1]);
        let err = response.write_to(&mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("exceeds limit"));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let err = Request::read_from(&mut Cursor::new(b"NOPE".to_vec())).unwrap_err();
        assert!(err.to_string().contains("magic"));
    }

    fn scratch_tree(name: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!("dictwire_transport_{name}"));
        let _ = std::fs::remove_dir_all(&root);
        std::fs::create_dir_all(root.join("logs")).unwrap();
        std::fs::write(root.join("readme.txt"), b"hello").unwrap();
        std::fs::write(root.join("logs/app.log"), vec![b'x'; 2048]).unwrap();
        root
    }

    fn spawn_server(root: PathBuf) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        std::thread::spawn(move || {
            let _ = serve(listener, ServerConfig { root, max_depth: 4 });
        });
        addr
    }

    #[test]
    fn loopback_identity_listing() {
        let root = scratch_tree("identity");
        let addr = spawn_server(root.clone());
        let bytes = fetch(
            &addr,
            &Request {
                encoding: String::new(),
                path: String::new(),
                depth: 4,
            },
        )
        .unwrap();
        let listing: ListResponse = serde_json::from_slice(&bytes).unwrap();
        let paths: Vec<&str> = listing.entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["logs", "logs/app.log", "readme.txt"]);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn loopback_compressed_listing_with_dictionary() {
        // Server and client share the process-global registry here; in a
        // real deployment both ends register the same dictionary.
        let corpus = dictwire_analysis::file_listings(100, 8);
        let dict = train(corpus.samples(), &TrainOptions::default()).unwrap();
        register_default_codecs(Some(dict)).unwrap();

        let root = scratch_tree("dict");
        let addr = spawn_server(root.clone());
        let bytes = fetch(
            &addr,
            &Request {
                encoding: "zstd-dict".to_string(),
                path: "logs".to_string(),
                depth: 1,
            },
        )
        .unwrap();
        let listing: ListResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(listing.entries.len(), 1);
        assert_eq!(listing.entries[0].path, "app.log");
        assert_eq!(listing.entries[0].size, 2048);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn unknown_encoding_is_refused() {
        let root = scratch_tree("unknown");
        let addr = spawn_server(root.clone());
        let err = fetch(
            &addr,
            &Request {
                encoding: "brotli-nope".to_string(),
                path: String::new(),
                depth: 1,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("brotli-nope"));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn escaping_path_is_refused() {
        let root = scratch_tree("escape");
        let addr = spawn_server(root.clone());
        let err = fetch(
            &addr,
            &Request {
                encoding: String::new(),
                path: "../..".to_string(),
                depth: 1,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("escapes"));
        let _ = std::fs::remove_dir_all(&root);
    }
}
