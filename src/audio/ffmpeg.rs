//! External fallback decoding through an `ffmpeg` subprocess.
//!
//! Inputs that symphonia rejects (exotic codec profiles, damaged headers)
//! often still play through ffmpeg. The subprocess receives the original
//! bytes on stdin and emits mono 32-bit float PCM at the target rate on
//! stdout, so the result needs no further downmix or resampling.

use crate::audio::decode::{Decoder, RawAudio};
use crate::constants::fallback;
use crate::error::{Error, Result};
use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::debug;

/// Decoder that shells out to an external transcoder.
#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    command: String,
    timeout: Duration,
    sample_rate: u32,
}

impl FfmpegDecoder {
    /// Create a fallback decoder invoking `command` with the given
    /// wall-clock budget, emitting PCM at `sample_rate`.
    pub fn new(command: String, timeout: Duration, sample_rate: u32) -> Self {
        Self {
            command,
            timeout,
            sample_rate,
        }
    }
}

impl Decoder for FfmpegDecoder {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn decode(&self, bytes: &[u8], _hint: Option<&str>) -> Result<RawAudio> {
        let mut child = Command::new(&self.command)
            .args([
                "-hide_banner",
                "-loglevel",
                "error",
                "-i",
                "pipe:0",
                "-f",
                "f32le",
                "-acodec",
                "pcm_f32le",
                "-ac",
                "1",
                "-ar",
                &self.sample_rate.to_string(),
                "pipe:1",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::AudioDecode {
                decoder: "ffmpeg",
                source: Box::new(e),
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| Error::Internal {
            message: "fallback decoder stdin unavailable".to_string(),
        })?;
        let mut stdout = child.stdout.take().ok_or_else(|| Error::Internal {
            message: "fallback decoder stdout unavailable".to_string(),
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| Error::Internal {
            message: "fallback decoder stderr unavailable".to_string(),
        })?;

        // Feed input from a separate thread; dropping stdin at thread exit
        // closes the pipe and signals EOF. A write failure here means the
        // child died early, which the exit status will report.
        let input = bytes.to_vec();
        let writer = std::thread::spawn(move || {
            let _ = stdin.write_all(&input);
        });

        let stdout_reader = std::thread::spawn(move || -> std::io::Result<Vec<u8>> {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf)?;
            Ok(buf)
        });
        let stderr_reader = std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        });

        // Poll for exit with a hard deadline; kill on overrun so a corrupt
        // stream can never wedge the worker.
        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait()? {
                Some(status) => break status,
                None => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(Error::DecodeTimeout {
                            command: self.command.clone(),
                            timeout_secs: self.timeout.as_secs(),
                        });
                    }
                    std::thread::sleep(Duration::from_millis(fallback::POLL_INTERVAL_MS));
                }
            }
        };

        let _ = writer.join();
        let pcm = stdout_reader
            .join()
            .map_err(|_| Error::Internal {
                message: "fallback decoder stdout reader panicked".to_string(),
            })??;
        let diagnostics = stderr_reader.join().unwrap_or_default();

        if !status.success() {
            return Err(Error::AudioDecode {
                decoder: "ffmpeg",
                source: format!("exit status {status}: {}", diagnostics.trim()).into(),
            });
        }

        debug!(
            bytes_in = bytes.len(),
            bytes_out = pcm.len(),
            "fallback decode succeeded"
        );

        let samples: Vec<f32> = pcm
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        if samples.is_empty() {
            return Err(Error::AudioDecode {
                decoder: "ffmpeg",
                source: "decoded zero samples".into(),
            });
        }

        Ok(RawAudio {
            channels: vec![samples],
            sample_rate: self.sample_rate,
            source: "ffmpeg",
        })
    }
}
