use std::path::{Path, PathBuf};

/// Fire-and-forget sound output.
pub trait VoiceSink {
    fn play(&mut self, cue: &str);
}

/// Asset file for `cue` under `root`, if it's there.
fn cue_path(root: &Path, cue: &str) -> Option<PathBuf> {
    let path = root.join(cue);
    path.is_file().then_some(path)
}

/// Sink that only reports cues to the log at the configured volume. Used
/// when no audio device can be opened.
pub struct LogVoice {
    root: PathBuf,
    volume: f32,
    played: u64,
}

impl LogVoice {
    pub fn new(root: PathBuf, volume: f32) -> Self {
        Self {
            root,
            volume: volume.clamp(0.0, 1.0),
            played: 0,
        }
    }
}

impl VoiceSink for LogVoice {
    fn play(&mut self, cue: &str) {
        self.played += 1;
        if self.volume <= 0.0 {
            return;
        }
        match cue_path(&self.root, cue) {
            Some(path) => log::debug!(
                "voice cue #{} {} @ volume {:.2}",
                self.played,
                path.display(),
                self.volume
            ),
            None => log::debug!("voice cue #{} {cue} (no asset)", self.played),
        }
    }
}

#[cfg(any(windows, target_os = "macos"))]
pub use self::device::RodioVoice;

#[cfg(any(windows, target_os = "macos"))]
mod device {
    use std::fs::File;
    use std::io::BufReader;
    use std::path::PathBuf;

    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

    use super::{cue_path, VoiceSink};
    use crate::error::BuddyError;

    /// Plays cues on the default output device.
    pub struct RodioVoice {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        root: PathBuf,
        volume: f32,
    }

    impl RodioVoice {
        pub fn open(root: PathBuf, volume: f32) -> Result<Self, BuddyError> {
            let (stream, handle) =
                OutputStream::try_default().map_err(|e| BuddyError::Audio(e.to_string()))?;
            Ok(Self {
                _stream: stream,
                handle,
                root,
                volume: volume.clamp(0.0, 1.0),
            })
        }
    }

    impl VoiceSink for RodioVoice {
        fn play(&mut self, cue: &str) {
            if self.volume <= 0.0 {
                return;
            }
            let Some(path) = cue_path(&self.root, cue) else {
                log::debug!("No asset for voice cue {cue}");
                return;
            };
            let decoder = match File::open(&path).map(BufReader::new).map(Decoder::new) {
                Ok(Ok(d)) => d,
                Ok(Err(e)) => {
                    log::warn!("Failed to decode {}: {e}", path.display());
                    return;
                }
                Err(e) => {
                    log::warn!("Failed to open {}: {e}", path.display());
                    return;
                }
            };
            let sink = match Sink::try_new(&self.handle) {
                Ok(s) => s,
                Err(e) => {
                    log::warn!("Audio sink unavailable: {e}");
                    return;
                }
            };
            sink.set_volume(self.volume);
            sink.append(decoder);
            sink.detach();
        }
    }
}

/// The best sink this machine offers.
pub fn open_default(root: PathBuf, volume: f32) -> Box<dyn VoiceSink> {
    #[cfg(any(windows, target_os = "macos"))]
    {
        match RodioVoice::open(root.clone(), volume) {
            Ok(voice) => {
                log::info!("Audio output opened");
                return Box::new(voice);
            }
            Err(e) => log::warn!("{e}, voice cues will only be logged"),
        }
    }
    Box::new(LogVoice::new(root, volume))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset_root(name: &str) -> PathBuf {
        let mut root = std::env::temp_dir();
        root.push(format!(
            "deskbuddy_voice_test_{}_{}",
            name,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(root.join("sfx")).unwrap();
        root
    }

    #[test]
    fn counts_cues_and_clamps_volume() {
        let mut voice = LogVoice::new(PathBuf::from("."), 3.0);
        assert_eq!(voice.volume, 1.0);
        voice.play("sfx/talk1.ogg");
        voice.play("sfx/talk2.ogg");
        assert_eq!(voice.played, 2);
    }

    #[test]
    fn cues_resolve_under_the_asset_root() {
        let root = asset_root("resolve");
        std::fs::write(root.join("sfx/talk3.ogg"), b"OggS").unwrap();

        assert_eq!(
            cue_path(&root, "sfx/talk3.ogg"),
            Some(root.join("sfx/talk3.ogg"))
        );
        assert_eq!(cue_path(&root, "sfx/talk4.ogg"), None);
        // Directories are not sounds.
        assert_eq!(cue_path(&root, "sfx"), None);

        let _ = std::fs::remove_dir_all(&root);
    }
}
