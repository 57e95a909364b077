//! Local device speech through the system speech engine.
//!
//! Tries `spd-say` (speech-dispatcher) first and `espeak-ng` second. The
//! engines run on a dedicated worker thread, so `narrate` and `cancel` only
//! queue a job and never wait on a child process.

use std::process::{Child, Command, Stdio};
use std::sync::{Arc, OnceLock};
use std::thread::JoinHandle;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use kidquiz_core::traits::{LocalNarrator, NarrationRequest, VoiceInfo};

use crate::error::ProviderError;

const SPD_SAY: &str = "spd-say";
const ESPEAK_NG: &str = "espeak-ng";
const ESPEAK_DEFAULT_WPM: f32 = 175.0;
const ESPEAK_DEFAULT_PITCH: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Engine {
    SpeechDispatcher,
    Espeak,
}

struct Speaking {
    engine: Engine,
    child: Child,
}

enum Job {
    Speak(NarrationRequest),
    Cancel,
}

/// The speech executables and the child currently talking.
struct Engines {
    spd_say: String,
    espeak: String,
    current: Option<Speaking>,
}

impl Engines {
    fn new(spd_say: &str, espeak: &str) -> Self {
        Self {
            spd_say: spd_say.to_string(),
            espeak: espeak.to_string(),
            current: None,
        }
    }

    fn command(&self, engine: Engine, request: &NarrationRequest) -> Command {
        let mut cmd = match engine {
            Engine::SpeechDispatcher => {
                let mut cmd = Command::new(&self.spd_say);
                cmd.arg("-l")
                    .arg(language_of(&request.locale))
                    .arg("-r")
                    .arg(spd_scale(request.rate).to_string())
                    .arg("-p")
                    .arg(spd_scale(request.pitch).to_string());
                if let Some(voice) = &request.voice {
                    cmd.arg("-y").arg(voice);
                }
                cmd
            }
            Engine::Espeak => {
                let mut cmd = Command::new(&self.espeak);
                let voice = request
                    .voice
                    .clone()
                    .unwrap_or_else(|| language_of(&request.locale).to_string());
                cmd.arg("-v")
                    .arg(voice)
                    .arg("-s")
                    .arg(espeak_wpm(request.rate).to_string())
                    .arg("-p")
                    .arg(espeak_pitch(request.pitch).to_string());
                cmd
            }
        };
        cmd.arg("--")
            .arg(&request.text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }

    fn speak(&mut self, request: &NarrationRequest) -> Result<(), ProviderError> {
        self.cancel();

        for engine in [Engine::SpeechDispatcher, Engine::Espeak] {
            match self.command(engine, request).spawn() {
                Ok(child) => {
                    debug!(?engine, chars = request.text.chars().count(), "local speech started");
                    self.current = Some(Speaking { engine, child });
                    return Ok(());
                }
                Err(e) => debug!(?engine, "speech command failed to start: {e}"),
            }
        }

        Err(ProviderError::CommandUnavailable {
            kind: "speech",
            tried: format!("{}, {}", self.spd_say, self.espeak),
        })
    }

    fn cancel(&mut self) {
        let Some(mut speaking) = self.current.take() else {
            return;
        };
        if let Err(e) = speaking.child.kill() {
            debug!("speech child already gone: {e}");
        }
        let _ = speaking.child.wait();

        // spd-say hands the text to a daemon, so killing the client is not enough.
        if speaking.engine == Engine::SpeechDispatcher {
            if let Err(e) = Command::new(&self.spd_say)
                .arg("-C")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
            {
                warn!("failed to cancel speech-dispatcher: {e}");
            }
        }
    }
}

fn list_voices(espeak: &str) -> Vec<VoiceInfo> {
    match Command::new(espeak).arg("--voices").output() {
        Ok(output) if output.status.success() => {
            parse_espeak_voices(&String::from_utf8_lossy(&output.stdout))
        }
        Ok(output) => {
            debug!(status = %output.status, "voice listing failed");
            Vec::new()
        }
        Err(e) => {
            debug!("voice listing unavailable: {e}");
            Vec::new()
        }
    }
}

fn run_worker(
    mut engines: Engines,
    voices: Arc<OnceLock<Vec<VoiceInfo>>>,
    mut jobs: UnboundedReceiver<Job>,
) {
    voices.get_or_init(|| list_voices(&engines.espeak));
    while let Some(job) = jobs.blocking_recv() {
        match job {
            Job::Speak(request) => {
                if let Err(e) = engines.speak(&request) {
                    warn!("local speech failed: {e}");
                }
            }
            Job::Cancel => engines.cancel(),
        }
    }
    engines.cancel();
}

/// Narrator backed by the system speech engine.
///
/// Voices are listed once, in the background, when the narrator is built.
pub struct SystemNarrator {
    espeak: String,
    voices: Arc<OnceLock<Vec<VoiceInfo>>>,
    jobs: Option<UnboundedSender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl Default for SystemNarrator {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemNarrator {
    pub fn new() -> Self {
        Self::with_commands(SPD_SAY, ESPEAK_NG)
    }

    /// Use other executables in place of `spd-say` and `espeak-ng`.
    pub fn with_commands(spd_say: &str, espeak: &str) -> Self {
        let voices = Arc::new(OnceLock::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let engines = Engines::new(spd_say, espeak);
        let worker_voices = Arc::clone(&voices);
        let worker = std::thread::Builder::new()
            .name("kidquiz-narrator".into())
            .spawn(move || run_worker(engines, worker_voices, rx))
            .map_err(|e| warn!("local speech worker failed to start: {e}"))
            .ok();

        Self {
            espeak: espeak.to_string(),
            voices,
            jobs: Some(tx),
            worker,
        }
    }

    fn submit(&self, job: Job) -> Result<(), ProviderError> {
        self.jobs
            .as_ref()
            .and_then(|jobs| jobs.send(job).ok())
            .ok_or_else(|| ProviderError::ProcessFailed("local speech worker is not running".into()))
    }
}

/// Primary language subtag of a locale: "vi-VN" → "vi".
fn language_of(locale: &str) -> &str {
    locale.split(['-', '_']).next().unwrap_or(locale)
}

/// speech-dispatcher takes rate and pitch in -100..=100 with 0 as normal.
fn spd_scale(factor: f32) -> i32 {
    ((factor - 1.0) * 100.0).round().clamp(-100.0, 100.0) as i32
}

fn espeak_wpm(rate: f32) -> u32 {
    (ESPEAK_DEFAULT_WPM * rate).round().clamp(80.0, 450.0) as u32
}

fn espeak_pitch(pitch: f32) -> u32 {
    (ESPEAK_DEFAULT_PITCH * pitch).round().clamp(0.0, 99.0) as u32
}

/// Parse the table printed by `espeak-ng --voices`.
pub fn parse_espeak_voices(output: &str) -> Vec<VoiceInfo> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let _priority = cols.next()?;
            let language = cols.next()?;
            let _age_gender = cols.next()?;
            let name = cols.next()?;
            Some(VoiceInfo {
                name: name.to_string(),
                language: language.to_string(),
            })
        })
        .collect()
}

impl LocalNarrator for SystemNarrator {
    fn name(&self) -> &str {
        "system"
    }

    fn voices(&self) -> Vec<VoiceInfo> {
        self.voices
            .get_or_init(|| list_voices(&self.espeak))
            .clone()
    }

    fn narrate(&self, request: &NarrationRequest) -> anyhow::Result<()> {
        self.submit(Job::Speak(request.clone()))?;
        Ok(())
    }

    fn cancel(&self) {
        if let Err(e) = self.submit(Job::Cancel) {
            debug!("cancel not queued: {e}");
        }
    }
}

impl Drop for SystemNarrator {
    fn drop(&mut self) {
        // Closing the queue makes the worker stop the current child and exit.
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("local speech worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOICES: &str = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 5  en-us           --/M      English_(America)  gmw/en-US            (en 3)
 5  vi              --/M      Vietnamese_Northern sit/vi
 5  vi-vn-x-south   --/M      Vietnamese_Southern sit/vi-VN-x-south
";

    fn request() -> NarrationRequest {
        NarrationRequest {
            text: "Xin chào".into(),
            locale: "vi-VN".into(),
            rate: 0.9,
            pitch: 1.0,
            voice: None,
        }
    }

    #[cfg(unix)]
    fn script(dir: &std::path::Path, name: &str, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn parses_voice_table() {
        let voices = parse_espeak_voices(VOICES);
        assert_eq!(voices.len(), 4);
        assert_eq!(voices[2].name, "Vietnamese_Northern");
        assert_eq!(voices[2].language, "vi");
        assert_eq!(voices[3].language, "vi-vn-x-south");
        assert!(parse_espeak_voices("").is_empty());
    }

    #[test]
    fn scales_rate_and_pitch() {
        assert_eq!(spd_scale(1.0), 0);
        assert_eq!(spd_scale(0.9), -10);
        assert_eq!(spd_scale(5.0), 100);
        assert_eq!(espeak_wpm(1.2), 210);
        assert_eq!(espeak_wpm(0.1), 80);
        assert_eq!(espeak_pitch(1.0), 50);
        assert_eq!(espeak_pitch(3.0), 99);
        assert_eq!(language_of("vi-VN"), "vi");
        assert_eq!(language_of("vi_VN"), "vi");
        assert_eq!(language_of("vi"), "vi");
    }

    #[test]
    fn builds_speech_dispatcher_command() {
        let engines = Engines::new(SPD_SAY, ESPEAK_NG);
        let mut req = request();
        req.voice = Some("female1".into());
        let cmd = engines.command(Engine::SpeechDispatcher, &req);
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(cmd.get_program(), SPD_SAY);
        assert_eq!(
            args,
            ["-l", "vi", "-r", "-10", "-p", "0", "-y", "female1", "--", "Xin chào"]
        );
    }

    #[test]
    fn espeak_falls_back_to_language() {
        let engines = Engines::new(SPD_SAY, ESPEAK_NG);
        let cmd = engines.command(Engine::Espeak, &request());
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args[..2], ["-v", "vi"]);
    }

    #[test]
    fn missing_engines_are_reported() {
        let mut engines = Engines::new("/nonexistent/spd-say", "/nonexistent/espeak-ng");
        let err = engines.speak(&request()).unwrap_err();
        assert!(err.to_string().contains("no speech command found"));

        let narrator =
            SystemNarrator::with_commands("/nonexistent/spd-say", "/nonexistent/espeak-ng");
        assert!(narrator.voices().is_empty());
        // Queued; the worker logs the failure.
        assert!(narrator.narrate(&request()).is_ok());
    }

    #[test]
    fn cancel_when_idle_is_safe() {
        let narrator = SystemNarrator::new();
        narrator.cancel();
        narrator.cancel();
    }

    #[cfg(unix)]
    #[test]
    fn voices_are_listed_once() {
        let dir = tempfile::tempdir().unwrap();
        let calls = dir.path().join("calls");
        let espeak = script(
            dir.path(),
            "espeak-ng",
            &format!(
                "echo x >> '{}'\nprintf 'Pty Language Age/Gender VoiceName File\\n 5 vi --/M Vietnamese sit/vi\\n'",
                calls.display()
            ),
        );
        let narrator = SystemNarrator::with_commands("/nonexistent/spd-say", &espeak);

        assert_eq!(narrator.voices().len(), 1);
        assert_eq!(narrator.voices()[0].language, "vi");
        drop(narrator);

        let listed = std::fs::read_to_string(&calls).unwrap();
        assert_eq!(listed.lines().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn speech_dispatcher_is_cleared_on_the_worker() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("spd.log");
        let spd_say = script(
            dir.path(),
            "spd-say",
            &format!(
                "echo \"$1\" >> '{}'\n[ \"$1\" = \"-C\" ] && exit 0\nexec sleep 5",
                log.display()
            ),
        );
        let narrator = SystemNarrator::with_commands(&spd_say, "/nonexistent/espeak-ng");

        narrator.narrate(&request()).unwrap();
        narrator.cancel();
        narrator.narrate(&request()).unwrap();
        // Drop waits for the worker to stop the second child.
        drop(narrator);

        let logged = std::fs::read_to_string(&log).unwrap();
        assert_eq!(logged.lines().filter(|l| *l == "-C").count(), 2);
    }
}
