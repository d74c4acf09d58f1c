//! Sound cues
//!
//! The core only says *which* cue to play; an [`AudioSink`] decides how.
//! Browser builds synthesize every cue with Web Audio oscillators, so no
//! sound files are fetched or decoded. Everything else gets a silent sink.

/// Sound cue types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// Player left the ground
    Jump,
    /// Coin, bone or key picked up
    Coin,
    /// Shield absorbed an obstacle
    Hit,
    /// Power-up activated
    PowerUp,
    /// Run ended
    GameOver,
    /// Store/cosmetic/pet purchase
    Purchase,
    /// Achievement, mission or quest completed
    Unlock,
    /// Menu interaction
    Click,
    /// Level, skill or pet level gained
    LevelUp,
    /// New best score
    HighScore,
}

impl SoundCue {
    pub fn name(&self) -> &'static str {
        match self {
            SoundCue::Jump => "jump",
            SoundCue::Coin => "coin",
            SoundCue::Hit => "hit",
            SoundCue::PowerUp => "powerup",
            SoundCue::GameOver => "gameOver",
            SoundCue::Purchase => "purchase",
            SoundCue::Unlock => "unlock",
            SoundCue::Click => "click",
            SoundCue::LevelUp => "levelUp",
            SoundCue::HighScore => "highScore",
        }
    }
}

/// Fire-and-forget cue output
pub trait AudioSink {
    fn play(&mut self, cue: SoundCue);

    /// Effective volume (0.0 - 1.0); 0 silences
    fn set_volume(&mut self, _volume: f32) {}
}

/// Silent sink for native builds
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _cue: SoundCue) {}
}

/// Remembers every cue it was asked to play
#[derive(Debug, Default, Clone)]
pub struct RecordingAudio {
    pub played: Vec<SoundCue>,
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, cue: SoundCue) {
        self.played.push(cue);
    }
}

impl<A: AudioSink + ?Sized> AudioSink for Box<A> {
    fn play(&mut self, cue: SoundCue) {
        (**self).play(cue);
    }

    fn set_volume(&mut self, volume: f32) {
        (**self).set_volume(volume);
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudio;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioSink, SoundCue};

    /// Web Audio synthesizer
    pub struct WebAudio {
        ctx: Option<AudioContext>,
        volume: f32,
    }

    impl Default for WebAudio {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WebAudio {
        pub fn new() -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self { ctx, volume: 0.8 }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        /// Create an oscillator with gain envelope
        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// One tone sweeping from `from` to `to` Hz
        fn sweep(
            &self,
            ctx: &AudioContext,
            osc_type: OscillatorType,
            from: f32,
            to: f32,
            level: f32,
            secs: f64,
        ) {
            let Some((osc, gain)) = self.create_osc(ctx, from, osc_type) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(level, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + secs)
                .ok();
            osc.frequency().set_value_at_time(from, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(to, t + secs)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + secs + 0.05).ok();
        }

        /// A short run of notes
        fn arpeggio(
            &self,
            ctx: &AudioContext,
            osc_type: OscillatorType,
            notes: &[f32],
            spacing: f64,
            level: f32,
            secs: f64,
        ) {
            for (i, freq) in notes.iter().enumerate() {
                let delay = i as f64 * spacing;
                if let Some((osc, gain)) = self.create_osc(ctx, *freq, osc_type) {
                    let t = ctx.current_time() + delay;
                    gain.gain().set_value_at_time(level, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + secs)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + secs + 0.05).ok();
                }
            }
        }
    }

    impl AudioSink for WebAudio {
        fn set_volume(&mut self, volume: f32) {
            self.volume = volume.clamp(0.0, 1.0);
        }

        fn play(&mut self, cue: SoundCue) {
            let vol = self.volume;
            if vol <= 0.0 {
                return;
            }

            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            use OscillatorType::{Sawtooth, Sine, Square, Triangle};
            match cue {
                SoundCue::Jump => self.sweep(ctx, Triangle, 200.0, 600.0, vol * 0.3, 0.15),
                SoundCue::Coin => self.arpeggio(ctx, Sine, &[900.0, 1200.0], 0.05, vol * 0.25, 0.1),
                SoundCue::Hit => self.sweep(ctx, Square, 400.0, 120.0, vol * 0.3, 0.2),
                SoundCue::PowerUp => {
                    self.arpeggio(ctx, Sine, &[600.0, 800.0, 1000.0], 0.08, vol * 0.25, 0.15)
                }
                SoundCue::GameOver => {
                    self.arpeggio(ctx, Sine, &[400.0, 350.0, 300.0, 200.0], 0.2, vol * 0.3, 0.3)
                }
                SoundCue::Purchase => {
                    self.arpeggio(ctx, Triangle, &[700.0, 1050.0], 0.07, vol * 0.3, 0.2)
                }
                SoundCue::Unlock => {
                    self.arpeggio(ctx, Triangle, &[400.0, 500.0, 600.0, 800.0], 0.1, vol * 0.3, 0.4)
                }
                SoundCue::Click => self.sweep(ctx, Sine, 400.0, 300.0, vol * 0.2, 0.05),
                SoundCue::LevelUp => {
                    self.arpeggio(ctx, Sawtooth, &[300.0, 450.0, 600.0], 0.09, vol * 0.2, 0.25)
                }
                SoundCue::HighScore => self.arpeggio(
                    ctx,
                    Triangle,
                    &[500.0, 600.0, 700.0, 800.0, 1000.0],
                    0.08,
                    vol * 0.25,
                    0.25,
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink() {
        let mut sink: Box<dyn AudioSink> = Box::new(RecordingAudio::default());
        sink.play(SoundCue::Jump);
        let mut recorder = RecordingAudio::default();
        recorder.play(SoundCue::Coin);
        recorder.play(SoundCue::Unlock);
        assert_eq!(recorder.played, vec![SoundCue::Coin, SoundCue::Unlock]);
        assert_eq!(SoundCue::GameOver.name(), "gameOver");
    }
}
