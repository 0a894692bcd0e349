/// Sound engine: procedural chiptune effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget; a failed sink or decoder is ignored.
///
/// Without the "sound" feature the stub SoundEngine does nothing.

use crate::sim::event::GameEvent;

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_move: Arc<Vec<u8>>,
        sfx_dig: Arc<Vec<u8>>,
        sfx_treasure: Arc<Vec<u8>>,
        sfx_win: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!(error = %e, "no audio output, sound disabled");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_move: Arc::new(make_wav(&gen_move())),
                sfx_dig: Arc::new(make_wav(&gen_dig())),
                sfx_treasure: Arc::new(make_wav(&gen_treasure())),
                sfx_win: Arc::new(make_wav(&gen_win())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }

        pub fn play_move(&self) { self.play(&self.sfx_move); }
        pub fn play_dig(&self) { self.play(&self.sfx_dig); }
        pub fn play_treasure(&self) { self.play(&self.sfx_treasure); }
        pub fn play_win(&self) { self.play(&self.sfx_win); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: mono f32 samples in [-1, 1]
    // ════════════════════════════════════════════════════════════

    fn tone(freq: f32, t: f32) -> f32 {
        (t * freq * TAU).sin()
    }

    /// Append `dur` seconds of `freq` with a decaying envelope.
    fn push_note(out: &mut Vec<f32>, freq: f32, dur: f32, volume: f32) {
        let n = (SAMPLE_RATE as f32 * dur) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32).powf(0.6);
            let wave = tone(freq, t) * 0.7 + tone(freq * 2.0, t) * 0.3;
            out.push(wave * env * volume);
        }
    }

    /// Move: low engine putter, two quick pulses.
    fn gen_move() -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in &[110.0_f32, 98.0] {
            let n = (SAMPLE_RATE as f32 * 0.05) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - i as f32 / n as f32;
                // Clipped sine reads as a rough motor
                let wave = (tone(freq, t) * 3.0).clamp(-1.0, 1.0);
                samples.push(wave * env * 0.15);
            }
        }
        samples
    }

    /// Dig: gravelly noise over a falling tone.
    fn gen_dig() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.18) as usize;
        let mut rng: u32 = 0x2545_F491;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let t = i as f32 / SAMPLE_RATE as f32;
                let freq = 160.0 + (1.0 - p) * 220.0;
                // xorshift noise
                rng ^= rng << 13;
                rng ^= rng >> 17;
                rng ^= rng << 5;
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = (1.0 - p).powf(0.7);
                (tone(freq, t) * 0.35 + noise * 0.65) * env * 0.3
            })
            .collect()
    }

    /// Treasure: bright rising arpeggio G5 → B5 → D6 → G6.
    fn gen_treasure() -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in &[784.0_f32, 988.0, 1175.0, 1568.0] {
            push_note(&mut samples, freq, 0.06, 0.25);
        }
        samples
    }

    /// Win: fanfare C5 E5 G5, held C6.
    fn gen_win() -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in &[523.0_f32, 659.0, 784.0] {
            push_note(&mut samples, freq, 0.12, 0.3);
        }
        push_note(&mut samples, 1047.0, 0.45, 0.3);
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder, 16-bit PCM mono
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let channels: u16 = 1;
        let bits: u16 = 16;
        let byte_rate = SAMPLE_RATE * channels as u32 * bits as u32 / 8;
        let block_align = channels * bits / 8;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }

}

// ════════════════════════════════════════════════════════════
//  Public API, no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_move(&self) {}
    pub fn play_dig(&self) {}
    pub fn play_treasure(&self) {}
    pub fn play_win(&self) {}
}

/// Play the effects for a batch of events.
pub fn play_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::Moved { .. } => sfx.play_move(),
            GameEvent::DigStarted { .. } => sfx.play_dig(),
            GameEvent::CellDug { treasure: Some(_), .. } => sfx.play_treasure(),
            GameEvent::AllTreasuresFound => sfx.play_win(),
            _ => {}
        }
    }
}
