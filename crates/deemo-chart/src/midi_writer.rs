//! Standard MIDI File emission for extracted note sequences.
//!
//! Output is SMF format 0: one track carrying a tempo meta event, a program
//! change, and the note events. The time-base is fixed at 480 PPQ / 120 BPM
//! to match the tick mapping used by the chart parser, so onset and offset
//! ticks land in the file unchanged.

use crate::note::NoteSequence;
use crate::{Error, Result};

const PPQ: u16 = 480;
const MICROSECONDS_PER_BEAT: u32 = 500_000; // 120 BPM

/// Largest delta a 4-byte MIDI variable-length quantity can hold.
const VLQ_MAX: u64 = 0x0FFF_FFFF;

// Event ordering at equal ticks. Note-offs go before note-ons so back-to-back
// notes on the same pitch re-trigger cleanly; a zero-duration note's own off
// must instead trail its on, or the pair would vanish on re-parse.
const ORDER_TEMPO: u8 = 0;
const ORDER_PROGRAM: u8 = 1;
const ORDER_NOTE_OFF: u8 = 2;
const ORDER_NOTE_ON: u8 = 3;
const ORDER_INSTANT_OFF: u8 = 4;

/// Encode one note sequence as a complete MIDI file.
///
/// Fails with [`Error::Encoding`] if any delta between consecutive events
/// exceeds the variable-length-quantity range; data is never silently
/// truncated.
pub fn sequence_to_midi(seq: &NoteSequence) -> Result<Vec<u8>> {
    let track = build_note_track(seq)?;
    Ok(build_midi_file(PPQ, &track))
}

fn build_note_track(seq: &NoteSequence) -> Result<Vec<u8>> {
    let mut events: Vec<(u64, u8, Vec<u8>)> = Vec::new();

    events.push((
        0,
        ORDER_TEMPO,
        vec![
            0xFF,
            0x51,
            0x03,
            (MICROSECONDS_PER_BEAT >> 16) as u8,
            (MICROSECONDS_PER_BEAT >> 8) as u8,
            MICROSECONDS_PER_BEAT as u8,
        ],
    ));
    events.push((0, ORDER_PROGRAM, vec![0xC0, 0]));

    for note in seq.notes() {
        events.push((
            note.onset_tick,
            ORDER_NOTE_ON,
            vec![0x90, note.pitch, note.velocity],
        ));
        let off_order = if note.offset_tick == note.onset_tick {
            ORDER_INSTANT_OFF
        } else {
            ORDER_NOTE_OFF
        };
        events.push((note.offset_tick, off_order, vec![0x80, note.pitch, 0]));
    }

    events.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut track_data = Vec::new();
    let mut last_tick = 0u64;

    for (tick, _, data) in events {
        let delta = tick - last_tick;
        if delta > VLQ_MAX {
            return Err(Error::Encoding(format!(
                "event delta {delta} ticks exceeds the VLQ range"
            )));
        }
        write_vlq(&mut track_data, delta as u32);
        track_data.extend_from_slice(&data);
        last_tick = tick;
    }

    // End of track
    write_vlq(&mut track_data, 0);
    track_data.extend_from_slice(&[0xFF, 0x2F, 0x00]);

    Ok(track_data)
}

/// Assemble a complete format-0 MIDI file from one track blob.
fn build_midi_file(ppq: u16, track: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();

    // MThd header
    buf.extend_from_slice(b"MThd");
    buf.extend_from_slice(&6u32.to_be_bytes());
    buf.extend_from_slice(&0u16.to_be_bytes()); // format 0
    buf.extend_from_slice(&1u16.to_be_bytes());
    buf.extend_from_slice(&ppq.to_be_bytes());

    // MTrk chunk
    buf.extend_from_slice(b"MTrk");
    buf.extend_from_slice(&(track.len() as u32).to_be_bytes());
    buf.extend_from_slice(track);

    buf
}

/// Write a variable-length quantity to a byte buffer.
fn write_vlq(buf: &mut Vec<u8>, mut value: u32) {
    if value == 0 {
        buf.push(0);
        return;
    }

    let mut bytes = Vec::new();
    bytes.push((value & 0x7F) as u8);
    value >>= 7;

    while value > 0 {
        bytes.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }

    bytes.reverse();
    buf.extend_from_slice(&bytes);
}
