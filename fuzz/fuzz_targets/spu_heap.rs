#![no_main]

//! Fuzz target for the subpicture heap.
//!
//! Runs arbitrary create/display/destroy/select sequences and checks that
//! slot states stay consistent.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use transcode_spu::{SubpictureId, SubpictureKind, SubpicturePool, SubpictureStatus};

#[derive(Arbitrary, Debug)]
enum HeapOperation {
    Create { text: bool, size: u16 },
    Display { index: u8, output_height: u16 },
    Destroy { index: u8 },
    Timing { index: u8, start: i16, stop: i16, ephemeral: bool },
    Select { date: i16 },
}

fuzz_target!(|operations: Vec<HeapOperation>| {
    let pool = SubpicturePool::with_capacity(4).unwrap();
    let mut held: Vec<SubpictureId> = Vec::new();

    for op in operations.iter().take(256) {
        match *op {
            HeapOperation::Create { text, size } => {
                let kind = if text { SubpictureKind::Text } else { SubpictureKind::Rle };
                if let Ok(id) = pool.create(kind, size as usize) {
                    assert_eq!(pool.status(id), Some(SubpictureStatus::Reserved));
                    assert!(!held.contains(&id));
                    held.push(id);
                }
            }
            HeapOperation::Display { index, output_height } => {
                if let Some(&id) = held.get(index as usize) {
                    if pool.status(id) == Some(SubpictureStatus::Reserved) {
                        let _ = pool.display(id, output_height as u32);
                    }
                }
            }
            HeapOperation::Destroy { index } => {
                if (index as usize) < held.len() {
                    let id = held.remove(index as usize);
                    let _ = pool.destroy(id);
                }
            }
            HeapOperation::Timing { index, start, stop, ephemeral } => {
                if let Some(&id) = held.get(index as usize) {
                    if let Some(mut spu) = pool.write(id) {
                        spu.set_timing(start as i64, stop as i64);
                        spu.ephemeral = ephemeral;
                    }
                }
            }
            HeapOperation::Select { date } => {
                for id in pool.select_for_display(date as i64) {
                    assert_eq!(pool.status(id), Some(SubpictureStatus::Ready));
                }
                held.retain(|&id| pool.status(id) != Some(SubpictureStatus::Destroyed));
            }
        }
    }
});
