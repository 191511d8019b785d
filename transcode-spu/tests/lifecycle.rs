//! End-to-end tests for the subpicture heap: producers on several threads,
//! one display loop selecting and rendering per frame.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use transcode_spu::{
    Chroma, Picture, RenderSize, RleWriter, SharedSubpicturePool, SpuConfig, SpuError,
    SpuRenderer, SubpictureId, SubpictureKind, SubpicturePool, SubpictureStatus,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Publish a solid `width`x`height` subpicture in colour class `class`.
fn publish(
    pool: &SubpicturePool,
    width: u32,
    height: u32,
    class: u8,
    start: i64,
    stop: i64,
) -> Result<SubpictureId, SpuError> {
    let mut rle = RleWriter::new();
    for _ in 0..height {
        rle.push(width, class);
    }

    let id = pool.create(SubpictureKind::Rle, rle.len())?;
    {
        let mut spu = pool.write(id).expect("valid handle");
        spu.data_mut()[..rle.len()].copy_from_slice(rle.as_bytes());
        spu.set_geometry(0, 0, width, height);
        spu.set_timing(start, stop);
    }
    pool.display(id, 576)?;
    Ok(id)
}

#[test]
fn status_follows_lifecycle() {
    init_tracing();
    let pool = SubpicturePool::with_capacity(1).unwrap();
    let id = pool.create(SubpictureKind::Rle, 8).unwrap();
    assert_eq!(pool.status(id), Some(SubpictureStatus::Reserved));

    pool.display(id, 576).unwrap();
    assert_eq!(pool.status(id), Some(SubpictureStatus::Ready));

    pool.destroy(id).unwrap();
    assert_eq!(pool.status(id), Some(SubpictureStatus::Destroyed));

    let again = pool.create(SubpictureKind::Rle, 8).unwrap();
    assert_eq!(again, id);
    assert_eq!(pool.status(id), Some(SubpictureStatus::Reserved));
}

#[test]
fn expired_slots_are_recycled() {
    init_tracing();
    let pool = SubpicturePool::with_capacity(2).unwrap();

    let a = publish(&pool, 8, 2, 1, 0, 100).unwrap();
    let b = publish(&pool, 8, 2, 1, 0, 200).unwrap();
    assert_eq!(
        pool.create(SubpictureKind::Rle, 4),
        Err(SpuError::PoolFull)
    );

    assert_eq!(pool.select_for_display(150), vec![b]);
    assert_eq!(pool.status(a), Some(SubpictureStatus::Destroyed));

    let allocations = pool.allocations();
    let c = publish(&pool, 8, 2, 2, 150, 300).unwrap();
    assert_eq!(c, a);
    assert_eq!(pool.allocations(), allocations);
}

#[test]
fn display_loop_draws_current_subtitles() {
    init_tracing();
    let config = SpuConfig::default().with_margin(10);
    let pool = SubpicturePool::new(config).unwrap();
    let renderer = SpuRenderer::from_config(pool.config());

    publish(&pool, 16, 4, 2, 0, 1_000).unwrap();
    publish(&pool, 16, 4, 3, 2_000, 3_000).unwrap();

    let mut picture = Picture::new(720, 576, Chroma::I420);
    let list = pool.select_for_display(500);
    assert_eq!(list.len(), 1);
    renderer.render(&mut picture, &pool, &list, RenderSize::new(720, 576));

    let luma = picture.plane(0).unwrap();
    // 576 - 10 - 4
    assert_eq!(luma.row(562).unwrap()[0], 0xff);
    assert_eq!(luma.row(565).unwrap()[15], 0xff);
    assert_eq!(luma.row(561).unwrap()[0], 0x00);
    assert_eq!(luma.row(566).unwrap()[0], 0x00);

    let mut picture = Picture::new(720, 576, Chroma::I420);
    let list = pool.select_for_display(2_500);
    renderer.render(&mut picture, &pool, &list, RenderSize::new(720, 576));
    assert_eq!(picture.plane(0).unwrap().row(562).unwrap()[0], 0x88);
    assert_eq!(pool.ready_count(), 1);
}

#[test]
fn rv16_output_is_scaled_from_render_size() {
    init_tracing();
    let pool = SubpicturePool::default();
    let mut rle = RleWriter::new();
    rle.push(10, 1);

    let id = pool.create(SubpictureKind::Rle, rle.len()).unwrap();
    {
        let mut spu = pool.write(id).unwrap();
        spu.data_mut().copy_from_slice(rle.as_bytes());
        spu.set_geometry(0, 0, 10, 1);
        spu.set_timing(0, 10);
    }
    pool.display(id, 288).unwrap();

    let mut picture = Picture::new(360, 288, Chroma::Rv16);
    let list = pool.select_for_display(5);
    SpuRenderer::default().render(&mut picture, &pool, &list, RenderSize::new(720, 576));

    let row = picture.plane(0).unwrap().row(0).unwrap();
    let pixel = |x: usize| u16::from_le_bytes([row[2 * x], row[2 * x + 1]]);
    for x in 0..6 {
        assert_eq!(pixel(x), 0x4444);
    }
    assert_eq!(pixel(6), 0);
}

#[test]
fn unsupported_output_leaves_picture_untouched() {
    init_tracing();
    let pool = SubpicturePool::default();
    publish(&pool, 8, 1, 1, 0, 10).unwrap();

    let mut picture = Picture::new(64, 64, Chroma::Yuy2);
    let list = pool.select_for_display(5);
    SpuRenderer::default().render(&mut picture, &pool, &list, RenderSize::new(64, 64));
    assert!(picture.plane(0).unwrap().data().iter().all(|&b| b == 0));
}

#[test]
fn concurrent_producers_never_share_a_slot() {
    init_tracing();
    let pool: SharedSubpicturePool = Arc::new(SubpicturePool::with_capacity(8).unwrap());
    let held = Arc::new(Mutex::new(HashSet::new()));

    let handles: Vec<_> = (0..4)
        .map(|producer| {
            let pool = Arc::clone(&pool);
            let held = Arc::clone(&held);
            thread::spawn(move || {
                let mut published = 0;
                for n in 0..50i64 {
                    match publish(&pool, 4, 1, 1 + (producer % 3) as u8, n, n) {
                        Ok(id) => {
                            assert!(held.lock().unwrap().insert(id), "{id} handed out twice");
                            published += 1;
                            held.lock().unwrap().remove(&id);
                            pool.destroy(id).unwrap();
                        }
                        Err(e) => assert_eq!(e, SpuError::PoolFull),
                    }
                }
                published
            })
        })
        .collect();

    let published: usize = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .sum();

    // Each producer holds at most one slot at a time, so the heap never fills.
    assert_eq!(published, 200);
    assert!(held.lock().unwrap().is_empty());
    assert_eq!(pool.ready_count(), 0);
    assert!(pool.allocations() <= pool.capacity() * 2);
}

#[test]
fn selection_never_releases_a_reserved_slot() {
    init_tracing();
    let pool: SharedSubpicturePool = Arc::new(SubpicturePool::with_capacity(1).unwrap());
    let done = Arc::new(AtomicBool::new(false));

    let selectors: Vec<_> = (0..3)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    pool.select_for_display(500);
                }
            })
        })
        .collect();

    for _ in 0..20_000 {
        let id = pool.create(SubpictureKind::Rle, 8).unwrap();
        assert_eq!(pool.status(id), Some(SubpictureStatus::Reserved));
        pool.write(id).unwrap().set_timing(0, 100);
        assert_eq!(pool.status(id), Some(SubpictureStatus::Reserved));
        pool.display(id, 576).unwrap();
        pool.destroy(id).unwrap();
    }

    done.store(true, Ordering::Relaxed);
    for selector in selectors {
        selector.join().unwrap();
    }
}

#[test]
fn display_thread_runs_alongside_producers() {
    init_tracing();
    let pool: SharedSubpicturePool = Arc::new(SubpicturePool::with_capacity(4).unwrap());

    let producer = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || {
            let mut created = 0;
            for n in 0..200i64 {
                if publish(&pool, 8, 2, 2, n, n + 5).is_ok() {
                    created += 1;
                }
            }
            created
        })
    };

    let renderer = SpuRenderer::default();
    let mut picture = Picture::new(64, 32, Chroma::I420);
    for date in 0..400i64 {
        let list = pool.select_for_display(date);
        assert!(list.len() <= pool.capacity());
        renderer.render(&mut picture, &pool, &list, RenderSize::new(64, 32));
    }

    let created = producer.join().unwrap();
    assert!(created > 0);

    pool.select_for_display(i64::MAX);
    assert_eq!(pool.ready_count(), 0);
}
