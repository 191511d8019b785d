#![no_main]

//! Fuzz target for RLE subpicture compositing.
//!
//! Feeds arbitrary codeword streams, geometry and output formats to the
//! renderer to find out-of-bounds writes and arithmetic panics.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use transcode_spu::{
    Chroma, Picture, RenderSize, SpuRenderer, SubpictureKind, SubpicturePool,
};

#[derive(Arbitrary, Debug)]
struct RenderInput {
    rle: Vec<u8>,
    x: u16,
    y: u16,
    width: u16,
    height: u16,
    output: Output,
    render_width: u16,
    render_height: u16,
}

#[derive(Arbitrary, Debug)]
enum Output {
    I420,
    Yv12,
    Rv16,
    Rv32,
}

fuzz_target!(|input: RenderInput| {
    // Limit input size
    if input.rle.len() > 64 * 1024 {
        return;
    }

    let chroma = match input.output {
        Output::I420 => Chroma::I420,
        Output::Yv12 => Chroma::Yv12,
        Output::Rv16 => Chroma::Rv16,
        Output::Rv32 => Chroma::Rv32,
    };

    let pool = SubpicturePool::default();
    let Ok(id) = pool.create(SubpictureKind::Rle, input.rle.len()) else {
        return;
    };
    if let Some(mut spu) = pool.write(id) {
        spu.data_mut()[..input.rle.len()].copy_from_slice(&input.rle);
        spu.set_geometry(
            input.x as u32,
            input.y as u32,
            (input.width % 1024) as u32,
            (input.height % 1024) as u32,
        );
        spu.set_timing(0, 0);
    }
    let _ = pool.display(id, 96);

    let mut picture = Picture::new(128, 96, chroma);
    let list = pool.select_for_display(0);
    SpuRenderer::default().render(
        &mut picture,
        &pool,
        &list,
        RenderSize::new(input.render_width as u32, input.render_height as u32),
    );
});
