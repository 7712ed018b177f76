// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end layer state scenarios: commit a transaction, capture, check
//! pixels.

use kurbo::Rect;
use lamina_composer::{ComposerConfig, SurfaceComposer};
use lamina_core::buffer::{PixelBuffer, Rgba8};
use lamina_core::error::TransactionError;
use lamina_core::layer::{LayerFlags, LayerId, LayerKind, Rgb};
use lamina_core::stack::LayerStack;
use lamina_harness::ScreenCapture;

const STACK: LayerStack = LayerStack(0);

fn composer() -> SurfaceComposer {
    SurfaceComposer::new(ComposerConfig::with_display(64, 64))
}

fn color_layer(composer: &SurfaceComposer, name: &str, w: u32, h: u32, color: Rgb) -> LayerId {
    let id = composer.create_layer(name, LayerKind::Color, w, h, STACK);
    let mut txn = composer.begin();
    txn.set_color(id, color);
    txn.apply().unwrap();
    id
}

fn buffer_layer(composer: &SurfaceComposer, name: &str, w: u32, h: u32, fill: Rgba8) -> LayerId {
    let id = composer.create_layer(name, LayerKind::BufferState, w, h, STACK);
    composer
        .submit_buffer_content(id, PixelBuffer::filled(w, h, fill))
        .unwrap();
    id
}

fn screenshot(composer: &SurfaceComposer) -> ScreenCapture {
    ScreenCapture::new(composer.capture_display(STACK))
}

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Rect {
    Rect::new(x0, y0, x1, y1)
}

#[test]
fn empty_display_is_black() {
    let composer = composer();
    screenshot(&composer).expect_color(rect(0.0, 0.0, 64.0, 64.0), Rgba8::BLACK, 0);
}

#[test]
fn set_z_orders_siblings() {
    let composer = composer();
    let red = color_layer(&composer, "red", 32, 32, Rgb::RED);
    let blue = color_layer(&composer, "blue", 32, 32, Rgb::BLUE);

    let mut txn = composer.begin();
    txn.set_z(red, 1).set_z(blue, 0);
    txn.apply().unwrap();
    screenshot(&composer).expect_color(rect(0.0, 0.0, 32.0, 32.0), Rgba8::RED, 0);

    let mut txn = composer.begin();
    txn.set_z(red, 0).set_z(blue, 1);
    txn.apply().unwrap();
    screenshot(&composer).expect_color(rect(0.0, 0.0, 32.0, 32.0), Rgba8::BLUE, 0);
}

#[test]
fn equal_z_keeps_creation_order() {
    let composer = composer();
    let _first = color_layer(&composer, "first", 32, 32, Rgb::RED);
    let _second = color_layer(&composer, "second", 32, 32, Rgb::GREEN);
    screenshot(&composer).expect_color(rect(0.0, 0.0, 32.0, 32.0), Rgba8::GREEN, 0);
}

#[test]
fn relative_layer_overrides_z() {
    let composer = composer();
    let red = color_layer(&composer, "red", 32, 32, Rgb::RED);
    let green = color_layer(&composer, "green", 32, 32, Rgb::GREEN);

    let mut txn = composer.begin();
    txn.set_z(red, 10).set_relative_layer(green, red, 1);
    txn.apply().unwrap();
    screenshot(&composer).expect_color(rect(0.0, 0.0, 32.0, 32.0), Rgba8::GREEN, 0);

    let mut txn = composer.begin();
    txn.set_relative_layer(green, red, -1);
    txn.apply().unwrap();
    screenshot(&composer).expect_color(rect(0.0, 0.0, 32.0, 32.0), Rgba8::RED, 0);

    // Clearing the anchor restores the layer's own z (0, below red's 10).
    let mut txn = composer.begin();
    txn.set_relative_layer(green, red, 1).clear_relative_layer(green);
    txn.apply().unwrap();
    screenshot(&composer).expect_color(rect(0.0, 0.0, 32.0, 32.0), Rgba8::RED, 0);
}

#[test]
fn destroying_anchor_target_hides_anchored_layer() {
    let composer = composer();
    let red = color_layer(&composer, "red", 32, 32, Rgb::RED);
    let green = color_layer(&composer, "green", 32, 32, Rgb::GREEN);

    let mut txn = composer.begin();
    txn.set_relative_layer(green, red, 1);
    txn.apply().unwrap();
    screenshot(&composer).expect_color(rect(0.0, 0.0, 32.0, 32.0), Rgba8::GREEN, 0);

    composer.destroy_layer(red).unwrap();
    screenshot(&composer).expect_color(rect(0.0, 0.0, 32.0, 32.0), Rgba8::BLACK, 0);
    assert!(composer.get_layer(green).unwrap().orphaned);

    // Re-anchoring the layer elsewhere brings it back.
    let blue = color_layer(&composer, "blue", 8, 8, Rgb::BLUE);
    let mut txn = composer.begin();
    txn.set_relative_layer(green, blue, 1);
    txn.apply().unwrap();
    screenshot(&composer).expect_color(rect(0.0, 0.0, 32.0, 32.0), Rgba8::GREEN, 0);
}

#[test]
fn destroying_anchored_layer_removes_it() {
    let composer = composer();
    let red = color_layer(&composer, "red", 32, 32, Rgb::RED);
    let green = color_layer(&composer, "green", 32, 32, Rgb::GREEN);

    let mut txn = composer.begin();
    txn.set_position(green, 16.0, 16.0)
        .set_relative_layer(green, red, 1);
    txn.apply().unwrap();
    screenshot(&composer).expect_color(rect(16.0, 16.0, 48.0, 48.0), Rgba8::GREEN, 0);

    composer.destroy_layer(green).unwrap();
    let shot = screenshot(&composer);
    shot.expect_color(rect(0.0, 0.0, 32.0, 32.0), Rgba8::RED, 0);
    shot.expect_color(rect(32.0, 32.0, 48.0, 48.0), Rgba8::BLACK, 0);
}

#[test]
fn hidden_flag_set_and_cleared() {
    let composer = composer();
    let red = color_layer(&composer, "red", 32, 32, Rgb::RED);

    let mut txn = composer.begin();
    txn.set_flags(red, LayerFlags::HIDDEN, LayerFlags::HIDDEN);
    txn.apply().unwrap();
    screenshot(&composer).expect_color(rect(0.0, 0.0, 32.0, 32.0), Rgba8::BLACK, 0);

    let mut txn = composer.begin();
    txn.set_flags(red, LayerFlags::empty(), LayerFlags::HIDDEN);
    txn.apply().unwrap();
    screenshot(&composer).expect_color(rect(0.0, 0.0, 32.0, 32.0), Rgba8::RED, 0);
}

#[test]
fn hidden_parent_keeps_visible_children() {
    let composer = composer();
    let parent = composer.create_layer("parent", LayerKind::Container, 0, 0, STACK);
    let child = color_layer(&composer, "child", 16, 16, Rgb::RED);
    let mut txn = composer.begin();
    txn.reparent(child, Some(parent))
        .set_flags(parent, LayerFlags::HIDDEN, LayerFlags::HIDDEN)
        .set_position(parent, 8.0, 8.0);
    txn.apply().unwrap();
    // Hiding is not inherited; the parent still positions its child.
    let shot = screenshot(&composer);
    shot.expect_color(rect(8.0, 8.0, 24.0, 24.0), Rgba8::RED, 0);
    shot.expect_color(rect(0.0, 0.0, 8.0, 8.0), Rgba8::BLACK, 0);
}

#[test]
fn translucent_buffer_blends_premultiplied() {
    let composer = composer();
    let _green = color_layer(&composer, "green", 32, 32, Rgb::GREEN);
    let translucent = buffer_layer(&composer, "translucent", 32, 32, Rgba8::new(100, 0, 0, 100));
    let blended = Rgba8::new(100, 155, 0, 255);
    screenshot(&composer).expect_color(rect(0.0, 0.0, 32.0, 32.0), blended, 1);

    // OPAQUE ignores the buffer's alpha and hides what is behind.
    let mut txn = composer.begin();
    txn.set_flags(translucent, LayerFlags::OPAQUE, LayerFlags::OPAQUE);
    txn.apply().unwrap();
    screenshot(&composer).expect_color(rect(0.0, 0.0, 32.0, 32.0), Rgba8::new(100, 0, 0, 255), 1);

    let mut txn = composer.begin();
    txn.set_flags(translucent, LayerFlags::empty(), LayerFlags::OPAQUE);
    txn.apply().unwrap();
    screenshot(&composer).expect_color(rect(0.0, 0.0, 32.0, 32.0), blended, 1);
}

#[test]
fn negative_z_children_draw_behind_parent() {
    let composer = composer();
    let parent = color_layer(&composer, "parent", 32, 32, Rgb::BLUE);
    let child = color_layer(&composer, "child", 48, 48, Rgb::RED);
    let mut txn = composer.begin();
    txn.reparent(child, Some(parent)).set_z(child, -1);
    txn.apply().unwrap();

    let shot = screenshot(&composer);
    shot.expect_color(rect(0.0, 0.0, 32.0, 32.0), Rgba8::BLUE, 0);
    shot.expect_color(rect(32.0, 32.0, 48.0, 48.0), Rgba8::RED, 0);
}

#[test]
fn negative_z_siblings_order_among_themselves() {
    let composer = composer();
    let parent = composer.create_layer("parent", LayerKind::Container, 0, 0, STACK);
    let red = color_layer(&composer, "red", 32, 32, Rgb::RED);
    let blue = color_layer(&composer, "blue", 32, 32, Rgb::BLUE);

    let mut txn = composer.begin();
    txn.set_crop(parent, rect(0.0, 0.0, 16.0, 16.0))
        .reparent(red, Some(parent))
        .reparent(blue, Some(parent))
        .set_z(red, -1)
        .set_z(blue, -2);
    txn.apply().unwrap();
    let shot = screenshot(&composer);
    shot.expect_color(rect(0.0, 0.0, 16.0, 16.0), Rgba8::RED, 0);
    // The parent's crop clips its children.
    shot.expect_color(rect(16.0, 16.0, 32.0, 32.0), Rgba8::BLACK, 0);

    let mut txn = composer.begin();
    txn.set_z(red, -3);
    txn.apply().unwrap();
    screenshot(&composer).expect_color(rect(0.0, 0.0, 16.0, 16.0), Rgba8::BLUE, 0);
}

#[test]
fn alpha_is_clamped() {
    let composer = composer();
    let dim_red = Rgb::new(64.0 / 255.0, 0.0, 0.0);
    let layer = color_layer(&composer, "dim", 32, 32, dim_red);

    let mut txn = composer.begin();
    txn.set_alpha(layer, 2.0);
    txn.apply().unwrap();
    assert_eq!(composer.get_layer(layer).unwrap().alpha, 1.0);
    screenshot(&composer).expect_color(rect(0.0, 0.0, 32.0, 32.0), Rgba8::new(64, 0, 0, 255), 1);

    let mut txn = composer.begin();
    txn.set_alpha(layer, -1.0);
    txn.apply().unwrap();
    assert_eq!(composer.get_layer(layer).unwrap().alpha, 0.0);
    screenshot(&composer).expect_color(rect(0.0, 0.0, 32.0, 32.0), Rgba8::BLACK, 0);
}

#[test]
fn corner_radius_masks_corners() {
    let composer = composer();
    let red = color_layer(&composer, "red", 64, 64, Rgb::RED);
    let mut txn = composer.begin();
    txn.set_corner_radius(red, 20.0);
    txn.apply().unwrap();

    let shot = screenshot(&composer);
    shot.expect_color(rect(0.0, 0.0, 4.0, 4.0), Rgba8::BLACK, 0);
    shot.expect_color(rect(60.0, 0.0, 64.0, 4.0), Rgba8::BLACK, 0);
    shot.expect_color(rect(0.0, 60.0, 4.0, 64.0), Rgba8::BLACK, 0);
    shot.expect_color(rect(60.0, 60.0, 64.0, 64.0), Rgba8::BLACK, 0);
    shot.expect_color(rect(20.0, 0.0, 44.0, 64.0), Rgba8::RED, 0);
    shot.expect_color(rect(0.0, 20.0, 64.0, 44.0), Rgba8::RED, 0);
}

#[test]
fn parent_corner_radius_masks_translated_child() {
    let composer = composer();
    let parent = color_layer(&composer, "parent", 64, 64, Rgb::RED);
    let child = color_layer(&composer, "child", 64, 32, Rgb::BLUE);
    let mut txn = composer.begin();
    txn.set_corner_radius(parent, 20.0)
        .reparent(child, Some(parent))
        .set_position(child, 0.0, 32.0);
    txn.apply().unwrap();

    let shot = screenshot(&composer);
    // Parent's top corners are rounded, its top edge is straight.
    shot.expect_color(rect(0.0, 0.0, 4.0, 4.0), Rgba8::BLACK, 0);
    shot.expect_color(rect(60.0, 0.0, 64.0, 4.0), Rgba8::BLACK, 0);
    shot.expect_color(rect(20.0, 0.0, 44.0, 1.0), Rgba8::RED, 0);
    // The child inherits the parent's rounding at the bottom.
    shot.expect_color(rect(0.0, 60.0, 4.0, 64.0), Rgba8::BLACK, 0);
    shot.expect_color(rect(60.0, 60.0, 64.0, 64.0), Rgba8::BLACK, 0);
    shot.expect_color(rect(0.0, 32.0, 64.0, 44.0), Rgba8::BLUE, 0);
}

#[test]
fn color_has_no_effect_on_buffer_layers() {
    let composer = composer();
    let layer = buffer_layer(&composer, "buffer", 32, 32, Rgba8::RED);
    let mut txn = composer.begin();
    txn.set_color(layer, Rgb::BLUE);
    txn.apply().unwrap();
    screenshot(&composer).expect_color(rect(0.0, 0.0, 32.0, 32.0), Rgba8::RED, 0);
}

#[test]
fn buffer_layer_without_content_draws_nothing() {
    let composer = composer();
    let _layer = composer.create_layer("empty", LayerKind::BufferQueue, 32, 32, STACK);
    screenshot(&composer).expect_color(rect(0.0, 0.0, 64.0, 64.0), Rgba8::BLACK, 0);
}

#[test]
fn zero_area_geometry_draws_nothing() {
    let composer = composer();
    let _empty = color_layer(&composer, "empty", 0, 0, Rgb::RED);
    let _flat = color_layer(&composer, "flat", 32, 0, Rgb::RED);
    let cropped = color_layer(&composer, "cropped", 32, 32, Rgb::GREEN);
    let parent = composer.create_layer("parent", LayerKind::Container, 0, 0, STACK);
    let child = color_layer(&composer, "child", 32, 32, Rgb::BLUE);

    let mut txn = composer.begin();
    txn.set_crop(cropped, rect(8.0, 8.0, 8.0, 24.0))
        .set_crop(parent, rect(0.0, 0.0, 16.0, 0.0))
        .reparent(child, Some(parent));
    txn.apply().unwrap();
    screenshot(&composer).expect_color(rect(0.0, 0.0, 64.0, 64.0), Rgba8::BLACK, 0);

    // A real crop on the parent lets the child through again.
    let mut txn = composer.begin();
    txn.set_crop(parent, rect(0.0, 0.0, 16.0, 16.0));
    txn.apply().unwrap();
    let shot = screenshot(&composer);
    shot.expect_color(rect(0.0, 0.0, 16.0, 16.0), Rgba8::BLUE, 0);
    shot.expect_color(rect(16.0, 16.0, 64.0, 64.0), Rgba8::BLACK, 0);
}

#[test]
fn layer_stacks_partition_output() {
    let composer = composer();
    let red = color_layer(&composer, "red", 32, 32, Rgb::RED);
    let mut txn = composer.begin();
    txn.set_layer_stack(red, LayerStack(1));
    txn.apply().unwrap();

    screenshot(&composer).expect_color(rect(0.0, 0.0, 32.0, 32.0), Rgba8::BLACK, 0);
    ScreenCapture::new(composer.capture_display(LayerStack(1)))
        .expect_color(rect(0.0, 0.0, 32.0, 32.0), Rgba8::RED, 0);

    let mut txn = composer.begin();
    txn.set_layer_stack(red, STACK);
    txn.apply().unwrap();
    screenshot(&composer).expect_color(rect(0.0, 0.0, 32.0, 32.0), Rgba8::RED, 0);
}

#[test]
fn children_follow_their_root_layer_stack() {
    let composer = composer();
    let parent = color_layer(&composer, "parent", 8, 8, Rgb::BLUE);
    let child = color_layer(&composer, "child", 8, 8, Rgb::RED);
    let mut txn = composer.begin();
    txn.reparent(child, Some(parent))
        .set_position(child, 16.0, 0.0)
        .set_layer_stack(child, LayerStack(7));
    txn.apply().unwrap();
    screenshot(&composer).expect_color(rect(16.0, 0.0, 24.0, 8.0), Rgba8::RED, 0);
}

#[test]
fn capture_region_is_offset() {
    let composer = composer();
    let green = color_layer(&composer, "green", 8, 8, Rgb::GREEN);
    let mut txn = composer.begin();
    txn.set_position(green, 16.0, 16.0);
    txn.apply().unwrap();

    let shot = ScreenCapture::new(composer.capture(STACK, rect(16.0, 16.0, 32.0, 32.0)));
    assert_eq!((shot.buffer().width(), shot.buffer().height()), (16, 16));
    shot.expect_color(rect(0.0, 0.0, 8.0, 8.0), Rgba8::GREEN, 0);
    shot.expect_color(rect(8.0, 8.0, 16.0, 16.0), Rgba8::BLACK, 0);
}

#[test]
fn crop_limits_layer() {
    let composer = composer();
    let red = color_layer(&composer, "red", 32, 32, Rgb::RED);
    let mut txn = composer.begin();
    txn.set_crop(red, rect(8.0, 8.0, 16.0, 16.0));
    txn.apply().unwrap();
    let shot = screenshot(&composer);
    shot.expect_color(rect(8.0, 8.0, 16.0, 16.0), Rgba8::RED, 0);
    shot.expect_color(rect(0.0, 0.0, 8.0, 32.0), Rgba8::BLACK, 0);
    shot.expect_color(rect(16.0, 0.0, 32.0, 32.0), Rgba8::BLACK, 0);
}

#[test]
fn invalid_handle_rejects_whole_transaction() {
    let composer = composer();
    let red = color_layer(&composer, "red", 32, 32, Rgb::RED);
    let gone = color_layer(&composer, "gone", 8, 8, Rgb::GREEN);
    composer.destroy_layer(gone).unwrap();

    let mut txn = composer.begin();
    txn.set_color(red, Rgb::BLUE).set_alpha(gone, 0.5);
    assert_eq!(txn.apply(), Err(TransactionError::InvalidHandle(gone)));
    screenshot(&composer).expect_color(rect(0.0, 0.0, 32.0, 32.0), Rgba8::RED, 0);
}

#[test]
fn cycles_are_rejected() {
    let composer = composer();
    let a = color_layer(&composer, "a", 8, 8, Rgb::RED);
    let b = color_layer(&composer, "b", 8, 8, Rgb::GREEN);
    let mut txn = composer.begin();
    txn.reparent(b, Some(a));
    txn.apply().unwrap();

    let mut txn = composer.begin();
    txn.set_relative_layer(a, b, 1);
    assert_eq!(
        txn.apply(),
        Err(TransactionError::CycleDetected { layer: a, target: b })
    );
    assert_eq!(composer.get_layer(a).unwrap().relative, None);
}
