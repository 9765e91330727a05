use crate::android_frontend::{self, AndroidFrontend};
use crate::engine::Screen;
use crate::input_map::{KeyState, UiButton, UiKey};
use crate::layout::{ScreenSize, Skin};
use crate::notes::LabelMode;
use crate::render;
use crate::touch::{PointerId, TouchEvent};
use crate::ui_events::UiEvent;

use jni::objects::{JClass, JIntArray};
use jni::sys::{jboolean, jfloat, jint, jintArray, jlong};
use jni::JNIEnv;

use std::time::Instant;

/// Borrow the frontend behind a handle from `rustCreateFrontend`.
///
/// # Safety
/// `handle` must be 0 or a live pointer returned by `rustCreateFrontend` that
/// has not been destroyed, and the Activity must only call in from its UI thread.
unsafe fn frontend<'a>(handle: jlong) -> Option<&'a mut AndroidFrontend> {
    (handle as *mut AndroidFrontend).as_mut()
}

fn handle_event(handle: jlong, event: UiEvent) -> jint {
    // SAFETY: see `frontend`.
    let Some(f) = (unsafe { frontend(handle) }) else {
        return 0;
    };
    f.handle(event).bits() as jint
}

/// Simple JNI hook so an Android Activity can verify the Rust library loads.
#[no_mangle]
pub extern "system" fn Java_com_isokeys_app_MainActivity_rustInit(
    _env: JNIEnv,
    _class: JClass,
) -> jint {
    1
}

#[no_mangle]
pub extern "system" fn Java_com_isokeys_app_MainActivity_rustCreateFrontend(
    _env: JNIEnv,
    _class: JClass,
    width: jint,
    height: jint,
    density: jfloat,
    native_audio_loaded: jboolean,
) -> jlong {
    let screen = ScreenSize {
        width: width.max(0) as f32,
        height: height.max(0) as f32,
    };
    let frontend = Box::new(AndroidFrontend::new(screen, density, native_audio_loaded != 0));
    Box::into_raw(frontend) as jlong
}

#[no_mangle]
pub extern "system" fn Java_com_isokeys_app_MainActivity_rustDestroyFrontend(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) {
    if handle == 0 {
        return;
    }
    // SAFETY: the handle came from `Box::into_raw` and is not used again.
    let mut frontend = unsafe { Box::from_raw(handle as *mut AndroidFrontend) };
    frontend.shutdown();
}

/// Returns `Effects` bits.
#[no_mangle]
pub extern "system" fn Java_com_isokeys_app_MainActivity_rustTouch(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    pointer_id: jint,
    action: jint,
    x: jfloat,
    y: jfloat,
) -> jint {
    let Some(phase) = android_frontend::touch_phase_from_android(action) else {
        return 0;
    };
    handle_event(
        handle,
        UiEvent::Touch(TouchEvent {
            id: PointerId(pointer_id as u32 as u64),
            phase,
            x,
            y,
        }),
    )
}

#[no_mangle]
pub extern "system" fn Java_com_isokeys_app_MainActivity_rustFocus(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    focused: jboolean,
) -> jint {
    handle_event(handle, UiEvent::Focus(focused != 0))
}

#[no_mangle]
pub extern "system" fn Java_com_isokeys_app_MainActivity_rustResize(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    width: jint,
    height: jint,
) -> jint {
    handle_event(
        handle,
        UiEvent::Resize(ScreenSize {
            width: width.max(0) as f32,
            height: height.max(0) as f32,
        }),
    )
}

#[no_mangle]
pub extern "system" fn Java_com_isokeys_app_MainActivity_rustTick(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) -> jint {
    handle_event(handle, UiEvent::Tick)
}

/// Milliseconds until `rustTick` should be called again, -1 when idle.
#[no_mangle]
pub extern "system" fn Java_com_isokeys_app_MainActivity_rustNextWakeupMs(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) -> jlong {
    // SAFETY: see `frontend`.
    match unsafe { frontend(handle) } {
        Some(f) => f.next_wakeup_ms(Instant::now()),
        None => -1,
    }
}

#[no_mangle]
pub extern "system" fn Java_com_isokeys_app_MainActivity_rustHandleAndroidKey(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    key_code: jint,
    unicode_char: jint,
    is_down: jboolean,
) -> jint {
    let state = if is_down != 0 {
        KeyState::Pressed
    } else {
        KeyState::Released
    };

    let key = if unicode_char != 0 {
        match char::from_u32(unicode_char as u32) {
            Some(c) => UiKey::Char(c),
            None => return 0,
        }
    } else {
        // Key codes from android.view.KeyEvent
        match key_code {
            61 => UiKey::Tab,         // KEYCODE_TAB
            4 | 111 => UiKey::Escape, // KEYCODE_BACK / KEYCODE_ESCAPE
            _ => return 0,
        }
    };

    handle_event(handle, UiEvent::Key { state, key })
}

/// 0 skin, 1 scroll lock, 2 labels, 3 debug, 4 settings, 5 back.
#[no_mangle]
pub extern "system" fn Java_com_isokeys_app_MainActivity_rustButton(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    button: jint,
) -> jint {
    let button = match button {
        0 => UiButton::Skin,
        1 => UiButton::ScrollLock,
        2 => UiButton::Labels,
        3 => UiButton::Debug,
        4 => UiButton::Settings,
        5 => UiButton::Back,
        _ => return 0,
    };
    handle_event(handle, UiEvent::Button(button))
}

#[no_mangle]
pub extern "system" fn Java_com_isokeys_app_MainActivity_rustSetSkin(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    rect: jboolean,
) -> jint {
    let skin = if rect != 0 { Skin::Rect } else { Skin::Hex };
    handle_event(handle, UiEvent::SetSkin(skin))
}

#[no_mangle]
pub extern "system" fn Java_com_isokeys_app_MainActivity_rustSetScrollLock(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    locked: jboolean,
) -> jint {
    handle_event(handle, UiEvent::SetScrollLock(locked != 0))
}

/// 0 names, 1 solfege, 2 numbers, 3 hidden.
#[no_mangle]
pub extern "system" fn Java_com_isokeys_app_MainActivity_rustSetLabelMode(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    mode: jint,
) -> jint {
    let mode = match mode {
        0 => LabelMode::NoteName,
        1 => LabelMode::Solfege,
        2 => LabelMode::Number,
        3 => LabelMode::Hidden,
        _ => return 0,
    };
    handle_event(handle, UiEvent::SetLabelMode(mode))
}

/// Called when the Activity returns to the keyboard from the arranger.
#[no_mangle]
pub extern "system" fn Java_com_isokeys_app_MainActivity_rustShowKeyboard(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) -> jint {
    handle_event(handle, UiEvent::Navigate(Screen::Keyboard))
}

/// Pending audio commands as `[op, pitch, ...]`; see `AudioCommand::encode`.
#[no_mangle]
pub extern "system" fn Java_com_isokeys_app_MainActivity_rustDrainAudioCommands(
    mut env: JNIEnv,
    _class: JClass,
    handle: jlong,
) -> jintArray {
    // SAFETY: see `frontend`.
    let cmds = match unsafe { frontend(handle) } {
        Some(f) => f.drain_encoded_audio_commands(),
        None => Vec::new(),
    };

    let array = match env.new_int_array(cmds.len() as i32) {
        Ok(a) => a,
        Err(e) => {
            log::error!("jni: new_int_array failed: {e}");
            return std::ptr::null_mut();
        }
    };
    if let Err(e) = env.set_int_array_region(&array, 0, &cmds) {
        log::error!("jni: set_int_array_region failed: {e}");
    }
    array.into_raw()
}

/// Render the keyboard into `out_pixels` (ARGB_8888).
#[no_mangle]
pub extern "system" fn Java_com_isokeys_app_MainActivity_rustRender(
    mut env: JNIEnv,
    _class: JClass,
    handle: jlong,
    width: jint,
    height: jint,
    out_pixels: JIntArray,
) {
    let w = width.max(0) as usize;
    let h = height.max(0) as usize;
    if w == 0 || h == 0 {
        return;
    }

    // SAFETY: see `frontend`.
    let pixels = match unsafe { frontend(handle) } {
        Some(f) => f.render_argb(w, h),
        None => vec![(render::BACKGROUND | 0xFF00_0000) as i32; w * h],
    };

    if let Err(e) = env.set_int_array_region(out_pixels, 0, &pixels) {
        log::error!("jni: render copy failed: {e}");
    }
}
