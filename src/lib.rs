pub mod app_state;
pub mod audio;
pub mod engine;
pub mod glow;
pub mod input_map;
pub mod layout;
pub mod notes;
pub mod output_midi;
#[cfg(feature = "midi")]
pub mod output_midir;
pub mod overlay;
pub mod pixel_font;
pub mod render;
pub mod settings_panel;
pub mod touch;
pub mod ui_events;
pub mod ui_settings;
pub mod viewport;
pub mod voices;

#[cfg(feature = "android")]
pub mod android_frontend;

#[cfg(all(target_os = "android", feature = "android"))]
pub mod android_jni;

#[cfg(all(feature = "desktop", feature = "midi"))]
pub mod desktop_frontend;

#[cfg(feature = "desktop")]
pub mod ui_adapter;
