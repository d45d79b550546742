//! Shared configuration types for Effigy
//!
//! Plain serde-serializable data carried between the engine, the host
//! adapter, and the persisted mapping store. No engine logic lives here.

pub mod mapping;
pub mod overlay;
pub mod settings;

pub use mapping::{ImageRef, Mapping, MappingFile, ScriptHook};
pub use overlay::{
    AnimationConfig, FilterConfig, OverlayConfig, Shape, ShapeConfig, TextConfig,
};
pub use settings::Settings;
