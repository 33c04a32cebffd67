//! Sketchroom Core Library
//!
//! Scene model, interaction engine and wire protocol for the sketchroom
//! collaborative canvas. Rendering goes through the [`render::Surface`]
//! trait and networking through [`channel::Channel`], so the engine runs
//! the same against a browser canvas, a native window or a test recorder.

pub mod camera;
pub mod channel;
pub mod engine;
pub mod history;
pub mod input;
pub mod protocol;
pub mod render;
pub mod scene;
pub mod selection;
pub mod shape_source;
pub mod shapes;
pub mod text_layout;
pub mod tools;

pub use camera::Camera;
pub use channel::{Channel, ChannelError, ChannelEvent, ConnectionState, LoopbackChannel, WsChannel};
pub use engine::{DrawingEngine, EngineConfig};
pub use history::{History, HistoryState};
pub use input::{KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use protocol::{ClientMessage, ProtocolError, ServerMessage, ShapeEvent};
pub use render::{DisplayList, DrawCommand, Surface};
pub use scene::Scene;
pub use selection::{Action, ActionKind, Handle};
pub use shape_source::{FetchError, HttpShapeSource, ShapeSource, StaticShapeSource};
pub use shapes::{Arrow, Ellipse, Pencil, Rectangle, Shape, ShapeId, ShapeTrait, Text, Triangle};
pub use text_layout::{MonospaceMeasure, TextMeasure};
pub use tools::{CursorIcon, TextEdit, ToolKind, ToolManager};
