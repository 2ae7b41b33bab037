pub mod config;
pub mod engine;
pub mod gesture;
pub mod input;
pub mod linker;
pub mod pen;
pub mod select;
pub mod shortcuts;
pub mod snapping;
pub mod tools;
pub mod vertex;
pub mod viewport;

pub use config::EngineConfig;
pub use engine::{CanvasEngine, Feedback, Interaction};
pub use gesture::{GestureClassifier, GestureKind};
pub use input::{InputEvent, KeyInput, Modifiers, PointerButton, PointerInput, WheelInput};
pub use snapping::{SnapResult, SnappingEngine};
pub use tools::ToolKind;
pub use viewport::{ContainerSize, content_to_screen, screen_to_content};
